//! # Domain Module
//!
//! Contains all business logic for the shopping tracker.
//!
//! This module encapsulates the core business rules and services that define
//! how lists, groups, and items are modeled, aggregated, and moved in and
//! out of the tracker. It operates independently of any specific UI
//! framework or storage mechanism.
//!
//! ## Module Organization
//!
//! - **list_service**: List lifecycle, budgets, and the current-list pointer
//! - **group_service**: Groups and their bidirectional list membership
//! - **item_service**: Adding, editing, and removing the items on a list
//! - **photo_service**: Photo attachment via the pluggable image encoder
//! - **analytics_service**: Per-list statistics and the monthly spend series
//! - **transfer_service**: Versioned JSON export and additive import merges
//! - **export_service**: Flattening lists into CSV
//! - **money**: Cent rounding and amount formatting
//! - **repository**: The in-memory document and its persistence hook
//!
//! ## Business Rules
//!
//! - Every derived amount is rounded to the cent boundary
//! - Names are trimmed and must be non-empty; prices and budgets must be
//!   non-negative
//! - Group membership is stored on both sides and always kept in sync
//! - Imports merge additively and never overwrite existing data
//! - Saving is best-effort: a failed write warns and the session continues

pub mod analytics_service;
pub mod errors;
pub mod export_service;
pub mod group_service;
pub mod item_service;
pub mod list_service;
pub mod money;
pub mod photo_service;
pub mod repository;
pub mod transfer_service;

pub use analytics_service::*;
pub use errors::*;
pub use export_service::*;
pub use group_service::*;
pub use item_service::*;
pub use list_service::*;
pub use money::*;
pub use photo_service::*;
pub use repository::*;
pub use transfer_service::*;
