//! # Storage Module
//!
//! Handles all data persistence operations for the shopping tracker.
//!
//! This module abstracts away the specific storage implementation details and provides
//! a consistent interface for persisting and retrieving the document. The implementation
//! can be swapped out (JSON file, SQLite, cloud storage, etc.) without affecting the
//! domain logic.
//!
//! ## Key Responsibilities
//!
//! - **Data Persistence**: Saving the full document to disk after each mutation
//! - **Data Retrieval**: Loading stored data back into memory at startup
//! - **Storage Abstraction**: Providing a consistent API regardless of storage backend
//!
//! ## Current Implementation
//!
//! - **Primary Storage**: Single JSON file with atomic temp-file writes
//! - **Testability**: Trait-based abstraction allows in-memory stores for unit tests

pub mod json;
pub mod traits;

// Re-export the main types that other modules need
pub use json::JsonDocumentStore;
pub use traits::DocumentStore;
