//! # Shopping Tracker Backend
//!
//! Contains all non-UI logic for the shopping tracker.
//!
//! This crate brings together:
//! - **Domain**: Business logic for lists, groups, items, budgets, and
//!   import/export
//! - **Storage**: Persistence of the single JSON document
//!
//! The backend is UI-agnostic: any frontend (desktop shell, web server,
//! CLI) can sit on top of the [`Backend`] facade without modification.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer
//!     ↓
//! Domain Layer (services over one shared document)
//!     ↓
//! Storage Layer (JSON file persistence)
//! ```

pub mod domain;
pub mod storage;

use anyhow::Result;
use log::info;
use std::path::Path;
use std::sync::Arc;

pub use domain::*;
pub use storage::*;

/// Main application state that holds all services
#[derive(Clone)]
pub struct Backend {
    pub list_service: ListService,
    pub group_service: GroupService,
    pub item_service: ItemService,
    pub photo_service: PhotoService,
    pub analytics_service: AnalyticsService,
    pub transfer_service: TransferService,
    pub export_service: ExportService,
}

/// Initialize the backend with all required services.
///
/// Opens (or seeds) the document under `data_directory` and wires every
/// service to the same shared state.
pub fn initialize_backend<P: AsRef<Path>>(
    data_directory: P,
    image_encoder: Arc<dyn ImageEncoder>,
) -> Result<Backend> {
    info!("Setting up document store");
    let store = JsonDocumentStore::new(data_directory)?;

    info!("Setting up domain model");
    let repository = Arc::new(DocumentRepository::open(Box::new(store)));

    Ok(Backend {
        list_service: ListService::new(repository.clone()),
        group_service: GroupService::new(repository.clone()),
        item_service: ItemService::new(repository.clone()),
        photo_service: PhotoService::new(repository.clone(), image_encoder),
        analytics_service: AnalyticsService::new(repository.clone()),
        transfer_service: TransferService::new(repository.clone()),
        export_service: ExportService::new(repository),
    })
}
