//! # JSON Document Store
//!
//! File-based implementation of [`DocumentStore`] keeping the whole document
//! in a single JSON file `shopping-tracker.json` inside the data directory.
//!
//! ## Features
//!
//! - Single-file persistence, human-readable JSON
//! - Atomic file writes with temp files
//! - Missing file reported as no prior state, not an error

use anyhow::Result;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::traits::DocumentStore;
use shared::Document;

const DOCUMENT_FILE_NAME: &str = "shopping-tracker.json";

/// JSON file backed document store
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    data_directory: PathBuf,
}

impl JsonDocumentStore {
    /// Create a store rooted at the given data directory, creating the
    /// directory if it does not exist yet.
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Result<Self> {
        let data_directory = data_directory.as_ref().to_path_buf();

        if !data_directory.exists() {
            fs::create_dir_all(&data_directory)?;
            info!("Created data directory: {:?}", data_directory);
        }

        Ok(Self { data_directory })
    }

    /// Path of the document file inside the data directory
    pub fn document_path(&self) -> PathBuf {
        self.data_directory.join(DOCUMENT_FILE_NAME)
    }
}

impl DocumentStore for JsonDocumentStore {
    fn load(&self) -> Result<Option<Document>> {
        let path = self.document_path();

        if !path.exists() {
            debug!("No document file at {:?}", path);
            return Ok(None);
        }

        let json_content = fs::read_to_string(&path)?;
        let document: Document = serde_json::from_str(&json_content)?;
        debug!("Loaded document from {:?}", path);
        Ok(Some(document))
    }

    fn save(&self, document: &Document) -> Result<()> {
        let path = self.document_path();

        if !self.data_directory.exists() {
            fs::create_dir_all(&self.data_directory)?;
        }

        let json_content = serde_json::to_string_pretty(document)?;

        // Use atomic write pattern: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json_content)?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved document to {:?}", path);
        Ok(())
    }
}
