//! # Storage Traits
//!
//! Defines the storage abstraction that lets different document stores be
//! used interchangeably by the domain layer.

use anyhow::Result;
use shared::Document;

/// Trait defining the interface for whole-document persistence.
///
/// The document is always loaded and saved as one unit; there are no
/// partial writes. Implementations decide where and how the bytes live.
pub trait DocumentStore: Send + Sync {
    /// Load the previously saved document, or None when no state exists yet
    fn load(&self) -> Result<Option<Document>>;

    /// Overwrite the stored document. Idempotent whole-document replace.
    fn save(&self, document: &Document) -> Result<()>;
}
