//! JSON file storage implementation.

pub mod document_store;

pub use document_store::JsonDocumentStore;
