//! In-memory document holder shared by every service.
//!
//! Reads borrow the document under the lock. Mutations run a closure under
//! the lock and save the new state when the closure succeeds; a failed save
//! is logged and the in-memory change stands, so a broken disk never blocks
//! the user mid-session.

use chrono::Utc;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::errors::DomainError;
use crate::storage::DocumentStore;
use shared::{Document, List};

/// Name of the list seeded on first launch
const SEED_LIST_NAME: &str = "My First List";

pub struct DocumentRepository {
    document: Mutex<Document>,
    store: Box<dyn DocumentStore>,
}

impl DocumentRepository {
    /// Open the repository from the given store.
    ///
    /// Loads the saved document when one exists. A missing or unreadable
    /// file is not fatal: the repository starts from a fresh document with
    /// one empty list and logs what happened.
    pub fn open(store: Box<dyn DocumentStore>) -> Self {
        let loaded = match store.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Failed to load saved document, starting fresh: {}", e);
                None
            }
        };

        let document = match loaded {
            Some(document) => document,
            None => {
                let document = seed_document();
                info!("Seeded fresh document with list '{}'", SEED_LIST_NAME);
                persist(store.as_ref(), &document);
                document
            }
        };

        Self {
            document: Mutex::new(document),
            store,
        }
    }

    /// Run a read-only closure against the current document
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        let document = self.document.lock().unwrap();
        f(&document)
    }

    /// Run a mutating closure against the document.
    ///
    /// When the closure succeeds the new state is saved to the store. When
    /// it fails nothing is persisted and the error is returned as-is.
    pub fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<R, DomainError>,
    ) -> Result<R, DomainError> {
        let mut document = self.document.lock().unwrap();
        let result = f(&mut document)?;
        persist(self.store.as_ref(), &document);
        Ok(result)
    }
}

/// Save the document, downgrading failures to warnings. The in-memory state
/// stays authoritative for the rest of the session either way.
fn persist(store: &dyn DocumentStore, document: &Document) {
    if let Err(e) = store.save(document) {
        let error = DomainError::Persistence(e.to_string());
        warn!("{}; keeping in-memory state", error);
    }
}

fn seed_document() -> Document {
    let list = List {
        id: List::generate_id(Utc::now().timestamp_millis() as u64),
        name: SEED_LIST_NAME.to_string(),
        budget: None,
        group_ids: Vec::new(),
        items: Vec::new(),
    };

    let current_list_id = Some(list.id.clone());
    let mut lists = BTreeMap::new();
    lists.insert(list.id.clone(), list);

    Document {
        lists,
        groups: BTreeMap::new(),
        current_list_id,
    }
}
