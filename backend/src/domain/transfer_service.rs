//! JSON import and export.
//!
//! Exports wrap state in a versioned transfer document. Imports are always
//! additive merges: every imported entity gets a fresh id before it touches
//! the document, names are disambiguated against what already exists, and
//! group membership is remapped onto the fresh ids. Nothing already in the
//! document is modified or removed.

use chrono::Utc;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::repository::DocumentRepository;
use shared::{
    Group, Item, JsonExportResponse, List, MergeResult, TransferDocument, TransferPayload,
    TRANSFER_VERSION,
};

/// Service for moving lists in and out of the tracker as JSON
#[derive(Clone)]
pub struct TransferService {
    repository: Arc<DocumentRepository>,
}

impl TransferService {
    /// Create a new TransferService
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Export a single list as a transfer document
    pub fn export_list(&self, list_id: &str) -> Result<JsonExportResponse, DomainError> {
        info!("📄 EXPORT: building JSON export for list {}", list_id);

        let (transfer, filename) = self.repository.read(|document| {
            let list = document
                .lists
                .get(list_id)
                .ok_or_else(|| DomainError::list_not_found(list_id))?;

            let filename = format!("{}.list.json", sanitize_filename(&list.name));
            let transfer = TransferDocument {
                version: TRANSFER_VERSION,
                payload: TransferPayload::List { list: list.clone() },
            };
            Ok((transfer, filename))
        })?;

        let json_content = serialize_transfer(&transfer)?;
        info!("✅ EXPORT: wrote {} as {}", list_id, filename);

        Ok(JsonExportResponse {
            json_content,
            filename,
        })
    }

    /// Export every list and group as a full backup
    pub fn export_all(&self) -> Result<JsonExportResponse, DomainError> {
        info!("📄 EXPORT: building full backup");

        let transfer = self.repository.read(|document| TransferDocument {
            version: TRANSFER_VERSION,
            payload: TransferPayload::All {
                lists: document.lists.clone(),
                groups: document.groups.clone(),
            },
        });

        let json_content = serialize_transfer(&transfer)?;
        info!("✅ EXPORT: full backup ready");

        Ok(JsonExportResponse {
            json_content,
            filename: "shopping-tracker.backup.json".to_string(),
        })
    }

    /// Merge a transfer document into the live document.
    ///
    /// Accepts exactly what `export_list` and `export_all` produce. Anything
    /// else (bad JSON, an unknown payload type, a version this build does
    /// not speak) is rejected without touching the document.
    pub fn import_transfer(&self, json: &str) -> Result<MergeResult, DomainError> {
        info!("📥 IMPORT: parsing transfer document ({} bytes)", json.len());

        let transfer: TransferDocument = serde_json::from_str(json).map_err(|e| {
            let error = DomainError::UnsupportedFormat(e.to_string());
            warn!("❌ IMPORT: {}", error);
            error
        })?;

        if transfer.version != TRANSFER_VERSION {
            let error = DomainError::UnsupportedFormat(format!("version {}", transfer.version));
            warn!("❌ IMPORT: {}", error);
            return Err(error);
        }

        let result = match transfer.payload {
            TransferPayload::List { list } => self.import_list(list),
            TransferPayload::All { lists, groups } => self.import_all(lists, groups),
        }?;

        info!(
            "✅ IMPORT: merged {} lists, {} groups, {} items",
            result.imported_lists, result.imported_groups, result.imported_items
        );
        Ok(result)
    }

    /// Merge one exported list and make it current
    fn import_list(&self, list: List) -> Result<MergeResult, DomainError> {
        let now = Utc::now().timestamp_millis() as u64;
        let List {
            name,
            budget,
            items,
            ..
        } = list;

        self.repository.mutate(move |document| {
            let taken: HashSet<String> =
                document.lists.values().map(|l| l.name.clone()).collect();

            let items: Vec<Item> = items
                .into_iter()
                .map(|item| Item {
                    id: Item::generate_id(now),
                    ..item
                })
                .collect();
            let imported_items = items.len();

            // Membership references from the source tracker mean nothing
            // here, so the imported list starts out of every group
            let imported = List {
                id: List::generate_id(now),
                name: ensure_unique_name(&name, &taken),
                budget,
                group_ids: Vec::new(),
                items,
            };

            document.current_list_id = Some(imported.id.clone());
            document.lists.insert(imported.id.clone(), imported);

            Ok(MergeResult {
                imported_lists: 1,
                imported_groups: 0,
                imported_items,
                current_list_id: document.current_list_id.clone(),
                success_message: "List imported successfully".to_string(),
            })
        })
    }

    /// Merge a full backup: lists first, then groups remapped onto the
    /// fresh list ids. The current list is left where it was.
    fn import_all(
        &self,
        lists: BTreeMap<String, List>,
        groups: BTreeMap<String, Group>,
    ) -> Result<MergeResult, DomainError> {
        let now = Utc::now().timestamp_millis() as u64;

        self.repository.mutate(move |document| {
            let mut id_map: HashMap<String, String> = HashMap::new();
            let mut list_names: HashSet<String> =
                document.lists.values().map(|l| l.name.clone()).collect();
            let imported_lists = lists.len();
            let mut imported_items = 0;

            for (old_id, list) in lists {
                let new_id = List::generate_id(now);
                let name = ensure_unique_name(&list.name, &list_names);
                list_names.insert(name.clone());

                let items: Vec<Item> = list
                    .items
                    .into_iter()
                    .map(|item| Item {
                        id: Item::generate_id(now),
                        ..item
                    })
                    .collect();
                imported_items += items.len();

                document.lists.insert(
                    new_id.clone(),
                    List {
                        id: new_id.clone(),
                        name,
                        budget: list.budget,
                        group_ids: Vec::new(),
                        items,
                    },
                );
                id_map.insert(old_id, new_id);
            }

            let mut group_names: HashSet<String> =
                document.groups.values().map(|g| g.name.clone()).collect();
            let imported_groups = groups.len();

            for group in groups.into_values() {
                let new_id = Group::generate_id(now);
                let name = ensure_unique_name(&group.name, &group_names);
                group_names.insert(name.clone());

                // References to lists that were not part of this backup
                // cannot be resolved and are dropped
                let member_ids: Vec<String> = group
                    .list_ids
                    .iter()
                    .filter_map(|old_id| id_map.get(old_id).cloned())
                    .collect();

                for member_id in &member_ids {
                    if let Some(list) = document.lists.get_mut(member_id) {
                        if !list.group_ids.contains(&new_id) {
                            list.group_ids.push(new_id.clone());
                        }
                    }
                }

                document.groups.insert(
                    new_id.clone(),
                    Group {
                        id: new_id,
                        name,
                        list_ids: member_ids,
                    },
                );
            }

            Ok(MergeResult {
                imported_lists,
                imported_groups,
                imported_items,
                current_list_id: document.current_list_id.clone(),
                success_message: "Backup imported successfully".to_string(),
            })
        })
    }
}

fn serialize_transfer(transfer: &TransferDocument) -> Result<String, DomainError> {
    serde_json::to_string_pretty(transfer).map_err(|e| DomainError::Persistence(e.to_string()))
}

/// Turn a list name into a safe download filename stem: lowercase, runs of
/// anything but ASCII letters and digits collapse to a single dash, and
/// leading and trailing dashes are dropped.
fn sanitize_filename(name: &str) -> String {
    let mut stem = String::new();
    let mut pending_dash = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !stem.is_empty() {
                stem.push('-');
            }
            stem.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    stem
}

/// Append " (2)", " (3)", ... until the name is free
fn ensure_unique_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    let mut i = 2;
    loop {
        let candidate = format!("{} ({})", name, i);
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}
