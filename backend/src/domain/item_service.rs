use chrono::Utc;
use log::info;
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::money::round2;
use crate::domain::repository::DocumentRepository;
use shared::{
    AddItemRequest, ClearItemsRequest, ClearItemsResponse, Item, ItemResponse, RemoveItemRequest,
    RemoveItemResponse, UpdateItemRequest,
};

/// Service for managing the items on a list
#[derive(Clone)]
pub struct ItemService {
    repository: Arc<DocumentRepository>,
}

impl ItemService {
    /// Create a new ItemService
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Add an item to the end of a list
    pub fn add_item(&self, request: AddItemRequest) -> Result<ItemResponse, DomainError> {
        info!("Adding item to list {}: name={}", request.list_id, request.name);

        let name = Self::validate_name(&request.name)?;
        let price = Self::validate_price(request.price)?;
        let qty = Self::normalize_qty(request.qty);

        let list_id = request.list_id;
        let ts = Utc::now().timestamp_millis() as u64;
        let item = Item {
            id: Item::generate_id(ts),
            name,
            price,
            qty,
            photo: request.photo,
            ts,
        };

        let item = self.repository.mutate(move |document| {
            let list = document
                .lists
                .get_mut(&list_id)
                .ok_or_else(|| DomainError::list_not_found(&list_id))?;
            list.items.push(item.clone());
            Ok(item)
        })?;

        info!("Added item: {} with ID: {}", item.name, item.id);

        Ok(ItemResponse {
            item,
            success_message: "Item added successfully".to_string(),
        })
    }

    /// Apply a partial update to an item. Fields left out of the request
    /// keep their current value; `clear_photo` is applied before any
    /// replacement photo.
    pub fn update_item(&self, request: UpdateItemRequest) -> Result<ItemResponse, DomainError> {
        info!("Updating item {} in list {}", request.item_id, request.list_id);

        let name = match &request.name {
            Some(name) => Some(Self::validate_name(name)?),
            None => None,
        };
        let price = match request.price {
            Some(price) => Some(Self::validate_price(price)?),
            None => None,
        };
        let qty = request.qty.map(|qty| Self::normalize_qty(Some(qty)));

        let item = self.repository.mutate(|document| {
            let list = document
                .lists
                .get_mut(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;
            let item = list
                .items
                .iter_mut()
                .find(|item| item.id == request.item_id)
                .ok_or_else(|| DomainError::item_not_found(&request.item_id))?;

            if let Some(name) = name {
                item.name = name;
            }
            if let Some(price) = price {
                item.price = price;
            }
            if let Some(qty) = qty {
                item.qty = qty;
            }
            if request.clear_photo {
                item.photo = None;
            }
            if let Some(photo) = request.photo.clone() {
                item.photo = Some(photo);
            }

            Ok(item.clone())
        })?;

        Ok(ItemResponse {
            item,
            success_message: "Item updated successfully".to_string(),
        })
    }

    /// Remove a single item from a list
    pub fn remove_item(
        &self,
        request: RemoveItemRequest,
    ) -> Result<RemoveItemResponse, DomainError> {
        info!("Removing item {} from list {}", request.item_id, request.list_id);

        let removed_id = self.repository.mutate(|document| {
            let list = document
                .lists
                .get_mut(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;
            let position = list
                .items
                .iter()
                .position(|item| item.id == request.item_id)
                .ok_or_else(|| DomainError::item_not_found(&request.item_id))?;
            let removed = list.items.remove(position);
            Ok(removed.id)
        })?;

        Ok(RemoveItemResponse {
            removed_id,
            success_message: "Item removed successfully".to_string(),
        })
    }

    /// Remove every item from a list
    pub fn clear_items(&self, request: ClearItemsRequest) -> Result<ClearItemsResponse, DomainError> {
        info!("Clearing items from list {}", request.list_id);

        let removed_count = self.repository.mutate(|document| {
            let list = document
                .lists
                .get_mut(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;
            let removed_count = list.items.len();
            list.items.clear();
            Ok(removed_count)
        })?;

        info!("Cleared {} items from list {}", removed_count, request.list_id);

        Ok(ClearItemsResponse {
            removed_count,
            success_message: "Items cleared successfully".to_string(),
        })
    }

    /// Validate an item name, returning the trimmed form
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidName);
        }
        Ok(trimmed.to_string())
    }

    /// Validate a unit price, returning the rounded form
    fn validate_price(price: f64) -> Result<f64, DomainError> {
        if !price.is_finite() || price < 0.0 {
            return Err(DomainError::InvalidPrice);
        }
        Ok(round2(price))
    }

    /// Quantities below 1 (or absent) fall back to 1 rather than erroring
    fn normalize_qty(qty: Option<i64>) -> u32 {
        match qty {
            Some(qty) if qty >= 1 => u32::try_from(qty).unwrap_or(u32::MAX),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonDocumentStore;
    use shared::Photo;
    use tempfile::TempDir;

    fn setup_test_service() -> (ItemService, Arc<DocumentRepository>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonDocumentStore::new(temp_dir.path()).expect("Failed to create store");
        let repository = Arc::new(DocumentRepository::open(Box::new(store)));
        (ItemService::new(repository.clone()), repository, temp_dir)
    }

    fn current_list_id(repository: &DocumentRepository) -> String {
        repository.read(|document| document.current_list_id.clone().unwrap())
    }

    fn sample_photo() -> Photo {
        Photo {
            mime: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_add_item() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let response = service
            .add_item(AddItemRequest {
                list_id: list_id.clone(),
                name: "Milk".to_string(),
                price: 3.49,
                qty: None,
                photo: None,
            })
            .expect("Failed to add item");

        assert!(response.item.id.starts_with("item-"));
        assert_eq!(response.item.name, "Milk");
        assert_eq!(response.item.price, 3.49);
        assert_eq!(response.item.qty, 1);
        assert!(response.item.ts > 0);
        assert_eq!(response.success_message, "Item added successfully");

        repository.read(|document| {
            let items = &document.lists[&list_id].items;
            assert_eq!(items.len(), 1);
            assert_eq!(items[0], response.item);
        });
    }

    #[test]
    fn test_add_item_rounds_price_and_trims_name() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let response = service
            .add_item(AddItemRequest {
                list_id,
                name: "  Olive Oil ".to_string(),
                price: 3.499,
                qty: Some(2),
                photo: None,
            })
            .unwrap();

        assert_eq!(response.item.name, "Olive Oil");
        assert_eq!(response.item.price, 3.5);
        assert_eq!(response.item.qty, 2);
    }

    #[test]
    fn test_add_item_quantity_is_lenient() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        for (given, stored) in [(None, 1), (Some(0), 1), (Some(-3), 1), (Some(4), 4)] {
            let response = service
                .add_item(AddItemRequest {
                    list_id: list_id.clone(),
                    name: "Eggs".to_string(),
                    price: 2.0,
                    qty: given,
                    photo: None,
                })
                .unwrap();
            assert_eq!(response.item.qty, stored, "qty {:?}", given);
        }
    }

    #[test]
    fn test_add_item_validation() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let result = service.add_item(AddItemRequest {
            list_id: list_id.clone(),
            name: "   ".to_string(),
            price: 1.0,
            qty: None,
            photo: None,
        });
        assert_eq!(result.unwrap_err(), DomainError::InvalidName);

        let result = service.add_item(AddItemRequest {
            list_id: list_id.clone(),
            name: "Milk".to_string(),
            price: -1.0,
            qty: None,
            photo: None,
        });
        assert_eq!(result.unwrap_err(), DomainError::InvalidPrice);

        let result = service.add_item(AddItemRequest {
            list_id: list_id.clone(),
            name: "Milk".to_string(),
            price: f64::NAN,
            qty: None,
            photo: None,
        });
        assert_eq!(result.unwrap_err(), DomainError::InvalidPrice);

        let result = service.add_item(AddItemRequest {
            list_id: "list-0-missing".to_string(),
            name: "Milk".to_string(),
            price: 1.0,
            qty: None,
            photo: None,
        });
        assert!(matches!(result, Err(DomainError::NotFound("List", _))));
    }

    #[test]
    fn test_update_item_patches_only_given_fields() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let added = service
            .add_item(AddItemRequest {
                list_id: list_id.clone(),
                name: "Milk".to_string(),
                price: 3.49,
                qty: Some(2),
                photo: None,
            })
            .unwrap();

        let response = service
            .update_item(UpdateItemRequest {
                list_id: list_id.clone(),
                item_id: added.item.id.clone(),
                name: None,
                price: Some(4.205),
                qty: None,
                photo: None,
                clear_photo: false,
            })
            .expect("Failed to update item");

        assert_eq!(response.item.name, "Milk");
        assert_eq!(response.item.price, 4.21);
        assert_eq!(response.item.qty, 2);
        assert_eq!(response.item.ts, added.item.ts);
    }

    #[test]
    fn test_update_item_photo_lifecycle() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let added = service
            .add_item(AddItemRequest {
                list_id: list_id.clone(),
                name: "Milk".to_string(),
                price: 3.49,
                qty: None,
                photo: Some(sample_photo()),
            })
            .unwrap();
        assert!(added.item.photo.is_some());

        let cleared = service
            .update_item(UpdateItemRequest {
                list_id: list_id.clone(),
                item_id: added.item.id.clone(),
                name: None,
                price: None,
                qty: None,
                photo: None,
                clear_photo: true,
            })
            .unwrap();
        assert!(cleared.item.photo.is_none());

        // A replacement photo wins even when clear_photo is also set
        let replacement = Photo {
            mime: "image/png".to_string(),
            data: vec![0x89, 0x50],
        };
        let replaced = service
            .update_item(UpdateItemRequest {
                list_id,
                item_id: added.item.id,
                name: None,
                price: None,
                qty: None,
                photo: Some(replacement.clone()),
                clear_photo: true,
            })
            .unwrap();
        assert_eq!(replaced.item.photo, Some(replacement));
    }

    #[test]
    fn test_update_item_validation() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let added = service
            .add_item(AddItemRequest {
                list_id: list_id.clone(),
                name: "Milk".to_string(),
                price: 3.49,
                qty: None,
                photo: None,
            })
            .unwrap();

        let result = service.update_item(UpdateItemRequest {
            list_id: list_id.clone(),
            item_id: added.item.id.clone(),
            name: Some("  ".to_string()),
            price: None,
            qty: None,
            photo: None,
            clear_photo: false,
        });
        assert_eq!(result.unwrap_err(), DomainError::InvalidName);

        // The failed update left the item alone
        repository.read(|document| {
            assert_eq!(document.lists[&list_id].items[0].name, "Milk");
        });

        let result = service.update_item(UpdateItemRequest {
            list_id,
            item_id: "item-0-missing".to_string(),
            name: None,
            price: None,
            qty: None,
            photo: None,
            clear_photo: false,
        });
        assert!(matches!(result, Err(DomainError::NotFound("Item", _))));
    }

    #[test]
    fn test_remove_item() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        let added = service
            .add_item(AddItemRequest {
                list_id: list_id.clone(),
                name: "Milk".to_string(),
                price: 3.49,
                qty: None,
                photo: None,
            })
            .unwrap();

        let response = service
            .remove_item(RemoveItemRequest {
                list_id: list_id.clone(),
                item_id: added.item.id.clone(),
            })
            .expect("Failed to remove item");
        assert_eq!(response.removed_id, added.item.id);

        repository.read(|document| {
            assert!(document.lists[&list_id].items.is_empty());
        });

        let result = service.remove_item(RemoveItemRequest {
            list_id,
            item_id: added.item.id,
        });
        assert!(matches!(result, Err(DomainError::NotFound("Item", _))));
    }

    #[test]
    fn test_clear_items() {
        let (service, repository, _temp_dir) = setup_test_service();
        let list_id = current_list_id(&repository);

        for name in ["Milk", "Eggs", "Bread"] {
            service
                .add_item(AddItemRequest {
                    list_id: list_id.clone(),
                    name: name.to_string(),
                    price: 1.0,
                    qty: None,
                    photo: None,
                })
                .unwrap();
        }

        let response = service
            .clear_items(ClearItemsRequest {
                list_id: list_id.clone(),
            })
            .expect("Failed to clear items");
        assert_eq!(response.removed_count, 3);

        // Clearing an already-empty list removes nothing
        let response = service
            .clear_items(ClearItemsRequest { list_id })
            .unwrap();
        assert_eq!(response.removed_count, 0);
    }
}
