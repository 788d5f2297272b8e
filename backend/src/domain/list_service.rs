use chrono::Utc;
use log::info;
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::money::round2;
use crate::domain::repository::DocumentRepository;
use shared::{
    CreateListRequest, DeleteListRequest, DeleteListResponse, List, ListResponse,
    RenameListRequest, SetBudgetRequest, SetCurrentListRequest, SetCurrentListResponse,
};

/// Service for managing shopping lists
#[derive(Clone)]
pub struct ListService {
    repository: Arc<DocumentRepository>,
}

impl ListService {
    /// Create a new ListService
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Create a new list and make it the current one
    pub fn create_list(&self, request: CreateListRequest) -> Result<ListResponse, DomainError> {
        info!("Creating list: name={}", request.name);

        let name = Self::validate_name(&request.name)?;
        let budget = Self::validate_budget(request.budget)?;

        let list = List {
            id: List::generate_id(Utc::now().timestamp_millis() as u64),
            name,
            budget,
            group_ids: Vec::new(),
            items: Vec::new(),
        };

        let list = self.repository.mutate(move |document| {
            document.current_list_id = Some(list.id.clone());
            document.lists.insert(list.id.clone(), list.clone());
            Ok(list)
        })?;

        info!("Created list: {} with ID: {}", list.name, list.id);

        Ok(ListResponse {
            list,
            success_message: "List created successfully".to_string(),
        })
    }

    /// Rename an existing list
    pub fn rename_list(&self, request: RenameListRequest) -> Result<ListResponse, DomainError> {
        info!("Renaming list: {}", request.list_id);

        let name = Self::validate_name(&request.name)?;

        let list = self.repository.mutate(|document| {
            let list = document
                .lists
                .get_mut(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;
            list.name = name;
            Ok(list.clone())
        })?;

        Ok(ListResponse {
            list,
            success_message: "List renamed successfully".to_string(),
        })
    }

    /// Set or clear a list's budget
    pub fn set_budget(&self, request: SetBudgetRequest) -> Result<ListResponse, DomainError> {
        info!(
            "Setting budget for list: {} to {:?}",
            request.list_id, request.budget
        );

        let budget = Self::validate_budget(request.budget)?;

        let list = self.repository.mutate(|document| {
            let list = document
                .lists
                .get_mut(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;
            list.budget = budget;
            Ok(list.clone())
        })?;

        Ok(ListResponse {
            list,
            success_message: "Budget updated successfully".to_string(),
        })
    }

    /// Delete a list, dropping its membership references and moving the
    /// current-list pointer if it pointed at the deleted list
    pub fn delete_list(
        &self,
        request: DeleteListRequest,
    ) -> Result<DeleteListResponse, DomainError> {
        info!("Deleting list: {}", request.list_id);

        let new_current_list_id = self.repository.mutate(|document| {
            let removed = document
                .lists
                .remove(&request.list_id)
                .ok_or_else(|| DomainError::list_not_found(&request.list_id))?;

            // Groups must not keep references to a list that no longer exists
            for group in document.groups.values_mut() {
                group.list_ids.retain(|id| id != &removed.id);
            }

            if document.current_list_id.as_deref() == Some(request.list_id.as_str()) {
                document.current_list_id = document.lists.keys().next().cloned();
            }

            Ok(document.current_list_id.clone())
        })?;

        info!("Deleted list: {}", request.list_id);

        Ok(DeleteListResponse {
            deleted_id: request.list_id,
            new_current_list_id,
            success_message: "List deleted successfully".to_string(),
        })
    }

    /// Make an existing list the current one
    pub fn set_current_list(
        &self,
        request: SetCurrentListRequest,
    ) -> Result<SetCurrentListResponse, DomainError> {
        let current_list_id = self.repository.mutate(|document| {
            if !document.lists.contains_key(&request.list_id) {
                return Err(DomainError::list_not_found(&request.list_id));
            }
            document.current_list_id = Some(request.list_id.clone());
            Ok(request.list_id.clone())
        })?;

        info!("Current list set to: {}", current_list_id);

        Ok(SetCurrentListResponse {
            current_list_id,
            success_message: "Current list updated successfully".to_string(),
        })
    }

    /// The currently selected list, if any
    pub fn current_list(&self) -> Option<List> {
        self.repository.read(|document| {
            document
                .current_list_id
                .as_ref()
                .and_then(|id| document.lists.get(id))
                .cloned()
        })
    }

    /// Validate a list name, returning the trimmed form
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidName);
        }
        Ok(trimmed.to_string())
    }

    /// Validate an optional budget, returning the rounded form
    fn validate_budget(budget: Option<f64>) -> Result<Option<f64>, DomainError> {
        match budget {
            Some(budget) if !budget.is_finite() || budget < 0.0 => Err(DomainError::InvalidBudget),
            Some(budget) => Ok(Some(round2(budget))),
            None => Ok(None),
        }
    }
}
