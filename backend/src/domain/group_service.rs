use chrono::Utc;
use log::info;
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::repository::DocumentRepository;
use shared::{
    CreateGroupRequest, DeleteGroupRequest, DeleteGroupResponse, Group, GroupResponse,
    RenameGroupRequest, SetGroupMembershipRequest,
};

/// Service for managing list groups and their membership.
///
/// Membership is stored on both sides (`Group.list_ids` and
/// `List.group_ids`); every operation here keeps the two in sync.
#[derive(Clone)]
pub struct GroupService {
    repository: Arc<DocumentRepository>,
}

impl GroupService {
    /// Create a new GroupService
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Create a new empty group
    pub fn create_group(&self, request: CreateGroupRequest) -> Result<GroupResponse, DomainError> {
        info!("Creating group: name={}", request.name);

        let name = Self::validate_name(&request.name)?;

        let group = Group {
            id: Group::generate_id(Utc::now().timestamp_millis() as u64),
            name,
            list_ids: Vec::new(),
        };

        let group = self.repository.mutate(move |document| {
            document.groups.insert(group.id.clone(), group.clone());
            Ok(group)
        })?;

        info!("Created group: {} with ID: {}", group.name, group.id);

        Ok(GroupResponse {
            group,
            success_message: "Group created successfully".to_string(),
        })
    }

    /// Rename an existing group
    pub fn rename_group(&self, request: RenameGroupRequest) -> Result<GroupResponse, DomainError> {
        info!("Renaming group: {}", request.group_id);

        let name = Self::validate_name(&request.name)?;

        let group = self.repository.mutate(|document| {
            let group = document
                .groups
                .get_mut(&request.group_id)
                .ok_or_else(|| DomainError::group_not_found(&request.group_id))?;
            group.name = name;
            Ok(group.clone())
        })?;

        Ok(GroupResponse {
            group,
            success_message: "Group renamed successfully".to_string(),
        })
    }

    /// Delete a group, dropping the back-references held by its member lists
    pub fn delete_group(
        &self,
        request: DeleteGroupRequest,
    ) -> Result<DeleteGroupResponse, DomainError> {
        info!("Deleting group: {}", request.group_id);

        self.repository.mutate(|document| {
            let removed = document
                .groups
                .remove(&request.group_id)
                .ok_or_else(|| DomainError::group_not_found(&request.group_id))?;

            // Lists must not keep references to a group that no longer exists
            for list in document.lists.values_mut() {
                list.group_ids.retain(|id| id != &removed.id);
            }

            Ok(())
        })?;

        info!("Deleted group: {}", request.group_id);

        Ok(DeleteGroupResponse {
            deleted_id: request.group_id,
            success_message: "Group deleted successfully".to_string(),
        })
    }

    /// Replace a group's membership with the given set of lists.
    ///
    /// Both sides of the relation are rewritten together: the group's
    /// `list_ids` becomes the requested set, and every list's `group_ids`
    /// gains or loses this group to match. All ids are checked before
    /// anything changes, so a bad id leaves the document untouched.
    pub fn set_group_membership(
        &self,
        request: SetGroupMembershipRequest,
    ) -> Result<GroupResponse, DomainError> {
        info!(
            "Setting membership for group: {} ({} lists)",
            request.group_id,
            request.list_ids.len()
        );

        let group = self.repository.mutate(|document| {
            for list_id in &request.list_ids {
                if !document.lists.contains_key(list_id) {
                    return Err(DomainError::list_not_found(list_id));
                }
            }

            // Keep the first occurrence when the same list is named twice
            let mut member_ids: Vec<String> = Vec::new();
            for list_id in &request.list_ids {
                if !member_ids.contains(list_id) {
                    member_ids.push(list_id.clone());
                }
            }

            let group = document
                .groups
                .get_mut(&request.group_id)
                .ok_or_else(|| DomainError::group_not_found(&request.group_id))?;
            group.list_ids = member_ids.clone();
            let updated = group.clone();

            for list in document.lists.values_mut() {
                list.group_ids.retain(|id| id != &request.group_id);
                if member_ids.contains(&list.id) {
                    list.group_ids.push(request.group_id.clone());
                }
            }

            Ok(updated)
        })?;

        Ok(GroupResponse {
            group,
            success_message: "Group membership updated successfully".to_string(),
        })
    }

    /// Validate a group name, returning the trimmed form
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidName);
        }
        Ok(trimmed.to_string())
    }
}
