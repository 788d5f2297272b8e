use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use chrono::{DateTime, TimeZone, Utc};

/// Version tag carried by every transfer document envelope
pub const TRANSFER_VERSION: u32 = 1;

/// Item ID in format: "item-<epoch_millis>-<random suffix>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// Item name as entered by the user
    pub name: String,
    /// Unit price, stored rounded to 2 decimal places
    pub price: f64,
    /// Quantity purchased (always >= 1)
    #[serde(default = "default_qty", deserialize_with = "lenient_qty")]
    pub qty: u32,
    /// Encoded photo blob, if one was attached
    pub photo: Option<Photo>,
    /// Creation timestamp in milliseconds since the Unix epoch
    pub ts: u64,
}

fn default_qty() -> u32 {
    1
}

/// Older exports may omit `qty` entirely or carry null or a non-positive
/// value in it; anything unusable reads back as 1.
fn lenient_qty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let qty = Option::<i64>::deserialize(deserializer)?;
    Ok(match qty {
        Some(qty) if qty >= 1 => u32::try_from(qty).unwrap_or(u32::MAX),
        _ => 1,
    })
}

/// Encoded image blob produced by the image encoder. Opaque to the core:
/// nothing here inspects the bytes, only their presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    /// MIME type of the encoded data (e.g. "image/jpeg")
    pub mime: String,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

/// Raw image input handed to the image encoder before any processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawImage {
    /// MIME type of the original capture
    pub mime: String,
    /// Unprocessed image bytes
    pub data: Vec<u8>,
}

/// A named collection of items with an optional budget.
///
/// `group_ids` holds back-references to every group this list belongs to;
/// each referenced group's `list_ids` must contain this list's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub name: String,
    /// Optional spending budget; None means no budget set
    pub budget: Option<f64>,
    /// Ids of the groups this list belongs to
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// A named collection of lists used for cross-list analytics filtering.
///
/// Holds the forward side of the bidirectional membership references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Ids of the member lists
    #[serde(default)]
    pub list_ids: Vec<String>,
}

/// The whole of persistent state: every list, every group, and the
/// currently selected list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub lists: BTreeMap<String, List>,
    #[serde(default)]
    pub groups: BTreeMap<String, Group>,
    /// Id of the currently selected list; None when no lists exist
    #[serde(default)]
    pub current_list_id: Option<String>,
}

/// Derived three-state budget classification (plus "no budget")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStatus {
    /// No budget set (absent or non-positive)
    NoBudget,
    /// Spend below 80% of the budget
    OnTrack,
    /// Spend at or above 80% but below 100%
    Watch,
    /// Spend at or above 100%
    Over,
}

// ============================================================================
// List operations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    /// Optional budget; validated non-negative
    pub budget: Option<f64>,
}

/// Response carrying a full list after a list-level mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    pub list: List,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameListRequest {
    pub list_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBudgetRequest {
    pub list_id: String,
    /// None (or a blank form field upstream) clears the budget
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteListRequest {
    pub list_id: String,
}

/// Response after deleting a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteListResponse {
    pub deleted_id: String,
    /// Where the current-list pointer landed after the delete
    pub new_current_list_id: Option<String>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCurrentListRequest {
    pub list_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCurrentListResponse {
    pub current_list_id: String,
    pub success_message: String,
}

// ============================================================================
// Group operations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

/// Response carrying a full group after a group-level mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group: Group,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameGroupRequest {
    pub group_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteGroupRequest {
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteGroupResponse {
    pub deleted_id: String,
    pub success_message: String,
}

/// Replaces a group's full membership in one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetGroupMembershipRequest {
    pub group_id: String,
    /// The complete new membership; lists not named here are removed
    pub list_ids: Vec<String>,
}

// ============================================================================
// Item operations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub list_id: String,
    pub name: String,
    pub price: f64,
    /// Missing or non-positive quantity defaults to 1
    pub qty: Option<i64>,
    /// Photo already encoded by the caller, if any
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item: Item,
    pub success_message: String,
}

/// Partial update of an item; absent fields are left unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub list_id: String,
    pub item_id: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub qty: Option<i64>,
    /// Replacement photo; applied after `clear_photo`
    pub photo: Option<Photo>,
    /// Remove the existing photo
    pub clear_photo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveItemRequest {
    pub list_id: String,
    pub item_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveItemResponse {
    pub removed_id: String,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearItemsRequest {
    pub list_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearItemsResponse {
    pub removed_count: usize,
    pub success_message: String,
}

// ============================================================================
// Photo operations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachPhotoRequest {
    pub list_id: String,
    pub item_id: String,
    /// Raw capture to run through the image encoder
    pub image: RawImage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovePhotoRequest {
    pub list_id: String,
    pub item_id: String,
}

// ============================================================================
// Analytics views
// ============================================================================

/// Header statistics for a single list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListStats {
    pub item_count: usize,
    pub total_spent: f64,
    pub with_photo_count: usize,
    pub without_photo_count: usize,
    pub budget_status: BudgetStatus,
}

/// One bucket of the spend-over-time series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// Zero-padded "YYYY-MM" key in local time
    pub month: String,
    pub total: f64,
}

/// Summary row for the list-management view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOverview {
    pub id: String,
    pub name: String,
    pub item_count: usize,
    pub total_spent: f64,
    pub budget: Option<f64>,
}

/// Summary row for the group-management view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOverview {
    pub id: String,
    pub name: String,
    pub member_count: usize,
}

// ============================================================================
// Transfer documents (import/export)
// ============================================================================

/// Versioned envelope used for JSON export and import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferDocument {
    pub version: u32,
    #[serde(flatten)]
    pub payload: TransferPayload,
}

/// The two supported transfer shapes; anything else is unsupported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransferPayload {
    /// Snapshot of a single list with its items
    List { list: List },
    /// Full backup of every list and group
    All {
        lists: BTreeMap<String, List>,
        #[serde(default)]
        groups: BTreeMap<String, Group>,
    },
}

/// Result of merging a transfer document into the live document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub imported_lists: usize,
    pub imported_groups: usize,
    pub imported_items: usize,
    /// Current list after the import (single-list imports become current)
    pub current_list_id: Option<String>,
    pub success_message: String,
}

/// Response carrying generated JSON export content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonExportResponse {
    pub json_content: String,
    /// Suggested download filename
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvExportRequest {
    /// Lists to include, in order; unknown ids are skipped
    pub list_ids: Vec<String>,
}

/// Response carrying generated CSV export content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvExportResponse {
    pub csv_content: String,
    pub filename: String,
    /// Item rows written (excluding the header)
    pub row_count: usize,
}

// ============================================================================
// ID generation
// ============================================================================

impl Item {
    /// Generate a unique item ID from the creation timestamp.
    /// Format: item-<epoch_millis>-<random suffix>
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("item-{}-{}", epoch_millis, random_suffix(8))
    }

    /// Creation time as a UTC timestamp, if `ts` is in chrono's range
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.ts as i64).single()
    }
}

impl List {
    /// Generate a unique list ID. Format: list-<epoch_millis>-<random suffix>
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("list-{}-{}", epoch_millis, random_suffix(8))
    }
}

impl Group {
    /// Generate a unique group ID. Format: group-<epoch_millis>-<random suffix>
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("group-{}-{}", epoch_millis, random_suffix(8))
    }
}

/// Random hex suffix for generated entity IDs
fn random_suffix(len: usize) -> String {
    uuid::Uuid::new_v4().simple().to_string().chars().take(len).collect()
}
