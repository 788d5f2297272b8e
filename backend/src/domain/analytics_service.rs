//! Read-only queries over the document: per-list statistics, budget
//! classification, gallery and history views, and the cross-list monthly
//! spend series that backs the chart.

use chrono::{Local, TimeZone};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::errors::DomainError;
use crate::domain::money::{item_total, list_total, round2};
use crate::domain::repository::DocumentRepository;
use shared::{BudgetStatus, GroupOverview, Item, ListOverview, ListStats, MonthlyTotal};

/// Spend-to-budget ratio at which a list moves from OnTrack to Watch
const WATCH_RATIO: f64 = 0.8;

/// Classify spend against an optional budget.
///
/// A missing or non-positive budget means no classification at all, not
/// "over": you cannot exceed a budget that was never set.
pub fn budget_status(budget: Option<f64>, total_spent: f64) -> BudgetStatus {
    match budget {
        Some(budget) if budget > 0.0 => {
            let ratio = total_spent / budget;
            if ratio >= 1.0 {
                BudgetStatus::Over
            } else if ratio >= WATCH_RATIO {
                BudgetStatus::Watch
            } else {
                BudgetStatus::OnTrack
            }
        }
        _ => BudgetStatus::NoBudget,
    }
}

/// Service answering derived questions about lists and groups
#[derive(Clone)]
pub struct AnalyticsService {
    repository: Arc<DocumentRepository>,
}

impl AnalyticsService {
    /// Create a new AnalyticsService
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Header statistics for a single list
    pub fn list_stats(&self, list_id: &str) -> Result<ListStats, DomainError> {
        self.repository.read(|document| {
            let list = document
                .lists
                .get(list_id)
                .ok_or_else(|| DomainError::list_not_found(list_id))?;

            let total_spent = list_total(list);
            let with_photo_count = list
                .items
                .iter()
                .filter(|item| item.photo.is_some())
                .count();

            Ok(ListStats {
                item_count: list.items.len(),
                total_spent,
                with_photo_count,
                without_photo_count: list.items.len() - with_photo_count,
                budget_status: budget_status(list.budget, total_spent),
            })
        })
    }

    /// The item with the highest line total; ties keep the earliest item
    pub fn most_expensive(&self, list_id: &str) -> Result<Option<Item>, DomainError> {
        self.repository.read(|document| {
            let list = document
                .lists
                .get(list_id)
                .ok_or_else(|| DomainError::list_not_found(list_id))?;
            Ok(extreme_item(&list.items, |a, b| a > b))
        })
    }

    /// The item with the lowest line total; ties keep the earliest item
    pub fn least_expensive(&self, list_id: &str) -> Result<Option<Item>, DomainError> {
        self.repository.read(|document| {
            let list = document
                .lists
                .get(list_id)
                .ok_or_else(|| DomainError::list_not_found(list_id))?;
            Ok(extreme_item(&list.items, |a, b| a < b))
        })
    }

    /// Monthly spend totals across the given lists, bucketed by "YYYY-MM"
    /// in local time and sorted by month key.
    ///
    /// Months with no purchases simply do not appear. Unknown list ids are
    /// skipped so a stale selection cannot fail the chart.
    pub fn monthly_series(&self, list_ids: &[String]) -> Vec<MonthlyTotal> {
        self.repository.read(|document| {
            let mut sums: BTreeMap<String, f64> = BTreeMap::new();

            for list_id in list_ids {
                if let Some(list) = document.lists.get(list_id) {
                    for item in &list.items {
                        if let Some(ts) = Local.timestamp_millis_opt(item.ts as i64).single() {
                            let month = ts.format("%Y-%m").to_string();
                            *sums.entry(month).or_insert(0.0) += item_total(item);
                        }
                    }
                }
            }

            sums.into_iter()
                .map(|(month, total)| MonthlyTotal {
                    month,
                    total: round2(total),
                })
                .collect()
        })
    }

    /// Resolve the chart's list selection.
    ///
    /// A group id overrides any explicit selection entirely, even when the
    /// group is empty; a group id that no longer exists resolves to nothing.
    pub fn resolve_filter_selection(
        &self,
        selected_ids: &[String],
        group_id: Option<&str>,
    ) -> Vec<String> {
        self.repository.read(|document| match group_id {
            Some(group_id) => document
                .groups
                .get(group_id)
                .map(|group| group.list_ids.clone())
                .unwrap_or_default(),
            None => selected_ids.to_vec(),
        })
    }

    /// A list's items sorted newest first
    pub fn items_newest_first(&self, list_id: &str) -> Result<Vec<Item>, DomainError> {
        self.repository.read(|document| {
            let list = document
                .lists
                .get(list_id)
                .ok_or_else(|| DomainError::list_not_found(list_id))?;

            let mut items = list.items.clone();
            items.sort_by(|a, b| b.ts.cmp(&a.ts));
            Ok(items)
        })
    }

    /// The gallery view: items carrying a photo, newest first
    pub fn photo_items(&self, list_id: &str) -> Result<Vec<Item>, DomainError> {
        self.repository.read(|document| {
            let list = document
                .lists
                .get(list_id)
                .ok_or_else(|| DomainError::list_not_found(list_id))?;

            let mut items: Vec<Item> = list
                .items
                .iter()
                .filter(|item| item.photo.is_some())
                .cloned()
                .collect();
            items.sort_by(|a, b| b.ts.cmp(&a.ts));
            Ok(items)
        })
    }

    /// Summary rows for every list, in document order
    pub fn list_overviews(&self) -> Vec<ListOverview> {
        self.repository.read(|document| {
            document
                .lists
                .values()
                .map(|list| ListOverview {
                    id: list.id.clone(),
                    name: list.name.clone(),
                    item_count: list.items.len(),
                    total_spent: list_total(list),
                    budget: list.budget,
                })
                .collect()
        })
    }

    /// Summary rows for every group, in document order
    pub fn group_overviews(&self) -> Vec<GroupOverview> {
        self.repository.read(|document| {
            document
                .groups
                .values()
                .map(|group| GroupOverview {
                    id: group.id.clone(),
                    name: group.name.clone(),
                    member_count: group.list_ids.len(),
                })
                .collect()
        })
    }
}

/// First item winning the strict comparison on line total. Ties keep the
/// earliest item in stored order.
fn extreme_item(items: &[Item], beats: impl Fn(f64, f64) -> bool) -> Option<Item> {
    let mut best: Option<&Item> = None;
    for item in items {
        let replace = match best {
            Some(current) => beats(item_total(item), item_total(current)),
            None => true,
        };
        if replace {
            best = Some(item);
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonDocumentStore;
    use shared::{Group, List, Photo};
    use tempfile::TempDir;

    fn setup_test_service() -> (AnalyticsService, Arc<DocumentRepository>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = JsonDocumentStore::new(temp_dir.path()).expect("Failed to create store");
        let repository = Arc::new(DocumentRepository::open(Box::new(store)));
        (AnalyticsService::new(repository.clone()), repository, temp_dir)
    }

    fn make_item(ts: u64, name: &str, price: f64, qty: u32) -> Item {
        Item {
            id: format!("item-{}-{}", ts, name.to_lowercase()),
            name: name.to_string(),
            price,
            qty,
            photo: None,
            ts,
        }
    }

    fn with_photo(mut item: Item) -> Item {
        item.photo = Some(Photo {
            mime: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8],
        });
        item
    }

    fn put_list(repository: &DocumentRepository, id: &str, budget: Option<f64>, items: Vec<Item>) {
        repository
            .mutate(|document| {
                document.lists.insert(
                    id.to_string(),
                    List {
                        id: id.to_string(),
                        name: id.to_string(),
                        budget,
                        group_ids: vec![],
                        items,
                    },
                );
                Ok(())
            })
            .unwrap();
    }

    fn local_millis(year: i32, month: u32, day: u32) -> u64 {
        Local
            .with_ymd_and_hms(year, month, day, 12, 0, 0)
            .single()
            .unwrap()
            .timestamp_millis() as u64
    }

    #[test]
    fn test_budget_status_boundaries() {
        assert_eq!(budget_status(None, 50.0), BudgetStatus::NoBudget);
        assert_eq!(budget_status(Some(0.0), 50.0), BudgetStatus::NoBudget);
        assert_eq!(budget_status(Some(-10.0), 50.0), BudgetStatus::NoBudget);

        assert_eq!(budget_status(Some(100.0), 0.0), BudgetStatus::OnTrack);
        assert_eq!(budget_status(Some(100.0), 79.99), BudgetStatus::OnTrack);
        assert_eq!(budget_status(Some(100.0), 80.0), BudgetStatus::Watch);
        assert_eq!(budget_status(Some(100.0), 99.99), BudgetStatus::Watch);
        assert_eq!(budget_status(Some(100.0), 100.0), BudgetStatus::Over);
        assert_eq!(budget_status(Some(100.0), 150.0), BudgetStatus::Over);
    }

    #[test]
    fn test_list_stats() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(
            &repository,
            "list-1-a",
            Some(20.0),
            vec![
                make_item(1000, "Milk", 3.49, 3),
                with_photo(make_item(2000, "Eggs", 6.0, 1)),
            ],
        );

        let stats = service.list_stats("list-1-a").unwrap();
        assert_eq!(stats.item_count, 2);
        assert_eq!(stats.total_spent, 16.47);
        assert_eq!(stats.with_photo_count, 1);
        assert_eq!(stats.without_photo_count, 1);
        assert_eq!(stats.budget_status, BudgetStatus::Watch);

        let result = service.list_stats("list-0-missing");
        assert!(matches!(result, Err(DomainError::NotFound("List", _))));
    }

    #[test]
    fn test_most_and_least_expensive() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(
            &repository,
            "list-1-a",
            None,
            vec![
                make_item(1000, "Bread", 2.0, 1),
                make_item(2000, "Cheese", 5.0, 1),
                make_item(3000, "Ham", 5.0, 1),
                make_item(4000, "Gum", 1.0, 1),
                make_item(5000, "Mints", 1.0, 1),
            ],
        );

        // Ties resolve to the earliest item in stored order
        let most = service.most_expensive("list-1-a").unwrap().unwrap();
        assert_eq!(most.name, "Cheese");
        let least = service.least_expensive("list-1-a").unwrap().unwrap();
        assert_eq!(least.name, "Gum");
    }

    #[test]
    fn test_most_expensive_uses_line_total_not_unit_price() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(
            &repository,
            "list-1-a",
            None,
            vec![
                make_item(1000, "Steak", 9.0, 1),
                make_item(2000, "Apples", 2.0, 6),
            ],
        );

        let most = service.most_expensive("list-1-a").unwrap().unwrap();
        assert_eq!(most.name, "Apples");
    }

    #[test]
    fn test_extremes_on_empty_list() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(&repository, "list-1-a", None, vec![]);

        assert_eq!(service.most_expensive("list-1-a").unwrap(), None);
        assert_eq!(service.least_expensive("list-1-a").unwrap(), None);
    }

    #[test]
    fn test_monthly_series_buckets_and_sorts() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(
            &repository,
            "list-1-a",
            None,
            vec![
                // Out of order on purpose; the series comes back sorted
                make_item(local_millis(2024, 3, 14), "Seeds", 5.0, 1),
                make_item(local_millis(2024, 1, 10), "Milk", 4.0, 1),
                make_item(local_millis(2024, 1, 20), "Eggs", 6.0, 1),
            ],
        );

        let series = service.monthly_series(&["list-1-a".to_string()]);
        assert_eq!(
            series,
            vec![
                MonthlyTotal {
                    month: "2024-01".to_string(),
                    total: 10.0,
                },
                MonthlyTotal {
                    month: "2024-03".to_string(),
                    total: 5.0,
                },
            ]
        );
    }

    #[test]
    fn test_monthly_series_merges_lists_and_skips_unknown_ids() {
        let (service, repository, _temp_dir) = setup_test_service();
        let january = local_millis(2024, 1, 10);
        put_list(
            &repository,
            "list-1-a",
            None,
            vec![make_item(january, "Milk", 0.1, 1)],
        );
        put_list(
            &repository,
            "list-2-b",
            None,
            vec![make_item(january, "Eggs", 0.2, 1)],
        );

        let series = service.monthly_series(&[
            "list-1-a".to_string(),
            "list-0-missing".to_string(),
            "list-2-b".to_string(),
        ]);

        // Bucket totals are rounded after summing, so 0.1 + 0.2 lands
        // exactly on 0.3
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].month, "2024-01");
        assert_eq!(series[0].total, 0.3);
    }

    #[test]
    fn test_monthly_series_empty_selection() {
        let (service, _repository, _temp_dir) = setup_test_service();
        assert!(service.monthly_series(&[]).is_empty());
    }

    #[test]
    fn test_resolve_filter_selection() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(&repository, "list-1-a", None, vec![]);
        put_list(&repository, "list-2-b", None, vec![]);
        repository
            .mutate(|document| {
                document.groups.insert(
                    "group-1-g".to_string(),
                    Group {
                        id: "group-1-g".to_string(),
                        name: "Errands".to_string(),
                        list_ids: vec!["list-2-b".to_string()],
                    },
                );
                document.groups.insert(
                    "group-2-empty".to_string(),
                    Group {
                        id: "group-2-empty".to_string(),
                        name: "Empty".to_string(),
                        list_ids: vec![],
                    },
                );
                Ok(())
            })
            .unwrap();

        let explicit = vec!["list-1-a".to_string()];

        // No group: the explicit selection passes through
        assert_eq!(
            service.resolve_filter_selection(&explicit, None),
            vec!["list-1-a".to_string()]
        );

        // A group overrides the explicit selection entirely
        assert_eq!(
            service.resolve_filter_selection(&explicit, Some("group-1-g")),
            vec!["list-2-b".to_string()]
        );

        // Even an empty group overrides
        assert!(service
            .resolve_filter_selection(&explicit, Some("group-2-empty"))
            .is_empty());

        // A vanished group resolves to nothing rather than falling back
        assert!(service
            .resolve_filter_selection(&explicit, Some("group-0-missing"))
            .is_empty());
    }

    #[test]
    fn test_items_newest_first_and_photo_items() {
        let (service, repository, _temp_dir) = setup_test_service();
        put_list(
            &repository,
            "list-1-a",
            None,
            vec![
                with_photo(make_item(1000, "Milk", 1.0, 1)),
                make_item(3000, "Eggs", 1.0, 1),
                with_photo(make_item(2000, "Bread", 1.0, 1)),
            ],
        );

        let newest: Vec<String> = service
            .items_newest_first("list-1-a")
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(newest, vec!["Eggs", "Bread", "Milk"]);

        let gallery: Vec<String> = service
            .photo_items("list-1-a")
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(gallery, vec!["Bread", "Milk"]);
    }

    #[test]
    fn test_overviews() {
        let (service, repository, _temp_dir) = setup_test_service();
        // Drop the seeded list for a predictable view
        repository
            .mutate(|document| {
                document.lists.clear();
                document.current_list_id = None;
                Ok(())
            })
            .unwrap();
        put_list(
            &repository,
            "list-1-a",
            Some(50.0),
            vec![make_item(1000, "Milk", 4.0, 2)],
        );
        put_list(&repository, "list-2-b", None, vec![]);
        repository
            .mutate(|document| {
                document.groups.insert(
                    "group-1-g".to_string(),
                    Group {
                        id: "group-1-g".to_string(),
                        name: "Errands".to_string(),
                        list_ids: vec!["list-1-a".to_string(), "list-2-b".to_string()],
                    },
                );
                Ok(())
            })
            .unwrap();

        let lists = service.list_overviews();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].id, "list-1-a");
        assert_eq!(lists[0].item_count, 1);
        assert_eq!(lists[0].total_spent, 8.0);
        assert_eq!(lists[0].budget, Some(50.0));
        assert_eq!(lists[1].total_spent, 0.0);

        let groups = service.group_overviews();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Errands");
        assert_eq!(groups[0].member_count, 2);
    }
}
