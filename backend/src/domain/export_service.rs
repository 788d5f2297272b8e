//! CSV export.
//!
//! Flattens the selected lists into one spreadsheet-friendly table. Every
//! field is double-quoted with embedded quotes doubled, so names containing
//! commas or quotes survive any importer.

use chrono::SecondsFormat;
use log::info;
use std::sync::Arc;

use crate::domain::money::{item_total, round2};
use crate::domain::repository::DocumentRepository;
use shared::{CsvExportRequest, CsvExportResponse};

const CSV_HEADER: [&str; 7] = [
    "List",
    "Item",
    "Qty",
    "UnitPrice",
    "Total",
    "Timestamp",
    "HasPhoto",
];

/// Service that renders lists as CSV
#[derive(Clone)]
pub struct ExportService {
    repository: Arc<DocumentRepository>,
}

impl ExportService {
    /// Create a new ExportService
    pub fn new(repository: Arc<DocumentRepository>) -> Self {
        Self { repository }
    }

    /// Render the selected lists as one CSV table, one row per item, in
    /// selection order. Ids that no longer resolve are skipped; an empty
    /// selection still produces the header row.
    pub fn export_csv(&self, request: CsvExportRequest) -> CsvExportResponse {
        info!(
            "📄 EXPORT: Building CSV for {} selected lists",
            request.list_ids.len()
        );

        let (csv_content, row_count) = self.repository.read(|document| {
            let mut rows: Vec<String> = vec![csv_row(&CSV_HEADER)];
            let mut row_count = 0;

            for list_id in &request.list_ids {
                let list = match document.lists.get(list_id) {
                    Some(list) => list,
                    None => continue,
                };

                for item in &list.items {
                    let timestamp = item
                        .timestamp()
                        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
                        .unwrap_or_default();

                    rows.push(csv_row(&[
                        &list.name,
                        &item.name,
                        &item.qty.max(1).to_string(),
                        &format!("{:.2}", round2(item.price)),
                        &format!("{:.2}", item_total(item)),
                        &timestamp,
                        if item.photo.is_some() { "yes" } else { "no" },
                    ]));
                    row_count += 1;
                }
            }

            (rows.join("\n"), row_count)
        });

        info!(
            "✅ EXPORT: Generated CSV with {} item rows ({} bytes)",
            row_count,
            csv_content.len()
        );

        CsvExportResponse {
            csv_content,
            filename: "shopping-tracker.csv".to_string(),
            row_count,
        }
    }
}

/// Quote every field and double any embedded quotes
fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| format!("\"{}\"", field.replace("\"", "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
