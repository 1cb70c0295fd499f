//! CSV export of the submission list.

use super::record::ContactSubmission;
use chrono::{NaiveDate, SecondsFormat};

/// Header row of the export.
pub const HEADER: [&str; 8] = [
    "Date",
    "Name",
    "Email",
    "Phone",
    "Timeline",
    "Budget",
    "Project Details",
    "Heard About Us",
];

/// A finished export, ready to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Suggested download name.
    pub file_name: String,
    /// CSV text.
    pub body: String,
}

/// Download name for an export made on `date`.
#[must_use]
pub fn file_name(date: NaiveDate) -> String {
    format!("contact-submissions-{}.csv", date.format("%Y-%m-%d"))
}

/// Render records in the given order. The header row is bare; every data
/// cell is double-quoted.
pub fn render<'a>(records: impl IntoIterator<Item = &'a ContactSubmission>) -> String {
    let mut lines = vec![HEADER.join(",")];
    lines.extend(records.into_iter().map(|record| {
        row(record)
            .iter()
            .map(|cell| quote(cell))
            .collect::<Vec<_>>()
            .join(",")
    }));
    lines.join("\n")
}

fn row(record: &ContactSubmission) -> [String; 8] {
    [
        record
            .created_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        record.full_name.clone(),
        record.email.clone(),
        record.phone.clone(),
        record.timeline.clone(),
        record.budget.clone(),
        record.project_details.clone().unwrap_or_default(),
        record.hear_about.clone().unwrap_or_default(),
    ]
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
