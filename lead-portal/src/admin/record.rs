//! Contact submission rows and list ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shown in the detail view for optional fields left empty.
pub const NOT_PROVIDED: &str = "Not provided";

/// One contact-form submission as stored in the submissions table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    /// Row id. Numeric ids are read as their decimal text.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Name given on the contact form.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Project timeline choice.
    pub timeline: String,
    /// Budget range choice.
    pub budget: String,
    /// Free-text project description.
    #[serde(default)]
    pub project_details: Option<String>,
    /// Referral source.
    #[serde(default)]
    pub hear_about: Option<String>,
    /// When the submission arrived.
    pub created_at: DateTime<Utc>,
}

impl ContactSubmission {
    /// Search match: name and email ignore case, phone is matched as typed.
    /// An empty term matches everything.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.full_name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self.phone.contains(term)
    }

    /// Submission time for display, e.g. `Mar 4, 2025, 09:15 AM`.
    #[must_use]
    pub fn display_date(&self) -> String {
        self.created_at.format("%b %-d, %Y, %I:%M %p").to_string()
    }

    /// Project details for display.
    #[must_use]
    pub fn project_details_or_default(&self) -> &str {
        non_empty_or_default(self.project_details.as_deref())
    }

    /// Referral source for display.
    #[must_use]
    pub fn hear_about_or_default(&self) -> &str {
        non_empty_or_default(self.hear_about.as_deref())
    }
}

fn non_empty_or_default(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => NOT_PROVIDED,
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Column the list is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Submission time.
    #[default]
    CreatedAt,
    /// Submitter name.
    FullName,
    /// Budget range.
    Budget,
}

impl SortKey {
    /// Every key, in menu order.
    pub const ALL: [Self; 3] = [Self::CreatedAt, Self::FullName, Self::Budget];

    /// Column name in the submissions table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::FullName => "full_name",
            Self::Budget => "budget",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreatedAt => "Sort by Date",
            Self::FullName => "Sort by Name",
            Self::Budget => "Sort by Budget",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SortKey {
    type Err = UnknownSortValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.column() == s)
            .ok_or_else(|| UnknownSortValue(s.to_string()))
    }
}

/// Direction of the list ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest (newest) first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Whether rows are requested in ascending order.
    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }

    /// The other direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Query value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Toggle button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "↑ Ascending",
            Self::Desc => "↓ Descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = UnknownSortValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(UnknownSortValue(other.to_string())),
        }
    }
}

/// A sort key or order that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort value: {0}")]
pub struct UnknownSortValue(pub String);


#[cfg(test)]
mod tests {
    use super::fixtures::submission;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_store_row() {
        let row = json!({
            "id": 42,
            "full_name": "Ann Lee",
            "email": "ann@example.com",
            "phone": "555-0100",
            "timeline": "ASAP",
            "budget": "$10k+",
            "project_details": null,
            "created_at": "2025-03-04T09:15:00.123+00:00"
        });

        let record: ContactSubmission = serde_json::from_value(row).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.project_details, None);
        assert_eq!(record.hear_about, None);
        assert_eq!(record.created_at.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_rejects_row_missing_required_field() {
        let row = json!({ "id": "a", "full_name": "Ann" });
        assert!(serde_json::from_value::<ContactSubmission>(row).is_err());
    }

    #[test]
    fn test_search_matching() {
        let record = submission("1", "Ann Lee");
        assert!(record.matches(""));
        assert!(record.matches("ANN"));
        assert!(record.matches("ann.lee@EXAMPLE"));
        assert!(record.matches("555 01"));
        assert!(!record.matches("bob"));
    }

    #[test]
    fn test_display_helpers() {
        let mut record = submission("1", "Ann Lee");
        assert_eq!(record.display_date(), "Mar 4, 2025, 09:15 AM");
        assert_eq!(record.project_details_or_default(), NOT_PROVIDED);

        record.hear_about = Some("Search".to_string());
        assert_eq!(record.hear_about_or_default(), "Search");
    }

    #[test]
    fn test_sort_values_parse() {
        assert_eq!("full_name".parse::<SortKey>(), Ok(SortKey::FullName));
        assert!("email".parse::<SortKey>().is_err());
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!(SortOrder::default().toggled(), SortOrder::Asc);
        assert_eq!(SortKey::default().column(), "created_at");
    }
}
