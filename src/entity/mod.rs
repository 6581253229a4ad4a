mod classification;
mod status;

pub use classification::{Category, Severity};
pub use status::IncidentStatus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored incident report.
///
/// The serialized field set is the persisted format, so fields are only ever
/// added here together with a migration of existing snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub reported_at: DateTime<Utc>,
}

impl Incident {
    pub fn is_archived(&self) -> bool {
        self.status == IncidentStatus::Archived
    }

    /// First 8 characters of the id, for terminal output.
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

/// Unvalidated incident fields as supplied by a caller or a CSV row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
}

impl IncidentDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            category: Some(category.into()),
            severity: Some(severity.into()),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}
