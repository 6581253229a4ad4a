//! Field and status-transition rules for incidents.
//!
//! Everything here is pure: no I/O, no clock except when a validated
//! candidate is turned into a stored [`Incident`].

use chrono::Utc;
use uuid::Uuid;

use crate::entity::{Category, Incident, IncidentDraft, IncidentStatus, Severity};

pub const MIN_TITLE_LENGTH: usize = 5;
pub const MIN_DESCRIPTION_LENGTH: usize = 10;

fn join_names<T: std::fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Blank values count as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Check every field constraint and return all violations at once.
///
/// An empty vector means the draft is valid.
pub fn validate_incident_fields(draft: &IncidentDraft) -> Vec<String> {
    let mut errors = Vec::new();

    match present(&draft.title) {
        None => errors.push("Title is required".to_string()),
        Some(title) if title.chars().count() < MIN_TITLE_LENGTH => errors.push(format!(
            "Title must be at least {} characters long",
            MIN_TITLE_LENGTH
        )),
        Some(_) => {}
    }

    match present(&draft.description) {
        None => errors.push("Description is required".to_string()),
        Some(description) if description.chars().count() < MIN_DESCRIPTION_LENGTH => {
            errors.push(format!(
                "Description must be at least {} characters long",
                MIN_DESCRIPTION_LENGTH
            ))
        }
        Some(_) => {}
    }

    match present(&draft.category) {
        None => errors.push("Category is required".to_string()),
        Some(category) if category.parse::<Category>().is_err() => errors.push(format!(
            "Category must be one of: {}",
            join_names(&Category::ALL)
        )),
        Some(_) => {}
    }

    match present(&draft.severity) {
        None => errors.push("Severity is required".to_string()),
        Some(severity) if severity.parse::<Severity>().is_err() => errors.push(format!(
            "Severity must be one of: {}",
            join_names(&Severity::ALL)
        )),
        Some(_) => {}
    }

    if let Some(status) = present(&draft.status) {
        if status.parse::<IncidentStatus>().is_err() {
            errors.push(format!(
                "Status must be one of: {}",
                join_names(&IncidentStatus::ALL)
            ));
        }
    }

    errors
}

/// Check a requested move against the adjacency table.
///
/// Returns the parsed target status on success, or a human-readable reason.
pub fn validate_transition(
    current: IncidentStatus,
    new_status: &str,
) -> Result<IncidentStatus, String> {
    let next: IncidentStatus = new_status.parse().map_err(|_| {
        format!(
            "Invalid status. Must be one of: {}",
            join_names(&IncidentStatus::ALL)
        )
    })?;

    if !current.can_transition_to(next) {
        return Err(format!("Cannot transition from {} to {}", current, next));
    }

    Ok(next)
}

/// A draft that passed [`validate_incident_fields`].
///
/// Fields are private so the only way to build one is through
/// [`NewIncident::from_draft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
    title: String,
    description: String,
    category: Category,
    severity: Severity,
    status: Option<IncidentStatus>,
}

impl NewIncident {
    pub fn from_draft(draft: IncidentDraft) -> Result<Self, Vec<String>> {
        let errors = validate_incident_fields(&draft);
        if !errors.is_empty() {
            return Err(errors);
        }

        let parse_err = |e: String| vec![e];
        Ok(Self {
            title: present(&draft.title).unwrap_or_default().to_string(),
            description: present(&draft.description).unwrap_or_default().to_string(),
            category: present(&draft.category)
                .unwrap_or_default()
                .parse::<Category>()
                .map_err(parse_err)?,
            severity: present(&draft.severity)
                .unwrap_or_default()
                .parse::<Severity>()
                .map_err(parse_err)?,
            status: present(&draft.status)
                .map(str::parse::<IncidentStatus>)
                .transpose()
                .map_err(parse_err)?,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Status explicitly supplied with the draft, if any.
    pub fn status(&self) -> Option<IncidentStatus> {
        self.status
    }

    /// Stamp a fresh id and report time.
    pub fn into_incident(self, status: IncidentStatus) -> Incident {
        Incident {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category: self.category,
            severity: self.severity,
            status,
            reported_at: Utc::now(),
        }
    }
}
