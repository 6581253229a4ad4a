// src/entity/status.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentStatus {
    #[default]
    Open,
    Investigating,
    Resolved,
    Archived,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Open,
        IncidentStatus::Investigating,
        IncidentStatus::Resolved,
        IncidentStatus::Archived,
    ];

    /// Statuses reachable in one step. This table is the only place legal
    /// moves are defined.
    pub fn next_statuses(self) -> &'static [IncidentStatus] {
        match self {
            IncidentStatus::Open => &[IncidentStatus::Investigating, IncidentStatus::Archived],
            IncidentStatus::Investigating => &[IncidentStatus::Resolved],
            IncidentStatus::Resolved => &[IncidentStatus::Archived],
            IncidentStatus::Archived => &[IncidentStatus::Open],
        }
    }

    /// Re-applying the current status is always accepted.
    pub fn can_transition_to(self, next: IncidentStatus) -> bool {
        self == next || self.next_statuses().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Investigating => "INVESTIGATING",
            IncidentStatus::Resolved => "RESOLVED",
            IncidentStatus::Archived => "ARCHIVED",
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OPEN" => Ok(IncidentStatus::Open),
            "INVESTIGATING" => Ok(IncidentStatus::Investigating),
            "RESOLVED" => Ok(IncidentStatus::Resolved),
            "ARCHIVED" => Ok(IncidentStatus::Archived),
            _ => Err(format!("Invalid incident status: {}", s)),
        }
    }
}
