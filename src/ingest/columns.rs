// src/ingest/columns.rs
use csv::StringRecord;

use crate::entity::IncidentDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Category,
    Severity,
    Status,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Category => "category",
            Field::Severity => "severity",
            Field::Status => "status",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, Field::Status)
    }
}

/// Every column the pipeline understands. Headers are compared to these
/// names case-insensitively; anything else is ignored.
pub const COLUMN_FIELDS: [Field; 5] = [
    Field::Title,
    Field::Description,
    Field::Category,
    Field::Severity,
    Field::Status,
];

/// Resolved header positions for each known field.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    /// Candidate column indices per field, in precedence order.
    columns: Vec<(Field, Vec<usize>)>,
}

impl ColumnMap {
    /// Several headers may spell the same field (`title`, `Title`, `TITLE`).
    /// The exact lower-case spelling wins, then the rest in column order.
    pub fn from_headers(headers: &StringRecord) -> Self {
        let columns = COLUMN_FIELDS
            .iter()
            .map(|&field| {
                let mut candidates: Vec<(bool, usize)> = headers
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, header)| {
                        let header = header.trim().trim_start_matches('\u{feff}');
                        if header.eq_ignore_ascii_case(field.name()) {
                            Some((header != field.name(), idx))
                        } else {
                            None
                        }
                    })
                    .collect();
                candidates.sort();
                (field, candidates.into_iter().map(|(_, idx)| idx).collect())
            })
            .collect();

        Self { columns }
    }

    /// First non-empty value among the field's candidate columns.
    pub fn value<'r>(&self, record: &'r StringRecord, field: Field) -> Option<&'r str> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, indices)| {
                indices
                    .iter()
                    .filter_map(|&idx| record.get(idx))
                    .map(str::trim)
                    .find(|v| !v.is_empty())
            })
    }

    pub fn project(&self, record: &StringRecord) -> IncidentDraft {
        let get = |field| self.value(record, field).map(str::to_string);
        IncidentDraft {
            title: get(Field::Title),
            description: get(Field::Description),
            category: get(Field::Category),
            severity: get(Field::Severity),
            status: get(Field::Status),
        }
    }

    /// Required fields with no value in this record, in table order.
    pub fn missing_required(&self, record: &StringRecord) -> Vec<&'static str> {
        COLUMN_FIELDS
            .iter()
            .filter(|f| f.is_required() && self.value(record, **f).is_none())
            .map(|f| f.name())
            .collect()
    }
}
