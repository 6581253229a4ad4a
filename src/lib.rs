pub mod api;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod ingest;
pub mod service;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use entity::{Category, Incident, IncidentDraft, IncidentStatus, Severity};
pub use error::{ErrorKind, IncidentError, Result};
pub use ingest::IngestReport;
pub use service::IncidentService;
pub use storage::IncidentStore;
