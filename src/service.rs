//! Lifecycle operations exposed to the CLI and the HTTP surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::entity::{Incident, IncidentDraft, IncidentStatus};
use crate::error::{IncidentError, Result};
use crate::ingest::{self, IngestReport, ScopedUpload};
use crate::storage::IncidentStore;

/// Cheap to clone; all clones share one store and therefore one write lock.
#[derive(Clone)]
pub struct IncidentService {
    store: Arc<IncidentStore>,
    upload_dir: PathBuf,
}

/// Ids that are not UUIDs cannot name a stored incident.
fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| IncidentError::NotFound(id.to_string()))
}

impl IncidentService {
    pub fn new(store: IncidentStore, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::new(store),
            upload_dir: upload_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            IncidentStore::new(&config.data_path),
            &config.upload_dir,
        )
    }

    pub fn store(&self) -> &IncidentStore {
        &self.store
    }

    pub async fn list(&self, include_archived: bool) -> Result<Vec<Incident>> {
        self.store.list_all(include_archived).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Incident> {
        let uuid = parse_id(id)?;
        self.store
            .find_by_id(uuid)
            .await?
            .ok_or_else(|| IncidentError::NotFound(id.to_string()))
    }

    pub async fn create(&self, fields: IncidentDraft) -> Result<Incident> {
        self.store.create(fields).await
    }

    pub async fn transition_status(&self, id: &str, new_status: &str) -> Result<Incident> {
        let uuid = parse_id(id)?;
        self.store.transition_status(uuid, new_status).await
    }

    pub async fn archive(&self, id: &str) -> Result<Incident> {
        self.transition_status(id, IncidentStatus::Archived.as_str())
            .await
    }

    pub async fn reopen(&self, id: &str) -> Result<Incident> {
        self.transition_status(id, IncidentStatus::Open.as_str()).await
    }

    pub async fn bulk_ingest(&self, input: &[u8]) -> Result<IngestReport> {
        ingest::ingest_bytes(&self.store, input).await
    }

    /// Park an uploaded body in the upload directory, ingest it, and remove it.
    pub async fn bulk_ingest_upload(&self, body: Vec<u8>) -> Result<IngestReport> {
        let dir = self.upload_dir.clone();
        let upload = tokio::task::spawn_blocking(move || ScopedUpload::write_in(&dir, &body))
            .await
            .map_err(|e| IncidentError::Io(std::io::Error::other(e)))??;
        ingest::ingest_upload(&self.store, upload).await
    }

    pub async fn import_file(&self, path: &Path) -> Result<IngestReport> {
        ingest::ingest_file(&self.store, path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service_in(tmp: &TempDir) -> IncidentService {
        IncidentService::new(
            IncidentStore::new(tmp.path().join("incidents.json")),
            tmp.path().join("uploads"),
        )
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let tmp = TempDir::new().unwrap();
        let service = service_in(&tmp);

        let err = service.get_by_id("not-a-uuid").await.unwrap_err();
        assert!(matches!(err, IncidentError::NotFound(id) if id == "not-a-uuid"));

        let err = service
            .get_by_id(&Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, IncidentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_get_and_archive_cycle() {
        let tmp = TempDir::new().unwrap();
        let service = service_in(&tmp);

        let created = service
            .create(IncidentDraft::new("Server down", "it is broken", "IT", "HIGH"))
            .await
            .unwrap();
        let id = created.id.to_string();
        assert_eq!(service.get_by_id(&id).await.unwrap(), created);

        let archived = service.archive(&id).await.unwrap();
        assert_eq!(archived.status, IncidentStatus::Archived);
        assert!(service.list(false).await.unwrap().is_empty());

        let reopened = service.reopen(&id).await.unwrap();
        assert_eq!(reopened.status, IncidentStatus::Open);
        assert_eq!(reopened.reported_at, created.reported_at);
        assert_eq!(service.list(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolved_can_be_archived_and_reopened() {
        let tmp = TempDir::new().unwrap();
        let service = service_in(&tmp);
        let id = service
            .create(IncidentDraft::new("Broken lift", "lift stuck on floor 3", "FACILITIES", "MEDIUM"))
            .await
            .unwrap()
            .id
            .to_string();

        service.transition_status(&id, "INVESTIGATING").await.unwrap();
        service.transition_status(&id, "RESOLVED").await.unwrap();
        service.archive(&id).await.unwrap();
        let reopened = service.reopen(&id).await.unwrap();
        assert_eq!(reopened.status, IncidentStatus::Open);

        // Reopened incidents follow the normal path again.
        let err = service.transition_status(&id, "RESOLVED").await.unwrap_err();
        assert!(matches!(err, IncidentError::TransitionRejected(_)));
    }

    #[tokio::test]
    async fn test_bulk_ingest_upload_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let service = service_in(&tmp);
        let body = b"title,description,category,severity\nServer down,it is broken,IT,HIGH\n".to_vec();

        let report = service.bulk_ingest_upload(body).await.unwrap();
        assert_eq!(report.created, 1);

        let leftovers = std::fs::read_dir(tmp.path().join("uploads")).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
