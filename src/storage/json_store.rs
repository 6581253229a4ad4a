use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entity::{Incident, IncidentDraft, IncidentStatus};
use crate::error::{IncidentError, Result};
use crate::validation::{validate_transition, NewIncident};

/// File-backed incident collection.
///
/// The file holds one JSON snapshot of the whole collection. Every mutating
/// operation holds `write_lock` across its load, mutate and save steps, so
/// two mutations on the same store never lose each other's writes. Reads
/// skip the lock and see the last completed save.
pub struct IncidentStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl IncidentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole collection. A missing file is an empty collection.
    pub async fn load_all(&self) -> Result<Vec<Incident>> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(IncidentError::storage(&self.path, e)),
        };

        let incidents: Vec<Incident> = serde_json::from_str(&data)
            .map_err(|e| IncidentError::storage(&self.path, format!("corrupt snapshot: {}", e)))?;
        debug!(path = %self.path.display(), count = incidents.len(), "loaded snapshot");
        Ok(incidents)
    }

    /// Replace the stored collection.
    pub async fn save_all(&self, incidents: &[Incident]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_snapshot(incidents).await
    }

    /// Caller must hold `write_lock`.
    async fn write_snapshot(&self, incidents: &[Incident]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| IncidentError::storage(parent, e))?;
        }

        let mut body = serde_json::to_string_pretty(incidents)?;
        body.push('\n');

        // Write beside the target and rename, so readers never see a torn file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .await
            .map_err(|e| IncidentError::storage(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp snapshot");
            }
            return Err(IncidentError::storage(&self.path, e));
        }

        debug!(path = %self.path.display(), count = incidents.len(), "saved snapshot");
        Ok(())
    }

    /// Validate and store a single incident. Single creation always starts
    /// at OPEN, whatever status the draft carries.
    pub async fn create(&self, draft: IncidentDraft) -> Result<Incident> {
        let new = NewIncident::from_draft(draft).map_err(IncidentError::ValidationFailed)?;

        let _guard = self.write_lock.lock().await;
        let mut incidents = self.load_all().await?;
        let incident = new.into_incident(IncidentStatus::Open);
        incidents.push(incident.clone());
        self.write_snapshot(&incidents).await?;

        info!(id = %incident.id, title = %incident.title, "created incident");
        Ok(incident)
    }

    /// Store a batch of already validated incidents with one load and one save.
    ///
    /// A candidate's own status is kept; otherwise it starts at OPEN.
    pub async fn create_many(&self, batch: Vec<NewIncident>) -> Result<Vec<Incident>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let _guard = self.write_lock.lock().await;
        let mut incidents = self.load_all().await?;
        let created: Vec<Incident> = batch
            .into_iter()
            .map(|new| {
                let status = new.status().unwrap_or_default();
                new.into_incident(status)
            })
            .collect();
        incidents.extend(created.iter().cloned());
        self.write_snapshot(&incidents).await?;

        info!(count = created.len(), "created incident batch");
        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Incident>> {
        Ok(self.load_all().await?.into_iter().find(|i| i.id == id))
    }

    /// Stored order, ARCHIVED excluded unless requested.
    pub async fn list_all(&self, include_archived: bool) -> Result<Vec<Incident>> {
        let incidents = self.load_all().await?;
        Ok(incidents
            .into_iter()
            .filter(|i| include_archived || !i.is_archived())
            .collect())
    }

    /// Move an incident to `new_status` if the adjacency table allows it.
    pub async fn transition_status(&self, id: Uuid, new_status: &str) -> Result<Incident> {
        let _guard = self.write_lock.lock().await;
        let mut incidents = self.load_all().await?;

        let incident = incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| IncidentError::NotFound(id.to_string()))?;

        let from = incident.status;
        let to = validate_transition(from, new_status).map_err(IncidentError::TransitionRejected)?;
        if from == to {
            debug!(%id, status = %to, "status unchanged");
            return Ok(incident.clone());
        }

        incident.status = to;
        let updated = incident.clone();
        self.write_snapshot(&incidents).await?;

        info!(%id, %from, %to, "transitioned incident");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> IncidentStore {
        IncidentStore::new(tmp.path().join("data/incidents.json"))
    }

    fn draft(title: &str) -> IncidentDraft {
        IncidentDraft::new(title, "it is broken badly", "IT", "HIGH")
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(store.load_all().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        let err = store.load_all().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StorageFailure);
    }

    #[tokio::test]
    async fn test_path_is_a_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = IncidentStore::new(tmp.path());
        let err = store.load_all().await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StorageFailure);
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        // A non-empty directory cannot be replaced by a file.
        std::fs::create_dir_all(store.path().join("occupied")).unwrap();

        let err = store.save_all(&[]).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StorageFailure);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_create_persists_open_incident() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let created = store
            .create(IncidentDraft::new("Server down", "it is broken", "IT", "HIGH"))
            .await
            .unwrap();
        assert_eq!(created.status, IncidentStatus::Open);

        // Reopen and verify
        let store2 = store_in(&tmp);
        let loaded = store2.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.reported_at, created.reported_at);
    }

    #[tokio::test]
    async fn test_create_ignores_supplied_status() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let created = store
            .create(draft("Printer jam").with_status("RESOLVED"))
            .await
            .unwrap();
        assert_eq!(created.status, IncidentStatus::Open);
    }

    #[tokio::test]
    async fn test_invalid_create_persists_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        let err = store.create(draft("bad")).await.unwrap_err();
        match err {
            IncidentError::ValidationFailed(errors) => {
                assert_eq!(errors, vec!["Title must be at least 5 characters long"]);
            }
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let a = store.create(draft("First incident")).await.unwrap();
        let b = store.create(draft("Second incident")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.load_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_many_keeps_supplied_status() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let batch = vec![
            NewIncident::from_draft(draft("Row one title")).unwrap(),
            NewIncident::from_draft(draft("Row two title").with_status("INVESTIGATING")).unwrap(),
        ];

        let created = store.create_many(batch).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].status, IncidentStatus::Open);
        assert_eq!(created[1].status, IncidentStatus::Investigating);
        assert_eq!(store.load_all().await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_many_empty_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(store.create_many(Vec::new()).await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_list_hides_archived_by_request() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let keep = store.create(draft("Stays visible")).await.unwrap();
        let gone = store.create(draft("Gets archived")).await.unwrap();
        store.transition_status(gone.id, "ARCHIVED").await.unwrap();

        let visible = store.list_all(false).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, keep.id);

        let all = store.list_all(true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, keep.id);
        assert_eq!(all[1].id, gone.id);
    }

    #[tokio::test]
    async fn test_transition_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.create(draft("Something else")).await.unwrap();

        let err = store
            .transition_status(Uuid::new_v4(), "INVESTIGATING")
            .await
            .unwrap_err();
        assert!(matches!(err, IncidentError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejected_transition_leaves_state() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let created = store.create(draft("Server down")).await.unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let err = store
            .transition_status(created.id, "RESOLVED")
            .await
            .unwrap_err();
        match err {
            IncidentError::TransitionRejected(reason) => {
                assert_eq!(reason, "Cannot transition from OPEN to RESOLVED")
            }
            other => panic!("Expected TransitionRejected, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_archive_then_reopen() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let created = store.create(draft("Server down")).await.unwrap();

        for status in ["INVESTIGATING", "RESOLVED", "ARCHIVED", "OPEN"] {
            let updated = store.transition_status(created.id, status).await.unwrap();
            assert_eq!(updated.status.as_str(), status);
            assert_eq!(updated.reported_at, created.reported_at);
        }
    }

    #[tokio::test]
    async fn test_same_status_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let created = store.create(draft("Server down")).await.unwrap();
        let updated = store.transition_status(created.id, "OPEN").await.unwrap();
        assert_eq!(updated, created);
    }

    #[tokio::test]
    async fn test_save_load_roundtrip_is_byte_stable() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.create(draft("First incident")).await.unwrap();
        store.create(draft("Second incident")).await.unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let loaded = store.load_all().await.unwrap();
        store.save_all(&loaded).await.unwrap();

        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_lose_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store_in(&tmp));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(draft(&format!("Incident number {}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load_all().await.unwrap().len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_on_same_id() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store_in(&tmp));
        let id = store.create(draft("Contended incident")).await.unwrap().id;

        let a = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.transition_status(id, "INVESTIGATING").await })
        };
        let b = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.transition_status(id, "ARCHIVED").await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        // Whichever runs second sees the first one's status and is rejected.
        let winners: Vec<&Incident> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.status, winners[0].status);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_on_different_ids() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store_in(&tmp));
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(store.create(draft(&format!("Incident {}", i))).await.unwrap().id);
        }

        let mut handles = Vec::new();
        for id in ids.clone() {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.transition_status(id, "INVESTIGATING").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = store.list_all(true).await.unwrap();
        assert!(all
            .iter()
            .all(|i| i.status == IncidentStatus::Investigating));
    }
}
