//! Storage and input seams for the reconciliation engine.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dns_warden_provider::RecordKey;

use crate::error::{CoreError, CoreResult};
use crate::tracker::TrackedRecord;
use crate::types::RecordSpec;

/// Persistence seam for ownership/orphan state.
///
/// Implementations must be cheap to call once per touched record per pass;
/// the tracker keeps its own in-memory view and only writes through.
#[async_trait]
pub trait TrackerRepository: Send + Sync {
    /// All persisted entries, loaded once at startup.
    async fn load_all(&self) -> CoreResult<Vec<TrackedRecord>>;

    /// Insert or update one entry.
    async fn save(&self, record: &TrackedRecord) -> CoreResult<()>;

    /// Remove one entry; removing an unknown key is not an error.
    async fn remove(&self, key: &RecordKey) -> CoreResult<()>;
}

/// Boundary to the container/router watcher (external collaborator).
///
/// Implementations regenerate the full ordered desired-state list on every
/// call; the reconciler never sees deltas.
#[async_trait]
pub trait DesiredStateSource: Send + Sync {
    async fn desired_records(&self) -> CoreResult<Vec<RecordSpec>>;
}

// ===== MemoryTrackerRepository =====

/// In-memory repository, also the base for tests (supports injectable save
/// failures).
pub struct MemoryTrackerRepository {
    entries: RwLock<HashMap<RecordKey, TrackedRecord>>,
    save_error: RwLock<Option<String>>,
}

impl MemoryTrackerRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            save_error: RwLock::new(None),
        }
    }

    /// When `Some`, every `save` fails with this message (exercises the
    /// per-record isolation path).
    pub async fn set_save_error(&self, error: Option<String>) {
        *self.save_error.write().await = error;
    }
}

impl Default for MemoryTrackerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackerRepository for MemoryTrackerRepository {
    async fn load_all(&self) -> CoreResult<Vec<TrackedRecord>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn save(&self, record: &TrackedRecord) -> CoreResult<()> {
        if let Some(ref message) = *self.save_error.read().await {
            return Err(CoreError::Tracker(message.clone()));
        }
        self.entries
            .write()
            .await
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn remove(&self, key: &RecordKey) -> CoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// ===== JsonFileTrackerRepository =====

/// JSON-file-backed repository: the whole entry set is rewritten on every
/// mutation via a temp-file rename, so a crash never leaves a torn file.
pub struct JsonFileTrackerRepository {
    path: PathBuf,
    entries: RwLock<HashMap<RecordKey, TrackedRecord>>,
}

impl JsonFileTrackerRepository {
    /// Open (or create on first write) the repository at `path`.
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be read or parsed.
    pub async fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let list: Vec<TrackedRecord> = serde_json::from_str(&contents)
                    .map_err(|e| CoreError::Tracker(format!("corrupt tracker file: {e}")))?;
                list.into_iter().map(|r| (r.key.clone(), r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(CoreError::Tracker(format!(
                    "cannot read tracker file {}: {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn flush(&self, entries: &HashMap<RecordKey, TrackedRecord>) -> CoreResult<()> {
        let list: Vec<&TrackedRecord> = entries.values().collect();
        let json = serde_json::to_string_pretty(&list)
            .map_err(|e| CoreError::Tracker(format!("serialize failed: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CoreError::Tracker(format!("write failed: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CoreError::Tracker(format!("rename failed: {e}")))
    }
}

#[async_trait]
impl TrackerRepository for JsonFileTrackerRepository {
    async fn load_all(&self) -> CoreResult<Vec<TrackedRecord>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn save(&self, record: &TrackedRecord) -> CoreResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(record.key.clone(), record.clone());
        self.flush(&entries).await
    }

    async fn remove(&self, key: &RecordKey) -> CoreResult<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use dns_warden_provider::{DnsRecordType, ProviderType};

    use super::*;

    fn sample(name: &str) -> TrackedRecord {
        let now = Utc::now();
        TrackedRecord {
            key: RecordKey::new(DnsRecordType::A, name),
            managed_by: ProviderType::Cloudflare,
            first_seen_at: now,
            last_confirmed_at: now,
            orphaned_since: None,
        }
    }

    #[tokio::test]
    async fn memory_repository_roundtrip() {
        let repo = MemoryTrackerRepository::new();
        repo.save(&sample("a.example.com")).await.unwrap();
        repo.save(&sample("b.example.com")).await.unwrap();
        assert_eq!(repo.load_all().await.unwrap().len(), 2);

        repo.remove(&RecordKey::new(DnsRecordType::A, "a.example.com"))
            .await
            .unwrap();
        assert_eq!(repo.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn memory_repository_injected_failure() {
        let repo = MemoryTrackerRepository::new();
        repo.set_save_error(Some("boom".to_string())).await;
        let result = repo.save(&sample("a.example.com")).await;
        assert!(matches!(result, Err(CoreError::Tracker(_))));
    }

    #[tokio::test]
    async fn json_repository_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!("dns-warden-test-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("tracker.json");
        let _ = tokio::fs::remove_file(&path).await;

        {
            let repo = JsonFileTrackerRepository::open(&path).await.unwrap();
            repo.save(&sample("a.example.com")).await.unwrap();
        }

        let reopened = JsonFileTrackerRepository::open(&path).await.unwrap();
        let all = reopened.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key.name, "a.example.com");

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn json_repository_missing_file_is_empty() {
        let path = std::env::temp_dir().join("dns-warden-nonexistent-tracker.json");
        let _ = tokio::fs::remove_file(&path).await;
        let repo = JsonFileTrackerRepository::open(&path).await.unwrap();
        assert!(repo.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repositories_are_object_safe() {
        let _repo: Arc<dyn TrackerRepository> = Arc::new(MemoryTrackerRepository::new());
    }
}
