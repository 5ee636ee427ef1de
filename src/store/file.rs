use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{StoreError, SubscriptionStore, upsert};
use crate::notify::PushSubscription;

/// Subscriptions persisted as a single JSON array.
///
/// All mutations go through one lock and are applied to a copy of the
/// current records. The copy is written to a temporary sibling file and
/// renamed over the store, and only then replaces the in-memory view,
/// so a failed or interrupted write leaves both the file and memory at
/// the last durable state.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    subscriptions: Mutex<Vec<PushSubscription>>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating it with an empty array if it
    /// does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let subscriptions = match fs::read_to_string(&path).await {
            Ok(data) => serde_json::from_str(&data)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).await?;
                }
                write_atomic(&path, &[]).await?;
                tracing::info!("Created subscription store at {}", path.display());
                Vec::new()
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            subscriptions: Mutex::new(subscriptions),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn commit(
        &self,
        current: &mut Vec<PushSubscription>,
        next: Vec<PushSubscription>,
    ) -> Result<(), StoreError> {
        if let Err(err) = write_atomic(&self.path, &next).await {
            tracing::error!(
                "Failed to persist subscriptions to {}: {}",
                self.path.display(),
                err
            );
            return Err(err);
        }
        *current = next;
        Ok(())
    }
}

async fn write_atomic(path: &Path, subscriptions: &[PushSubscription]) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(subscriptions)?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(err) = replace_with(&tmp_path, path, &data).await {
        if let Err(cleanup) = fs::remove_file(&tmp_path).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
            }
        }
        return Err(err.into());
    }
    Ok(())
}

async fn replace_with(tmp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(tmp_path, path).await?;

    // Make the rename itself durable. The new file is already in place,
    // so a failure here is not reported as a failed write.
    #[cfg(unix)]
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let synced = match fs::File::open(parent).await {
            Ok(dir) => dir.sync_all().await,
            Err(err) => Err(err),
        };
        if let Err(err) = synced {
            tracing::warn!("Failed to sync {}: {}", parent.display(), err);
        }
    }
    Ok(())
}

#[async_trait]
impl SubscriptionStore for JsonFileStore {
    async fn add(&self, subscription: PushSubscription) -> Result<(), StoreError> {
        let mut current = self.subscriptions.lock().await;
        let mut next = current.clone();
        upsert(&mut next, subscription);
        self.commit(&mut current, next).await
    }

    async fn remove(&self, endpoint: &str) -> Result<bool, StoreError> {
        let mut current = self.subscriptions.lock().await;
        if !current.iter().any(|s| s.endpoint == endpoint) {
            return Ok(false);
        }
        let next = current
            .iter()
            .filter(|s| s.endpoint != endpoint)
            .cloned()
            .collect();
        self.commit(&mut current, next).await?;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<PushSubscription>, StoreError> {
        Ok(self.subscriptions.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn it_creates_missing_file_with_empty_array() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("subscriptions.json");
        let store = JsonFileStore::open(&path).await?;

        assert_eq!(store.count().await?, 0);
        assert_eq!(std::fs::read_to_string(&path)?.trim(), "[]");
        Ok(())
    }

    #[tokio::test]
    async fn it_persists_upserts_across_reopen() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("subscriptions.json");

        {
            let store = JsonFileStore::open(&path).await?;
            store.add(PushSubscription::new("e1", "p1", "a1")).await?;
            store.add(PushSubscription::new("e2", "p2", "a2")).await?;
            store.add(PushSubscription::new("e1", "p3", "a3")).await?;
        }

        let store = JsonFileStore::open(&path).await?;
        let all = store.list().await?;
        assert_eq!(
            all,
            vec![
                PushSubscription::new("e1", "p3", "a3"),
                PushSubscription::new("e2", "p2", "a2"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_removes_endpoint() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("subscriptions.json");
        let store = JsonFileStore::open(&path).await?;
        store.add(PushSubscription::new("e1", "p1", "a1")).await?;

        assert!(store.remove("e1").await?);
        assert!(!store.remove("e1").await?);
        assert!(store.list().await?.iter().all(|s| s.endpoint != "e1"));

        let reopened = JsonFileStore::open(&path).await?;
        assert_eq!(reopened.count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn it_leaves_no_temp_file_behind() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("subscriptions.json");
        let store = JsonFileStore::open(&path).await?;
        store.add(PushSubscription::new("e1", "p1", "a1")).await?;

        assert!(!temp_dir.path().join("subscriptions.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn it_cleans_up_temp_file_when_replace_fails() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        // A non-empty directory where the file should be makes the rename fail
        let path = temp_dir.path().join("subscriptions.json");
        std::fs::create_dir(&path)?;
        std::fs::write(path.join("occupied"), "x")?;

        let result = write_atomic(&path, &[PushSubscription::new("e1", "p1", "a1")]).await;

        assert!(result.is_err());
        assert!(!temp_dir.path().join("subscriptions.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn it_rejects_corrupt_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("subscriptions.json");
        std::fs::write(&path, "{not json")?;

        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serde(_))));
        Ok(())
    }

    #[tokio::test]
    async fn it_serializes_concurrent_removals() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("subscriptions.json");
        let store = Arc::new(JsonFileStore::open(&path).await?);
        for i in 0..10 {
            store
                .add(PushSubscription::new(&format!("e{i}"), "p", "a"))
                .await?;
        }

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..10 {
            let store = Arc::clone(&store);
            // Every even endpoint is removed twice
            let endpoint = format!("e{}", i - i % 2);
            tasks.spawn(async move { store.remove(&endpoint).await });
        }
        while let Some(res) = tasks.join_next().await {
            res??;
        }

        let reopened = JsonFileStore::open(&path).await?;
        let endpoints: Vec<String> = reopened
            .list()
            .await?
            .into_iter()
            .map(|s| s.endpoint)
            .collect();
        assert_eq!(endpoints, vec!["e1", "e3", "e5", "e7", "e9"]);
        Ok(())
    }
}
