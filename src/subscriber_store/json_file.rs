use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{parse_address, AddOutcome, StoreError, StoredSubscriber, SubscriberStore};

/// Subscribers kept as a pretty-printed JSON array of strings.
///
/// All access goes through one mutex, so a process must hold a single
/// instance per file. Updates are written to a sibling temp file and renamed
/// over the store file: readers see either the old list or the new one.
pub struct JsonFileSubscriberStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileSubscriberStore {
    #[tracing::instrument(name = "Open subscriber store", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        };
        store.ensure_exists().await?;
        Ok(store)
    }

    /// Creates `[]` if nothing is there yet. An existing file is never touched.
    async fn ensure_exists(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create the subscriber store directory")
                .map_err(StoreError::StorageUnavailable)?;
        }
        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await;
        match created {
            Ok(mut file) => {
                file.write_all(b"[]")
                    .await
                    .context("Failed to initialise the subscriber store")
                    .map_err(StoreError::StorageUnavailable)?;
                file.sync_all()
                    .await
                    .context("Failed to flush the subscriber store")
                    .map_err(StoreError::StorageUnavailable)?;
                tracing::info!("Created an empty subscriber store");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(StoreError::StorageUnavailable(
                anyhow::Error::new(e).context("Failed to create the subscriber store"),
            )),
        }
    }

    async fn read_raw(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_exists().await?;
        let bytes = tokio::fs::read(&self.path)
            .await
            .context("Failed to read the subscriber store")
            .map_err(StoreError::StorageUnavailable)?;
        serde_json::from_slice::<Vec<String>>(&bytes)
            .context("The subscriber store is not a JSON list of addresses")
            .map_err(StoreError::StorageUnavailable)
    }

    async fn write_raw(&self, subscribers: &[String]) -> Result<(), StoreError> {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "subscribers.json".to_string());
        let temp_path = self
            .path
            .with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        let outcome = async {
            let content = serde_json::to_vec_pretty(subscribers)
                .context("Failed to serialise the subscriber list")?;
            let mut file = tokio::fs::File::create(&temp_path)
                .await
                .context("Failed to create a temporary subscriber file")?;
            file.write_all(&content)
                .await
                .context("Failed to write the temporary subscriber file")?;
            file.sync_all()
                .await
                .context("Failed to flush the temporary subscriber file")?;
            tokio::fs::rename(&temp_path, &self.path)
                .await
                .context("Failed to replace the subscriber store")?;
            Ok::<(), anyhow::Error>(())
        }
        .await;

        if outcome.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        outcome.map_err(StoreError::StorageUnavailable)
    }
}

#[async_trait]
impl SubscriberStore for JsonFileSubscriberStore {
    #[tracing::instrument(name = "Load subscribers", skip(self))]
    async fn load(&self) -> Result<Vec<StoredSubscriber>, StoreError> {
        let raw = {
            let _guard = self.lock.lock().await;
            self.read_raw().await?
        };
        let subscribers: Vec<_> = raw.into_iter().map(StoredSubscriber::from_raw).collect();
        let invalid = subscribers
            .iter()
            .filter(|s| matches!(s, StoredSubscriber::Invalid(_)))
            .count();
        if invalid > 0 {
            tracing::warn!(invalid, "The subscriber store holds invalid addresses");
        }
        Ok(subscribers)
    }

    #[tracing::instrument(name = "Add subscriber if absent", skip(self))]
    async fn add_if_absent(&self, address: String) -> Result<AddOutcome, StoreError> {
        let email = parse_address(address)?;
        let _guard = self.lock.lock().await;
        let mut subscribers = self.read_raw().await?;
        if subscribers.iter().any(|s| s == email.as_ref()) {
            return Ok(AddOutcome::AlreadyPresent);
        }
        subscribers.push(email.as_ref().to_string());
        self.write_raw(&subscribers).await?;
        Ok(AddOutcome::Added)
    }
}
