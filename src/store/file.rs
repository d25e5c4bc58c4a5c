use super::{DocumentStore, ForumLinks, StoreData, StoreError};
use crate::preferences::ErrorMessageTypeRecord;
use crate::run_log::RunLog;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// All collections in one pretty-printed JSON file.
///
/// Each operation loads, mutates and rewrites the file while holding the
/// store's lock, and the rewrite goes through a temporary file and a
/// rename, so a reader never sees half a document.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<StoreData, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(StoreData::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreData::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let data = self.load().await?;
        Ok(f(&data))
    }

    async fn update<T>(&self, f: impl FnOnce(&mut StoreData) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        let result = f(&mut data);
        self.save(&data).await?;
        Ok(result)
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn forum_links(&self) -> Result<ForumLinks, StoreError> {
        self.read(|data| data.forum_links.clone()).await
    }

    async fn add_to_link_set(&self, key: &str, post_id: &str) -> Result<bool, StoreError> {
        self.update(|data| data.add_to_link_set(key, post_id)).await
    }

    async fn remove_from_link_set(&self, key: &str, post_id: &str) -> Result<bool, StoreError> {
        self.update(|data| data.remove_from_link_set(key, post_id)).await
    }

    async fn push_error_message_type(
        &self,
        user_id: &str,
        record: ErrorMessageTypeRecord,
    ) -> Result<(), StoreError> {
        self.update(|data| data.push_error_message_type(user_id, record))
            .await
    }

    async fn error_message_types(
        &self,
        user_id: &str,
    ) -> Result<Vec<ErrorMessageTypeRecord>, StoreError> {
        self.read(|data| data.error_message_types(user_id)).await
    }

    async fn put_run_log(&self, user_id: &str, id: &str, log: RunLog) -> Result<(), StoreError> {
        self.update(|data| data.put_run_log(user_id, id, log)).await
    }

    async fn run_logs(&self, user_id: &str) -> Result<BTreeMap<String, RunLog>, StoreError> {
        self.read(|data| data.run_logs(user_id)).await
    }
}
