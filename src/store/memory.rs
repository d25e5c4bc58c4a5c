use super::{DocumentStore, ForumLinks, StoreData, StoreError};
use crate::preferences::ErrorMessageTypeRecord;
use crate::run_log::RunLog;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<StoreData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: StoreData) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn forum_links(&self) -> Result<ForumLinks, StoreError> {
        Ok(self.data.lock().await.forum_links.clone())
    }

    async fn add_to_link_set(&self, key: &str, post_id: &str) -> Result<bool, StoreError> {
        Ok(self.data.lock().await.add_to_link_set(key, post_id))
    }

    async fn remove_from_link_set(&self, key: &str, post_id: &str) -> Result<bool, StoreError> {
        Ok(self.data.lock().await.remove_from_link_set(key, post_id))
    }

    async fn push_error_message_type(
        &self,
        user_id: &str,
        record: ErrorMessageTypeRecord,
    ) -> Result<(), StoreError> {
        self.data.lock().await.push_error_message_type(user_id, record);
        Ok(())
    }

    async fn error_message_types(
        &self,
        user_id: &str,
    ) -> Result<Vec<ErrorMessageTypeRecord>, StoreError> {
        Ok(self.data.lock().await.error_message_types(user_id))
    }

    async fn put_run_log(&self, user_id: &str, id: &str, log: RunLog) -> Result<(), StoreError> {
        self.data.lock().await.put_run_log(user_id, id, log);
        Ok(())
    }

    async fn run_logs(&self, user_id: &str) -> Result<BTreeMap<String, RunLog>, StoreError> {
        Ok(self.data.lock().await.run_logs(user_id))
    }
}
