//! Document persistence.
//!
//! The logical collections are
//! `forumLinks[patternKey] = { postIds }`,
//! `errorMessageTypes/{userId}/types[]` and
//! `ideLogs/{userId}/logs/{isoTimestamp}`. Every mutation goes through one
//! [`DocumentStore`] call that the store applies atomically, so concurrent
//! link updates never lose a post id.

use crate::preferences::ErrorMessageTypeRecord;
use crate::run_log::RunLog;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// One `forumLinks` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    #[serde(rename = "postIds", default)]
    pub post_ids: Vec<String>,
}

/// Snapshot of the whole `forumLinks` collection, keyed by pattern key.
pub type ForumLinks = BTreeMap<String, LinkEntry>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn forum_links(&self) -> Result<ForumLinks, StoreError>;

    /// Add `post_id` to the entry for `key`, creating it if needed.
    /// Returns `false` when the id was already there.
    async fn add_to_link_set(&self, key: &str, post_id: &str) -> Result<bool, StoreError>;

    /// Remove `post_id` from the entry for `key`. Returns whether it was
    /// present.
    async fn remove_from_link_set(&self, key: &str, post_id: &str) -> Result<bool, StoreError>;

    async fn push_error_message_type(
        &self,
        user_id: &str,
        record: ErrorMessageTypeRecord,
    ) -> Result<(), StoreError>;

    async fn error_message_types(
        &self,
        user_id: &str,
    ) -> Result<Vec<ErrorMessageTypeRecord>, StoreError>;

    async fn put_run_log(&self, user_id: &str, id: &str, log: RunLog) -> Result<(), StoreError>;

    async fn run_logs(&self, user_id: &str) -> Result<BTreeMap<String, RunLog>, StoreError>;
}

/// Everything a store holds. Both stores mutate this under a lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    #[serde(default)]
    pub forum_links: ForumLinks,
    #[serde(default)]
    pub error_message_types: BTreeMap<String, Vec<ErrorMessageTypeRecord>>,
    #[serde(default)]
    pub ide_logs: BTreeMap<String, BTreeMap<String, RunLog>>,
}

impl StoreData {
    fn add_to_link_set(&mut self, key: &str, post_id: &str) -> bool {
        let entry = self.forum_links.entry(key.to_string()).or_default();
        if entry.post_ids.iter().any(|id| id == post_id) {
            return false;
        }
        entry.post_ids.push(post_id.to_string());
        true
    }

    fn remove_from_link_set(&mut self, key: &str, post_id: &str) -> bool {
        match self.forum_links.get_mut(key) {
            Some(entry) => {
                let before = entry.post_ids.len();
                entry.post_ids.retain(|id| id != post_id);
                entry.post_ids.len() != before
            }
            None => false,
        }
    }

    fn push_error_message_type(&mut self, user_id: &str, record: ErrorMessageTypeRecord) {
        self.error_message_types
            .entry(user_id.to_string())
            .or_default()
            .push(record);
    }

    fn error_message_types(&self, user_id: &str) -> Vec<ErrorMessageTypeRecord> {
        self.error_message_types
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    fn put_run_log(&mut self, user_id: &str, id: &str, log: RunLog) {
        self.ide_logs
            .entry(user_id.to_string())
            .or_default()
            .insert(id.to_string(), log);
    }

    fn run_logs(&self, user_id: &str) -> BTreeMap<String, RunLog> {
        self.ide_logs.get(user_id).cloned().unwrap_or_default()
    }
}
