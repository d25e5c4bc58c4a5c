//! Which explanation strategy each student sees.
//!
//! Every change appends a record; the latest record wins. Records carry
//! two timestamps: the legacy client-side ISO string and the newer server
//! timestamp. Old records only have the former, so ordering prefers
//! `timestamp_v2` and falls back to `timestamp`. Once every stored record
//! has `timestamp_v2` the legacy field can go.

use crate::store::{DocumentStore, StoreError};
use crate::strategy::StrategyKind;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessageTypeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_v2: Option<DateTime<Utc>>,
}

/// Sort key for preference records. Any record with a server timestamp is
/// newer than every record without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderingKey {
    Legacy(Option<DateTime<Utc>>),
    Current(DateTime<Utc>),
}

impl ErrorMessageTypeRecord {
    pub fn new(kind: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            timestamp: Some(now.to_rfc3339()),
            timestamp_v2: Some(now),
        }
    }

    pub fn ordering_key(&self) -> OrderingKey {
        match self.timestamp_v2 {
            Some(ts) => OrderingKey::Current(ts),
            None => OrderingKey::Legacy(
                self.timestamp
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .map(|ts| ts.with_timezone(&Utc)),
            ),
        }
    }
}

/// The record that decides a user's current strategy.
pub fn latest(records: &[ErrorMessageTypeRecord]) -> Option<&ErrorMessageTypeRecord> {
    records.iter().max_by_key(|record| record.ordering_key())
}

pub struct Preferences {
    store: Arc<dyn DocumentStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn set_error_message_type(&self, user_id: &str, kind: &str) -> Result<(), StoreError> {
        info!(user_id, kind, "storing error message type");
        self.store
            .push_error_message_type(user_id, ErrorMessageTypeRecord::new(kind, Utc::now()))
            .await
    }

    /// The user's current strategy id, or an empty string when none is set.
    pub async fn get_error_message_type(&self, user_id: &str) -> Result<String, StoreError> {
        let records = self.store.error_message_types(user_id).await?;
        Ok(latest(&records)
            .map(|record| record.kind.clone())
            .unwrap_or_default())
    }

    /// Like [`Self::get_error_message_type`], but a user without a stored
    /// strategy is assigned a random one, which is stored.
    pub async fn init_selected_error_message_type(&self, user_id: &str) -> Result<String, StoreError> {
        let current = self.get_error_message_type(user_id).await?;
        if !current.is_empty() {
            return Ok(current);
        }

        let kind = StrategyKind::ASSIGNABLE
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default();
        self.set_error_message_type(user_id, kind.id()).await?;
        Ok(kind.id().to_string())
    }
}
