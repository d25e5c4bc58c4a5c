use crate::store::{DocumentStore, StoreError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// One program run in the IDE, as stored under
/// `ideLogs/{userId}/logs/{isoTimestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLog {
    #[serde(default)]
    pub project_data: Value,
    pub code: String,
    #[serde(default)]
    pub unit_test_results: Value,
    #[serde(default)]
    pub code_run_results: Value,
    pub server_timestamp: DateTime<Utc>,
}

/// Store the results of one run and return the id it was stored under.
pub async fn log_code_run(
    store: &dyn DocumentStore,
    user_id: &str,
    project_data: Value,
    code: &str,
    unit_test_results: Value,
    code_run_results: Value,
) -> Result<String, StoreError> {
    let now = Utc::now();
    let id = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let log = RunLog {
        project_data,
        code: code.to_string(),
        unit_test_results,
        code_run_results,
        server_timestamp: now,
    };

    match store.put_run_log(user_id, &id, log).await {
        Ok(()) => {
            info!(user_id, id = %id, "run log stored");
            Ok(id)
        }
        Err(e) => {
            error!(user_id, "failed to store run log: {}", e);
            Err(e)
        }
    }
}
