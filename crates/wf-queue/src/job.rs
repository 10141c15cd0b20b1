use serde::{Deserialize, Serialize};

/// Wire shape of a job's payload: `{ "urn": "...", "payload": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobData {
    pub urn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// A job as handed to a worker's handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub data: JobData,
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub queue_name: String,
}

impl Job {
    /// `{jobName}-{urn}-{epoch_ms}`, matching the stable-ish id scheme
    /// `produce` assigns so jobs are traceable across retries.
    pub fn make_id(job_name: &str, urn: &str, epoch_ms: i64) -> String {
        format!("{job_name}-{urn}-{epoch_ms}")
    }

    pub fn is_last_attempt(&self) -> bool {
        self.attempts_made + 1 >= self.max_attempts
    }
}
