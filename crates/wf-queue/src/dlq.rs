use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::{Job, JobData};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Wire shape written to `<queue><suffix>` on final-attempt failure. Never
/// auto-removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqJob {
    pub original_job_id: String,
    pub original_job_name: String,
    pub original_data: JobData,
    pub error: DlqError,
    pub failed_at: DateTime<Utc>,
    pub attempts_made: u32,
}

impl DlqJob {
    pub fn from_job(job: &Job, error_message: impl Into<String>) -> Self {
        Self {
            original_job_id: job.id.clone(),
            original_job_name: job.name.clone(),
            original_data: job.data.clone(),
            error: DlqError { message: error_message.into(), stack: None },
            failed_at: Utc::now(),
            attempts_made: job.attempts_made + 1,
        }
    }
}
