use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::QueueError;
use crate::job::{Job, JobData};

/// Per-job processing closure passed to `consume`. Boxed future so both
/// sync and async handler bodies can be expressed uniformly.
pub type JobHandler =
    Arc<dyn Fn(Job) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send>> + Send + Sync>;

/// BullMQ-compatible job runtime contract: produce jobs, consume them with
/// automatic retry/backoff/DLQ handling, probe health, and shut down
/// gracefully.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Submits a job to `queue`, returning the assigned job id.
    async fn produce(
        &self,
        queue: &str,
        job_name: &str,
        data: JobData,
    ) -> Result<String, QueueError>;

    /// Spawns a worker bound to `queue` that invokes `handler` for each job,
    /// retrying with backoff on failure and routing to the DLQ once
    /// attempts are exhausted (if configured).
    async fn consume(&self, queue: &str, handler: JobHandler) -> Result<(), QueueError>;

    /// Pings the backing store. `false` on any connectivity failure.
    async fn is_healthy(&self) -> bool;

    /// Stops accepting new `produce` calls, closes workers (draining
    /// in-flight jobs first), then closes queues. Idempotent.
    async fn shutdown(&self) -> Result<(), QueueError>;
}
