use crate::job::Job;

/// Lifecycle of one `consume`-spawned worker. A job can only be processed
/// while `Running`; `Draining` refuses new jobs but lets in-flight work
/// finish up to a bounded deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    Draining,
    Closed,
}

/// Whether a failed job should be retried or has exhausted its attempts.
/// Shared by both the in-memory and Redis-backed clients so retry/DLQ
/// bookkeeping doesn't drift between the two.
pub(crate) fn is_final_attempt(job: &Job) -> bool {
    job.is_last_attempt()
}
