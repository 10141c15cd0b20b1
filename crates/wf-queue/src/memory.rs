use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::client::{JobHandler, QueueClient};
use crate::config::QueueConfig;
use crate::dlq::DlqJob;
use crate::error::QueueError;
use crate::job::{Job, JobData};
use crate::worker::{is_final_attempt, WorkerState};

type JobDeque = Arc<Mutex<VecDeque<Job>>>;

/// Deterministic, in-process `QueueClient` used by tests in place of a real
/// Redis instance. Implements the same retry/backoff/DLQ contract as
/// `RedisQueueClient`, including `concurrency` workers per queue and capped
/// completed/failed job retention.
pub struct InMemoryQueueClient {
    config: QueueConfig,
    queues: Arc<DashMap<String, JobDeque>>,
    completed: Arc<DashMap<String, JobDeque>>,
    failed: Arc<DashMap<String, JobDeque>>,
    dlq: Arc<DashMap<String, Arc<Mutex<Vec<DlqJob>>>>>,
    worker_states: Arc<DashMap<String, WorkerState>>,
    shutting_down: Arc<AtomicBool>,
}

impl InMemoryQueueClient {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            queues: Arc::new(DashMap::new()),
            completed: Arc::new(DashMap::new()),
            failed: Arc::new(DashMap::new()),
            dlq: Arc::new(DashMap::new()),
            worker_states: Arc::new(DashMap::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    fn queue_handle(&self, queue: &str) -> JobDeque {
        Self::handle_in(&self.queues, queue)
    }

    fn handle_in(map: &Arc<DashMap<String, JobDeque>>, queue: &str) -> JobDeque {
        map.entry(queue.to_string()).or_insert_with(|| Arc::new(Mutex::new(VecDeque::new()))).clone()
    }

    fn dlq_name(&self, queue: &str) -> String {
        format!("{queue}{}", self.config.dead_letter_queue.suffix)
    }

    /// Jobs retained in the DLQ for `queue`. Test-only inspection hook.
    pub async fn dlq_jobs(&self, queue: &str) -> Vec<DlqJob> {
        let dlq_queue = self.dlq_name(queue);
        match self.dlq.get(&dlq_queue) {
            Some(jobs) => jobs.lock().await.clone(),
            None => Vec::new(),
        }
    }

    pub fn dlq_queue_exists(&self, queue: &str) -> bool {
        self.dlq.contains_key(&self.dlq_name(queue))
    }

    /// Completed jobs retained for `queue`, capped at `remove_on_complete`.
    /// Test-only inspection hook.
    pub async fn completed_jobs(&self, queue: &str) -> Vec<Job> {
        match self.completed.get(queue) {
            Some(jobs) => jobs.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Failed (retries-exhausted) jobs retained for `queue`, capped at
    /// `remove_on_fail`. Test-only inspection hook.
    pub async fn failed_jobs(&self, queue: &str) -> Vec<Job> {
        match self.failed.get(queue) {
            Some(jobs) => jobs.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }
}

/// Appends `job` to the retained deque for `queue` and evicts the oldest
/// entries beyond `cap`. `cap == 0` retains nothing, matching the
/// Redis-backed client's immediate deletion.
async fn retain(map: &Arc<DashMap<String, JobDeque>>, queue: &str, job: Job, cap: u32) {
    if cap == 0 {
        return;
    }
    let handle = InMemoryQueueClient::handle_in(map, queue);
    let mut deque = handle.lock().await;
    deque.push_back(job);
    while deque.len() as u32 > cap {
        deque.pop_front();
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn produce(
        &self,
        queue: &str,
        job_name: &str,
        data: JobData,
    ) -> Result<String, QueueError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(QueueError::ShuttingDown);
        }

        let id = Job::make_id(job_name, &data.urn, chrono::Utc::now().timestamp_millis());
        let job = Job {
            id: id.clone(),
            name: job_name.to_string(),
            data,
            attempts_made: 0,
            max_attempts: self.config.default_job_options.attempts,
            queue_name: queue.to_string(),
        };

        self.queue_handle(queue).lock().await.push_back(job);
        Ok(id)
    }

    async fn consume(&self, queue: &str, handler: JobHandler) -> Result<(), QueueError> {
        self.worker_states.insert(queue.to_string(), WorkerState::Running);

        let concurrency = self.config.concurrency.max(1);
        for _ in 0..concurrency {
            let handle = self.queue_handle(queue);
            let queue_name = queue.to_string();
            let config = self.config.clone();
            let shutting_down = self.shutting_down.clone();
            let worker_states = self.worker_states.clone();
            let dlq = self.dlq.clone();
            let completed = self.completed.clone();
            let failed = self.failed.clone();
            let dlq_name = self.dlq_name(queue);
            let dlq_enabled = config.dead_letter_queue.enabled;
            let handler = handler.clone();

            tokio::spawn(async move {
                loop {
                    if shutting_down.load(Ordering::SeqCst)
                        && matches!(
                            worker_states.get(&queue_name).map(|s| *s),
                            Some(WorkerState::Draining) | Some(WorkerState::Closed)
                        )
                    {
                        let queue_empty = handle.lock().await.is_empty();
                        if queue_empty {
                            worker_states.insert(queue_name.clone(), WorkerState::Closed);
                            return;
                        }
                    }

                    let job = { handle.lock().await.pop_front() };
                    let Some(mut job) = job else {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        continue;
                    };

                    info!(job_id = %job.id, queue = %queue_name, urn = %job.data.urn, "job start");

                    match handler(job.clone()).await {
                        Ok(()) => {
                            info!(job_id = %job.id, "job completed");
                            retain(
                                &completed,
                                &queue_name,
                                job,
                                config.default_job_options.remove_on_complete,
                            )
                            .await;
                        }
                        Err(e) => {
                            let final_attempt = is_final_attempt(&job);
                            if final_attempt && dlq_enabled {
                                let dlq_job = DlqJob::from_job(&job, e.to_string());
                                dlq.entry(dlq_name.clone())
                                    .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
                                    .lock()
                                    .await
                                    .push(dlq_job);
                                error!(job_id = %job.id, "job exhausted retries, sent to DLQ");
                                retain(
                                    &failed,
                                    &queue_name,
                                    job,
                                    config.default_job_options.remove_on_fail,
                                )
                                .await;
                            } else if final_attempt {
                                error!(job_id = %job.id, "job exhausted retries, DLQ disabled");
                                retain(
                                    &failed,
                                    &queue_name,
                                    job,
                                    config.default_job_options.remove_on_fail,
                                )
                                .await;
                            } else {
                                warn!(job_id = %job.id, error = %e, "job failed, scheduling retry");
                                let delay =
                                    config.default_job_options.backoff.delay_ms(job.attempts_made);
                                job.attempts_made += 1;
                                // capped so test suites using this backend don't block on
                                // real backoff delays; the Redis-backed client honors it in full.
                                tokio::time::sleep(Duration::from_millis(delay.min(50))).await;
                                handle.lock().await.push_back(job);
                            }
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        !self.shutting_down.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> Result<(), QueueError> {
        self.shutting_down.store(true, Ordering::SeqCst);
        for mut state in self.worker_states.iter_mut() {
            if *state == WorkerState::Running {
                *state = WorkerState::Draining;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        for mut state in self.worker_states.iter_mut() {
            *state = WorkerState::Closed;
        }
        Ok(())
    }
}
