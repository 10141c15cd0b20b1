use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{error, info, warn};

use crate::client::{JobHandler, QueueClient};
use crate::config::QueueConfig;
use crate::dlq::DlqJob;
use crate::error::QueueError;
use crate::job::{Job, JobData};
use crate::worker::{is_final_attempt, WorkerState};

fn pending_key(queue: &str) -> String {
    format!("{queue}:pending")
}

fn job_key(queue: &str, id: &str) -> String {
    format!("{queue}:job:{id}")
}

fn dlq_key(queue: &str, id: &str) -> String {
    format!("{queue}:dlq-job:{id}")
}

fn retained_key(queue: &str, kind: &str) -> String {
    format!("{queue}:{kind}")
}

/// Redis-backed `QueueClient`. Key layout: job ids live in a
/// `{queue}:pending` list (LPUSH by producers, BRPOP by workers for FIFO
/// order), the serialized job body lives at `{queue}:job:{id}`, and DLQ
/// jobs live permanently under `<queue><suffix>:pending` /
/// `<queue><suffix>:dlq-job:{id}`. Completed/failed job ids are indexed
/// under `{queue}:completed` / `{queue}:failed`, capped at
/// `remove_on_complete` / `remove_on_fail` entries; bodies for evicted ids
/// are deleted.
pub struct RedisQueueClient {
    config: QueueConfig,
    connection: MultiplexedConnection,
    worker_states: Arc<DashMap<String, WorkerState>>,
    shutting_down: Arc<AtomicBool>,
}

impl RedisQueueClient {
    pub async fn connect(config: QueueConfig) -> Result<Self, QueueError> {
        let client = redis::Client::open(config.connection.url.clone())?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            config,
            connection,
            worker_states: Arc::new(DashMap::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    fn dlq_queue_name(&self, queue: &str) -> String {
        format!("{queue}{}", self.config.dead_letter_queue.suffix)
    }
}

/// Retires `id`'s job body per the `remove_on_complete`/`remove_on_fail`
/// retention count: `retain == 0` deletes it immediately (matching BullMQ's
/// `removeOn* = true`), otherwise the id is indexed under `queue:kind` and
/// bodies for ids evicted past `retain` are deleted.
async fn retire(
    conn: &mut MultiplexedConnection,
    queue: &str,
    kind: &str,
    id: &str,
    retain: u32,
) -> Result<(), QueueError> {
    if retain == 0 {
        let _: () = conn.del(job_key(queue, id)).await?;
        return Ok(());
    }

    let list_key = retained_key(queue, kind);
    let _: () = conn.lpush(&list_key, id).await?;
    let evicted: Vec<String> = conn.lrange(&list_key, retain as isize, -1).await?;
    for stale_id in &evicted {
        let _: Result<(), _> = conn.del(job_key(queue, stale_id)).await;
    }
    let _: () = conn.ltrim(&list_key, 0, retain as isize - 1).await?;
    Ok(())
}

#[async_trait]
impl QueueClient for RedisQueueClient {
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

        let body = serde_json::to_string(&job)?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .set(job_key(queue, &id), body)
            .await
            .map_err(|e| QueueError::Submit { queue: queue.to_string(), source: e.to_string() })?;
        let _: () = conn
            .lpush(pending_key(queue), &id)
            .await
            .map_err(|e| QueueError::Submit { queue: queue.to_string(), source: e.to_string() })?;

        Ok(id)
    }

    async fn consume(&self, queue: &str, handler: JobHandler) -> Result<(), QueueError> {
        self.worker_states.insert(queue.to_string(), WorkerState::Running);

        let concurrency = self.config.concurrency.max(1);
        for _ in 0..concurrency {
            let mut conn = self.connection.clone();
            let queue_name = queue.to_string();
            let config = self.config.clone();
            let shutting_down = self.shutting_down.clone();
            let worker_states = self.worker_states.clone();
            let dlq_queue = self.dlq_queue_name(queue);
            let dlq_enabled = config.dead_letter_queue.enabled;
            let handler = handler.clone();

            tokio::spawn(async move {
                loop {
                    let draining = matches!(
                        worker_states.get(&queue_name).map(|s| *s),
                        Some(WorkerState::Draining) | Some(WorkerState::Closed)
                    );
                    if shutting_down.load(Ordering::SeqCst) && draining {
                        worker_states.insert(queue_name.clone(), WorkerState::Closed);
                        return;
                    }

                    let popped: Option<(String, String)> =
                        match conn.brpop(pending_key(&queue_name), 1.0).await {
                            Ok(v) => v,
                            Err(e) => {
                                error!(error = %e, "redis brpop failed");
                                tokio::time::sleep(Duration::from_millis(200)).await;
                                continue;
                            }
                        };

                    let Some((_, id)) = popped else { continue };

                    let body: Option<String> = match conn.get(job_key(&queue_name, &id)).await {
                        Ok(v) => v,
                        Err(e) => {
                            error!(error = %e, job_id = %id, "failed to load job body");
                            continue;
                        }
                    };
                    let Some(body) = body else { continue };
                    let mut job: Job = match serde_json::from_str(&body) {
                        Ok(j) => j,
                        Err(e) => {
                            error!(error = %e, job_id = %id, "failed to deserialize job");
                            continue;
                        }
                    };

                    info!(job_id = %job.id, queue = %queue_name, urn = %job.data.urn, "job start");

                    match handler(job.clone()).await {
                        Ok(()) => {
                            info!(job_id = %job.id, "job completed");
                            if let Err(e) = retire(
                                &mut conn,
                                &queue_name,
                                "completed",
                                &job.id,
                                config.default_job_options.remove_on_complete,
                            )
                            .await
                            {
                                error!(error = %e, job_id = %job.id, "completed-job retention failed");
                            }
                        }
                        Err(e) => {
                            let final_attempt = is_final_attempt(&job);
                            if final_attempt && dlq_enabled {
                                let dlq_job = DlqJob::from_job(&job, e.to_string());
                                if let Err(write_err) =
                                    write_dlq(&mut conn, &dlq_queue, &job.id, &dlq_job).await
                                {
                                    error!(error = %write_err, job_id = %job.id, "DLQ write failed");
                                } else {
                                    warn!(job_id = %job.id, "job exhausted retries, sent to DLQ");
                                }
                                if let Err(e) = retire(
                                    &mut conn,
                                    &queue_name,
                                    "failed",
                                    &job.id,
                                    config.default_job_options.remove_on_fail,
                                )
                                .await
                                {
                                    error!(error = %e, job_id = %job.id, "failed-job retention failed");
                                }
                            } else if final_attempt {
                                error!(job_id = %job.id, "job exhausted retries, DLQ disabled");
                                if let Err(e) = retire(
                                    &mut conn,
                                    &queue_name,
                                    "failed",
                                    &job.id,
                                    config.default_job_options.remove_on_fail,
                                )
                                .await
                                {
                                    error!(error = %e, job_id = %job.id, "failed-job retention failed");
                                }
                            } else {
                                warn!(job_id = %job.id, error = %e, "job failed, scheduling retry");
                                let delay =
                                    config.default_job_options.backoff.delay_ms(job.attempts_made);
                                job.attempts_made += 1;
                                if let Ok(body) = serde_json::to_string(&job) {
                                    let _: Result<(), _> =
                                        conn.set(job_key(&queue_name, &job.id), body).await;
                                }
                                tokio::time::sleep(Duration::from_millis(delay.min(250))).await;
                                let _: Result<(), _> =
                                    conn.lpush(pending_key(&queue_name), &job.id).await;
                            }
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        let mut conn = self.connection.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await.is_ok()
    }

    async fn shutdown(&self) -> Result<(), QueueError> {
        self.shutting_down.store(true, Ordering::SeqCst);
        for mut state in self.worker_states.iter_mut() {
            if *state == WorkerState::Running {
                *state = WorkerState::Draining;
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        for mut state in self.worker_states.iter_mut() {
            *state = WorkerState::Closed;
        }
        Ok(())
    }
}

async fn write_dlq(
    conn: &mut MultiplexedConnection,
    dlq_queue: &str,
    id: &str,
    dlq_job: &DlqJob,
) -> Result<(), QueueError> {
    let body = serde_json::to_string(dlq_job)?;
    let _: () = conn.set(dlq_key(dlq_queue, id), body).await?;
    let _: () = conn.lpush(pending_key(dlq_queue), id).await?;
    Ok(())
}
