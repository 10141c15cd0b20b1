//! BullMQ-compatible job runtime: produce/consume jobs against a Redis-
//! backed queue (or an in-memory reference implementation for tests),
//! retrying failures with backoff and quarantining exhausted jobs in a
//! per-queue dead-letter queue.

pub mod backoff;
pub mod client;
pub mod config;
pub mod dlq;
pub mod error;
pub mod job;
pub mod memory;
pub mod redis_client;
pub mod worker;

pub use backoff::BackoffStrategy;
pub use client::{JobHandler, QueueClient};
pub use config::QueueConfig;
pub use dlq::{DlqError, DlqJob};
pub use error::QueueError;
pub use job::{Job, JobData};
pub use memory::InMemoryQueueClient;
pub use redis_client::RedisQueueClient;
pub use worker::WorkerState;
