use std::env;

use once_cell::sync::Lazy;

use crate::backoff::BackoffStrategy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    dotenvy::dotenv().ok();
});

#[derive(Debug, Clone)]
pub struct RedisConnection {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct DefaultJobOptions {
    pub attempts: u32,
    pub backoff: BackoffStrategy,
    pub remove_on_complete: u32,
    pub remove_on_fail: u32,
}

impl Default for DefaultJobOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: BackoffStrategy::default(),
            remove_on_complete: 1000,
            remove_on_fail: 5000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeadLetterQueueConfig {
    pub enabled: bool,
    pub suffix: String,
}

impl Default for DeadLetterQueueConfig {
    fn default() -> Self {
        Self { enabled: false, suffix: "-dlq".to_string() }
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub connection: RedisConnection,
    pub default_job_options: DefaultJobOptions,
    pub dead_letter_queue: DeadLetterQueueConfig,
    /// Jobs processed concurrently per worker. Global, not per-binding
    /// (source uses defaults only; see DESIGN.md open question 4).
    pub concurrency: usize,
}

impl QueueConfig {
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            connection: RedisConnection { url: redis_url.into() },
            default_job_options: DefaultJobOptions::default(),
            dead_letter_queue: DeadLetterQueueConfig::default(),
            concurrency: 1,
        }
    }

    pub fn with_dlq(mut self, enabled: bool, suffix: impl Into<String>) -> Self {
        self.dead_letter_queue = DeadLetterQueueConfig { enabled, suffix: suffix.into() };
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Loads configuration from the environment, following the same
    /// lazy-dotenv-then-`env::var` pattern used for database config
    /// elsewhere in this workspace's lineage.
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);

        let url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let attempts = env::var("QUEUE_DEFAULT_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let backoff_delay_ms = env::var("QUEUE_DEFAULT_BACKOFF_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000);

        let backoff = match env::var("QUEUE_DEFAULT_BACKOFF_TYPE").as_deref() {
            Ok("fixed") => BackoffStrategy::Fixed { delay_ms: backoff_delay_ms },
            _ => BackoffStrategy::Exponential { delay_ms: backoff_delay_ms },
        };

        let remove_on_complete = env::var("QUEUE_REMOVE_ON_COMPLETE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);

        let remove_on_fail = env::var("QUEUE_REMOVE_ON_FAIL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let dlq_enabled = env::var("QUEUE_DLQ_ENABLED")
            .ok()
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let dlq_suffix = env::var("QUEUE_DLQ_SUFFIX").unwrap_or_else(|_| "-dlq".to_string());

        Self {
            connection: RedisConnection { url },
            default_job_options: DefaultJobOptions {
                attempts,
                backoff,
                remove_on_complete,
                remove_on_fail,
            },
            dead_letter_queue: DeadLetterQueueConfig { enabled: dlq_enabled, suffix: dlq_suffix },
            concurrency: 1,
        }
    }
}
