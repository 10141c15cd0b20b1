use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to submit job to queue {queue}: {source}")]
    Submit { queue: String, source: String },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("queue client is shutting down, new jobs are rejected")]
    ShuttingDown,
}

impl From<redis::RedisError> for QueueError {
    fn from(e: redis::RedisError) -> Self {
        QueueError::Connection(e.to_string())
    }
}
