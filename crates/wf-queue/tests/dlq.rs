use std::sync::Arc;
use std::time::Duration;

use wf_queue::{InMemoryQueueClient, JobData, QueueClient, QueueConfig};

fn fast_config(dlq_enabled: bool) -> QueueConfig {
    QueueConfig::new("redis://unused")
        .with_dlq(dlq_enabled, "-dlq")
}

#[tokio::test]
async fn dlq_receives_job_after_retries_exhausted() {
    let client = Arc::new(InMemoryQueueClient::new(fast_config(true)));

    client
        .produce("orders", "start", JobData { urn: "u1".into(), payload: None })
        .await
        .unwrap();

    let handler: wf_queue::JobHandler = Arc::new(|_job| {
        Box::pin(async move { Err(wf_queue::QueueError::Connection("boom".into())) })
    });

    client.consume("orders", handler).await.unwrap();

    // default attempts = 3; give the worker time to exhaust retries with
    // the backoff delay capped at 50ms per attempt in the in-memory client.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let dlq = client.dlq_jobs("orders").await;
    assert_eq!(dlq.len(), 1);
    assert_eq!(dlq[0].original_data.urn, "u1");
    assert_eq!(dlq[0].attempts_made, 3);
    assert!(dlq[0].error.message.contains("boom"));
}

#[tokio::test]
async fn dlq_disabled_never_creates_dlq_queue() {
    let client = Arc::new(InMemoryQueueClient::new(fast_config(false)));

    client
        .produce("orders", "start", JobData { urn: "u1".into(), payload: None })
        .await
        .unwrap();

    let handler: wf_queue::JobHandler = Arc::new(|_job| {
        Box::pin(async move { Err(wf_queue::QueueError::Connection("boom".into())) })
    });

    client.consume("orders", handler).await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!client.dlq_queue_exists("orders"));
    assert!(client.dlq_jobs("orders").await.is_empty());
}

#[tokio::test]
async fn shutdown_rejects_new_produce_calls() {
    let client = InMemoryQueueClient::new(fast_config(false));
    client.shutdown().await.unwrap();

    let result = client
        .produce("orders", "start", JobData { urn: "u1".into(), payload: None })
        .await;

    assert!(matches!(result, Err(wf_queue::QueueError::ShuttingDown)));
}
