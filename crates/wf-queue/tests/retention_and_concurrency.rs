use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wf_queue::{InMemoryQueueClient, JobData, QueueClient, QueueConfig};

fn config_with_retention(remove_on_complete: u32, remove_on_fail: u32) -> QueueConfig {
    let mut config = QueueConfig::new("redis://unused");
    config.default_job_options.remove_on_complete = remove_on_complete;
    config.default_job_options.remove_on_fail = remove_on_fail;
    config
}

#[tokio::test]
async fn remove_on_complete_zero_retains_nothing() {
    let client = Arc::new(InMemoryQueueClient::new(config_with_retention(0, 0)));

    client
        .produce("orders", "start", JobData { urn: "u1".into(), payload: None })
        .await
        .unwrap();

    let handler: wf_queue::JobHandler = Arc::new(|_job| Box::pin(async move { Ok(()) }));
    client.consume("orders", handler).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(client.completed_jobs("orders").await.is_empty());
}

#[tokio::test]
async fn remove_on_complete_caps_retained_jobs() {
    let client = Arc::new(InMemoryQueueClient::new(config_with_retention(2, 0)));

    for i in 0..5 {
        client
            .produce("orders", "start", JobData { urn: format!("u{i}"), payload: None })
            .await
            .unwrap();
    }

    let handler: wf_queue::JobHandler = Arc::new(|_job| Box::pin(async move { Ok(()) }));
    client.consume("orders", handler).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let retained = client.completed_jobs("orders").await;
    assert_eq!(retained.len(), 2);
    // oldest entries are evicted first; the two most recently completed survive.
    assert_eq!(retained[0].data.urn, "u3");
    assert_eq!(retained[1].data.urn, "u4");
}

#[tokio::test]
async fn concurrency_processes_jobs_in_parallel() {
    let mut config = QueueConfig::new("redis://unused").with_concurrency(4);
    config.default_job_options.remove_on_complete = 10;
    let client = Arc::new(InMemoryQueueClient::new(config));

    for i in 0..4 {
        client
            .produce("orders", "start", JobData { urn: format!("u{i}"), payload: None })
            .await
            .unwrap();
    }

    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let in_flight_for_handler = in_flight.clone();
    let max_in_flight_for_handler = max_in_flight.clone();

    let handler: wf_queue::JobHandler = Arc::new(move |_job| {
        let in_flight = in_flight_for_handler.clone();
        let max_in_flight = max_in_flight_for_handler.clone();
        Box::pin(async move {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
    });

    client.consume("orders", handler).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // a single sequential worker could never observe more than one job
    // in flight at a time; `concurrency = 4` should let several overlap.
    assert!(max_in_flight.load(Ordering::SeqCst) > 1);
    assert_eq!(client.completed_jobs("orders").await.len(), 4);
}
