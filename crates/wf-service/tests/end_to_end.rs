use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wf_adapters::{InMemoryEntityPort, Order, OrderEvent, OrderState};
use wf_core::{FromSpec, Transition, WorkflowDefinition};
use wf_queue::{InMemoryQueueClient, JobData, QueueConfig, QueueClient};
use wf_service::WorkflowService;

fn definition() -> WorkflowDefinition<OrderState, OrderEvent, Order> {
    let finals = HashSet::from([OrderState::Completed]);
    let idles = HashSet::from([OrderState::Processing]);
    WorkflowDefinition::new(finals, idles, OrderState::Failed)
        .with_transition(Transition {
            from: FromSpec::Single(OrderState::Pending),
            to: OrderState::Processing,
            event: OrderEvent::Submit,
            conditions: vec![],
            actions: vec![],
        })
        .with_queue_binding("orders", OrderEvent::Submit)
}

#[tokio::test]
async fn job_on_bound_queue_cascades_through_the_engine() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 100, status: OrderState::Pending });

    let client = Arc::new(InMemoryQueueClient::new(QueueConfig::new("redis://unused")));
    let service = WorkflowService::new(port, definition(), Some(client.clone()), false).unwrap();

    service.start().await.unwrap();
    client
        .produce("orders", "submit-order", JobData { urn: "u1".into(), payload: Some(json!(null)) })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = service.emit(OrderEvent::Submit, "u1", json!(null));
    // `u1` already cascaded to `Processing` by the consumer; `Processing`
    // has no outgoing `Submit` transition, so a second emit is rejected
    // rather than silently re-applying the job.
    assert!(matches!(result, Err(wf_core::EngineError::NoTransition { .. })));
}
