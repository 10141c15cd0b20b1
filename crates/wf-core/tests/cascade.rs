use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use wf_adapters::{InMemoryEntityPort, Order, OrderEvent, OrderState};
use wf_core::{FromSpec, Transition, TransitionEngine, WorkflowDefinition};

fn price_guard() -> wf_core::Guard<Order> {
    Arc::new(|entity: &Order, _payload| entity.price > 10)
}

fn base_definition() -> WorkflowDefinition<OrderState, OrderEvent, Order> {
    let finals = HashSet::from([OrderState::Completed]);
    let idles = HashSet::from([OrderState::Processing]);

    WorkflowDefinition::new(finals, idles, OrderState::Failed).with_transition(Transition {
        from: FromSpec::Single(OrderState::Pending),
        to: OrderState::Processing,
        event: OrderEvent::Submit,
        conditions: vec![price_guard()],
        actions: vec![],
    })
}

#[test]
fn happy_path_single_transition() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 100, status: OrderState::Pending });
    let engine = TransitionEngine::new(port, base_definition());

    let result = engine.emit(OrderEvent::Submit, "u1", json!(null)).unwrap();

    assert_eq!(result.status, OrderState::Processing);
    assert_eq!(engine.port().update_count(), 1);
}

#[test]
fn guard_blocks_transition_no_match_returns_unchanged() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 5, status: OrderState::Pending });
    let engine = TransitionEngine::new(port, base_definition());

    let result = engine.emit(OrderEvent::Submit, "u1", json!(null)).unwrap();

    assert_eq!(result.status, OrderState::Pending);
}

#[test]
fn guard_blocks_transition_does_not_call_update() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 5, status: OrderState::Pending });
    let engine = TransitionEngine::new(port, base_definition());

    engine.emit(OrderEvent::Submit, "u1", json!(null)).unwrap();

    assert_eq!(engine.port().update_count(), 0);
}

#[test]
fn inline_action_failure_transitions_to_failed_state() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 100, status: OrderState::Pending });

    let finals = HashSet::from([OrderState::Completed]);
    let idles = HashSet::from([OrderState::Processing]);
    let definition = WorkflowDefinition::new(finals, idles, OrderState::Failed).with_transition(
        Transition {
            from: FromSpec::Single(OrderState::Pending),
            to: OrderState::Processing,
            event: OrderEvent::Submit,
            conditions: vec![price_guard()],
            actions: vec![Arc::new(|_entity: &Order, _payload| {
                Err("payment gateway unreachable".into())
            })],
        },
    );

    let engine = TransitionEngine::new(port, definition);
    let result = engine.emit(OrderEvent::Submit, "u1", json!(null)).unwrap();

    assert_eq!(result.status, OrderState::Failed);
    assert_eq!(engine.port().update_count(), 1);
}

#[test]
fn cascade_stops_at_idle_state() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 100, status: OrderState::Pending });

    let finals = HashSet::from([OrderState::Completed]);
    let idles = HashSet::from([OrderState::Processing]);
    let definition = WorkflowDefinition::new(finals, idles, OrderState::Failed)
        .with_transition(Transition {
            from: FromSpec::Single(OrderState::Pending),
            to: OrderState::Processing,
            event: OrderEvent::Submit,
            conditions: vec![price_guard()],
            actions: vec![],
        })
        .with_transition(Transition {
            from: FromSpec::Single(OrderState::Processing),
            to: OrderState::Completed,
            event: OrderEvent::Complete,
            conditions: vec![],
            actions: vec![],
        });

    let engine = TransitionEngine::new(port, definition);
    let result = engine.emit(OrderEvent::Submit, "u1", json!(null)).unwrap();

    assert_eq!(result.status, OrderState::Processing);
}

#[test]
fn re_emitting_on_final_state_is_retry_tolerant() {
    let port = InMemoryEntityPort::new();
    port.seed(Order { urn: "u1".into(), price: 100, status: OrderState::Completed });
    let engine = TransitionEngine::new(port, base_definition());

    // `Completed` has no outgoing `Submit` transition, so this raises
    // `NoTransition` rather than panicking or silently resetting state.
    let err = engine.emit(OrderEvent::Submit, "u1", json!(null)).unwrap_err();
    assert!(matches!(err, wf_core::EngineError::NoTransition { .. }));
}

#[test]
fn missing_entity_raises_not_found() {
    let port = InMemoryEntityPort::new();
    let engine = TransitionEngine::new(port, base_definition());

    let err = engine.emit(OrderEvent::Submit, "missing", json!(null)).unwrap_err();

    assert!(matches!(err, wf_core::EngineError::NotFound { .. }));
}
