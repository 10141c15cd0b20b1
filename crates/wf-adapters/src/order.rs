use std::collections::HashMap;
use std::sync::Mutex;

use wf_core::{EngineError, EntityPort};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderState {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderEvent {
    Submit,
    Complete,
    Start,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub urn: String,
    pub price: i64,
    pub status: OrderState,
}

/// Volatile, unsynchronized-across-process reference `EntityPort`. Useful
/// for tests; a real embedding would back `load`/`update` with a database.
pub struct InMemoryEntityPort {
    entities: Mutex<HashMap<String, Order>>,
    update_calls: Mutex<usize>,
}

impl InMemoryEntityPort {
    pub fn new() -> Self {
        Self { entities: Mutex::new(HashMap::new()), update_calls: Mutex::new(0) }
    }

    pub fn seed(&self, order: Order) {
        self.entities.lock().unwrap().insert(order.urn.clone(), order);
    }

    /// Number of times `update` has been called. Test-only instrumentation
    /// for asserting the engine's persist-at-most-once invariants.
    pub fn update_count(&self) -> usize {
        *self.update_calls.lock().unwrap()
    }
}

impl Default for InMemoryEntityPort {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityPort for InMemoryEntityPort {
    type Entity = Order;
    type State = OrderState;

    fn load(&self, urn: &str) -> Option<Order> {
        self.entities.lock().unwrap().get(urn).cloned()
    }

    fn status(&self, entity: &Order) -> OrderState {
        entity.status.clone()
    }

    fn update(&self, mut entity: Order, state: OrderState) -> Result<Order, EngineError> {
        entity.status = state;
        self.entities
            .lock()
            .unwrap()
            .insert(entity.urn.clone(), entity.clone());
        *self.update_calls.lock().unwrap() += 1;
        Ok(entity)
    }

    fn urn(&self, entity: &Order) -> String {
        entity.urn.clone()
    }
}
