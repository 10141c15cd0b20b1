//! Indexes a `WorkflowDefinition`'s declared handlers into the two lookup
//! tables the engine consults during a cascade. Built once at init; never
//! mutated afterward.

use std::collections::HashMap;
use std::hash::Hash;

use crate::definition::{ActionFn, WorkflowDefinition};

pub struct ActionRegistry<S, Ev, Entity> {
    event_table: HashMap<Ev, Vec<ActionFn<Entity>>>,
    status_table: HashMap<(S, S), Vec<(ActionFn<Entity>, bool)>>,
}

impl<S, Ev, Entity> ActionRegistry<S, Ev, Entity>
where
    S: Clone + Eq + Hash,
    Ev: Clone + Eq + Hash,
{
    /// Scans the definition's declared handlers and indexes them,
    /// preserving declaration order within each bucket.
    pub fn build(definition: &WorkflowDefinition<S, Ev, Entity>) -> Self {
        let mut event_table: HashMap<Ev, Vec<ActionFn<Entity>>> = HashMap::new();
        for (event, handler) in &definition.event_handlers {
            event_table.entry(event.clone()).or_default().push(handler.clone());
        }

        let mut status_table: HashMap<(S, S), Vec<(ActionFn<Entity>, bool)>> = HashMap::new();
        for ((from, to), handler, fail_on_error) in &definition.status_handlers {
            status_table
                .entry((from.clone(), to.clone()))
                .or_default()
                .push((handler.clone(), *fail_on_error));
        }

        Self { event_table, status_table }
    }

    pub fn event_handlers(&self, event: &Ev) -> &[ActionFn<Entity>] {
        self.event_table.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn status_handlers(&self, from: &S, to: &S) -> &[(ActionFn<Entity>, bool)] {
        self.status_table
            .get(&(from.clone(), to.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
