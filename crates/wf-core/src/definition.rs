//! Declarative FSM definition: states, transitions, guards, actions and
//! queue bindings. Built once per workflow registration; read-only
//! thereafter (see `ActionRegistry`).

use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::ActionError;
use crate::Payload;

/// A pure predicate attached to a transition. All of a transition's
/// conditions must hold for it to be selected.
pub type Guard<Entity> = Arc<dyn Fn(&Entity, &Payload) -> bool + Send + Sync>;

/// A transformer that may fail: inline transition actions, event-bound
/// handlers and status-change handlers all share this shape. Takes the
/// entity by reference so a failed call leaves the caller's entity intact.
pub type ActionFn<Entity> =
    Arc<dyn Fn(&Entity, &Payload) -> Result<Entity, ActionError> + Send + Sync>;

/// Fallback invoked when no transition matches. Pure: the engine never
/// calls `update` after it runs.
pub type FallbackFn<Entity, Ev> = Arc<dyn Fn(&Entity, &Ev, &Payload) -> Entity + Send + Sync>;

/// A transition's `from` side: either one state or a membership set.
#[derive(Debug, Clone)]
pub enum FromSpec<S> {
    Single(S),
    Set(Vec<S>),
}

impl<S: PartialEq> FromSpec<S> {
    pub fn contains(&self, state: &S) -> bool {
        match self {
            FromSpec::Single(s) => s == state,
            FromSpec::Set(set) => set.iter().any(|s| s == state),
        }
    }
}

pub struct Transition<S, Ev, Entity> {
    pub from: FromSpec<S>,
    pub to: S,
    pub event: Ev,
    pub conditions: Vec<Guard<Entity>>,
    pub actions: Vec<ActionFn<Entity>>,
}

/// `{ queue, event }` — at most one event per queue; a queue's job triggers
/// exactly one `emit(event, urn, payload)`.
#[derive(Debug, Clone)]
pub struct QueueBinding<Ev> {
    pub queue: String,
    pub event: Ev,
}

/// Immutable workflow configuration consumed by the `TransitionEngine` and
/// indexed once by the `ActionRegistry`.
pub struct WorkflowDefinition<S, Ev, Entity> {
    pub finals: HashSet<S>,
    pub idles: HashSet<S>,
    pub failed_state: S,
    pub transitions: Vec<Transition<S, Ev, Entity>>,
    /// Handlers registered against an Event, run before the transition is
    /// committed. Declaration order is execution order.
    pub event_handlers: Vec<(Ev, ActionFn<Entity>)>,
    /// Handlers registered against a `(from, to)` status change, run after
    /// the new state is persisted. `bool` is `failOnError`.
    pub status_handlers: Vec<((S, S), ActionFn<Entity>, bool)>,
    pub fallback: Option<FallbackFn<Entity, Ev>>,
    pub queue_bindings: Vec<QueueBinding<Ev>>,
}

impl<S, Ev, Entity> WorkflowDefinition<S, Ev, Entity> {
    pub fn new(finals: HashSet<S>, idles: HashSet<S>, failed_state: S) -> Self {
        Self {
            finals,
            idles,
            failed_state,
            transitions: Vec::new(),
            event_handlers: Vec::new(),
            status_handlers: Vec::new(),
            fallback: None,
            queue_bindings: Vec::new(),
        }
    }

    pub fn with_transition(mut self, transition: Transition<S, Ev, Entity>) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn with_event_handler(mut self, event: Ev, handler: ActionFn<Entity>) -> Self {
        self.event_handlers.push((event, handler));
        self
    }

    pub fn with_status_handler(
        mut self,
        from: S,
        to: S,
        handler: ActionFn<Entity>,
        fail_on_error: bool,
    ) -> Self {
        self.status_handlers.push(((from, to), handler, fail_on_error));
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackFn<Entity, Ev>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_queue_binding(mut self, queue: impl Into<String>, event: Ev) -> Self {
        self.queue_bindings.push(QueueBinding { queue: queue.into(), event });
        self
    }
}
