//! The cascading FSM runner: resolve -> guard -> act -> persist -> cascade.
//! Sole writer of entity state (through the Entity Port).

mod cascade;

use std::hash::Hash;

use tracing::{debug, warn};

use crate::definition::WorkflowDefinition;
use crate::errors::EngineError;
use crate::port::EntityPort;
use crate::registry::ActionRegistry;
use crate::Payload;

/// Binds one `WorkflowDefinition` to one `EntityPort` and exposes the
/// single `emit` operation.
pub struct TransitionEngine<P, Ev>
where
    P: EntityPort,
{
    port: P,
    definition: WorkflowDefinition<P::State, Ev, P::Entity>,
    registry: ActionRegistry<P::State, Ev, P::Entity>,
}

impl<P, Ev> TransitionEngine<P, Ev>
where
    P: EntityPort,
    P::State: Clone + Eq + Hash + std::fmt::Debug + Send + Sync,
    Ev: Clone + Eq + Hash + std::fmt::Debug + Send + Sync,
{
    pub fn new(port: P, definition: WorkflowDefinition<P::State, Ev, P::Entity>) -> Self {
        let registry = ActionRegistry::build(&definition);
        Self { port, definition, registry }
    }

    pub fn definition(&self) -> &WorkflowDefinition<P::State, Ev, P::Entity> {
        &self.definition
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Resolves and runs transitions for `event` on the entity identified
    /// by `urn`, cascading autonomously until an idle or failed state is
    /// reached. See `cascade::run` for the step-by-step algorithm.
    pub fn emit(
        &self,
        event: Ev,
        urn: &str,
        payload: Payload,
    ) -> Result<P::Entity, EngineError> {
        debug!(urn, ?event, "emit");
        let entity = self
            .port
            .load(urn)
            .ok_or_else(|| EngineError::NotFound { urn: urn.to_string() })?;

        let state = self.port.status(&entity);
        if self.definition.finals.contains(&state) {
            warn!(urn, ?state, "re-entering a final state (retry tolerance)");
        }

        cascade::run(self, entity, state, event, payload)
    }
}
