use std::hash::Hash;

use tracing::{debug, error, warn};

use super::TransitionEngine;
use crate::definition::Transition;
use crate::errors::EngineError;
use crate::port::EntityPort;
use crate::Payload;

/// Picks the transition matching `(event, state)` and, among transitions
/// sharing its target state, the first whose guards all hold.
fn select<'a, P, Ev>(
    definition: &'a crate::definition::WorkflowDefinition<P::State, Ev, P::Entity>,
    state: &P::State,
    event: &Ev,
    entity: &P::Entity,
    payload: &Payload,
) -> Result<Option<&'a Transition<P::State, Ev, P::Entity>>, EngineError>
where
    P: EntityPort,
    P::State: Clone + Eq + Hash + std::fmt::Debug,
    Ev: Clone + Eq + Hash + std::fmt::Debug,
{
    let candidates: Vec<&Transition<P::State, Ev, P::Entity>> = definition
        .transitions
        .iter()
        .filter(|t| &t.event == event && t.from.contains(state))
        .collect();

    let Some(first) = candidates.first() else {
        return Err(EngineError::NoTransition { event: format!("{event:?}") });
    };

    let target = first.to.clone();
    let group = candidates.into_iter().filter(|t| t.to == target);

    for t in group {
        if t.conditions.iter().all(|guard| guard(entity, payload)) {
            return Ok(Some(t));
        }
    }

    Ok(None)
}

/// Computes the event to auto-fire next, per step 4.i: the single outgoing
/// transition from `state` (excluding ones leading to `failed_state`), or
/// the first whose guards hold if several exist.
fn next_event<P, Ev>(
    definition: &crate::definition::WorkflowDefinition<P::State, Ev, P::Entity>,
    state: &P::State,
    entity: &P::Entity,
    payload: &Payload,
) -> Option<Ev>
where
    P: EntityPort,
    P::State: Clone + Eq + Hash,
    Ev: Clone + Eq + Hash,
{
    let outgoing: Vec<&Transition<P::State, Ev, P::Entity>> = definition
        .transitions
        .iter()
        .filter(|t| t.from.contains(state) && t.to != definition.failed_state)
        .collect();

    match outgoing.len() {
        0 => None,
        1 => Some(outgoing[0].event.clone()),
        _ => outgoing
            .into_iter()
            .find(|t| t.conditions.iter().all(|guard| guard(entity, payload)))
            .map(|t| t.event.clone()),
    }
}

/// Runs an ordered list of fallible handlers against `entity`, replacing it
/// with each success. Returns `true` if any handler errored.
fn run_handlers<Entity>(
    handlers: &[crate::definition::ActionFn<Entity>],
    entity: &mut Entity,
    payload: &Payload,
    what: &str,
) -> bool {
    for handler in handlers {
        match handler(entity, payload) {
            Ok(updated) => *entity = updated,
            Err(e) => {
                error!(error = %e, kind = what, "handler failed");
                return true;
            }
        }
    }
    false
}

pub(super) fn run<P, Ev>(
    engine: &TransitionEngine<P, Ev>,
    mut entity: P::Entity,
    mut state: P::State,
    event: Ev,
    payload: Payload,
) -> Result<P::Entity, EngineError>
where
    P: EntityPort,
    P::State: Clone + Eq + Hash + std::fmt::Debug + Send + Sync,
    Ev: Clone + Eq + Hash + std::fmt::Debug + Send + Sync,
{
    let mut current_event = event;

    loop {
        let selected = select::<P, Ev>(
            &engine.definition,
            &state,
            &current_event,
            &entity,
            &payload,
        )?;

        let Some(transition) = selected else {
            warn!(?state, ?current_event, "no transition's conditions held");
            return Ok(match &engine.definition.fallback {
                Some(fallback) => fallback(&entity, &current_event, &payload),
                None => entity,
            });
        };

        let from_state = state.clone();

        let event_failed = run_handlers(
            engine.registry.event_handlers(&current_event),
            &mut entity,
            &payload,
            "event",
        );

        let action_failed = !event_failed
            && run_handlers(&transition.actions, &mut entity, &payload, "inline action");

        if event_failed || action_failed {
            entity = engine
                .port
                .update(entity, engine.definition.failed_state.clone())
                .map_err(|e| EngineError::PersistFailed(e.to_string()))?;
            return Ok(entity);
        }

        entity = engine
            .port
            .update(entity, transition.to.clone())
            .map_err(|e| EngineError::PersistFailed(e.to_string()))?;
        state = transition.to.clone();

        let mut status_failed = false;
        for (handler, fail_on_error) in engine.registry.status_handlers(&from_state, &state) {
            match handler(&entity, &payload) {
                Ok(updated) => entity = updated,
                Err(e) if *fail_on_error => {
                    error!(error = %e, "status-change handler failed (fail_on_error)");
                    status_failed = true;
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "status-change handler failed (swallowed)");
                }
            }
        }

        if status_failed {
            entity = engine
                .port
                .update(entity, engine.definition.failed_state.clone())
                .map_err(|e| EngineError::PersistFailed(e.to_string()))?;
            return Ok(entity);
        }

        if engine.definition.idles.contains(&state) || state == engine.definition.failed_state {
            debug!(?state, "cascade stopped: idle or failed");
            return Ok(entity);
        }

        match next_event::<P, Ev>(&engine.definition, &state, &entity, &payload) {
            Some(ev) => current_event = ev,
            None => return Ok(entity),
        }
    }
}
