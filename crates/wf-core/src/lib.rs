//! Reusable workflow execution engine: a declarative, guarded finite-state
//! machine that drives an external entity through transitions in response
//! to events, cascading autonomously until it reaches an idle or failed
//! state.

pub mod definition;
pub mod engine;
pub mod errors;
pub mod port;
pub mod registry;

pub use definition::{
    ActionFn, FromSpec, Guard, QueueBinding, Transition, WorkflowDefinition,
};
pub use engine::TransitionEngine;
pub use errors::{ActionError, EngineError};
pub use port::EntityPort;
pub use registry::ActionRegistry;

/// Opaque payload carried between caller and actions/guards. The engine
/// never inspects its shape.
pub type Payload = serde_json::Value;
