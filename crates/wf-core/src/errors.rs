use thiserror::Error;

/// Error surface of the transition engine. These are the kinds the engine
/// itself raises; action/guard closures raise `ActionError` separately.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("entity not found: {urn}")]
    NotFound { urn: String },

    #[error("no transition declared for event {event:?} from the current state")]
    NoTransition { event: String },

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("update failed: {0}")]
    PersistFailed(String),

    #[error("registration invalid: {0}")]
    RegistrationInvalid(String),

    #[error("internal: {0}")]
    Internal(String),
}

/// Error returned by a guard/inline action/handler closure. Kept separate
/// from `EngineError` since it is produced by user code, not the engine.
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct ActionError(pub String);

impl From<&str> for ActionError {
    fn from(s: &str) -> Self {
        ActionError(s.to_string())
    }
}

impl From<String> for ActionError {
    fn from(s: String) -> Self {
        ActionError(s)
    }
}
