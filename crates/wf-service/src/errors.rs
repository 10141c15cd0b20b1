use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("a workflow cannot register both a queue backend and a Kafka backend")]
    MutualExclusion,

    #[error("queue name '{0}' is bound more than once in this workflow")]
    DuplicateQueueBinding(String),
}
