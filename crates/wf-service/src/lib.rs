//! Binds a `WorkflowDefinition` to a `QueueClient`: spawns one consumer per
//! queue binding and maps incoming jobs to `emit(event, urn, payload)`.
//! Explicit constructor injection; the Queue Client holds no reference back
//! to the Service, only the handler closure passed at `consume`.

mod errors;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use tracing::info;
use wf_core::{EngineError, EntityPort, Payload, TransitionEngine, WorkflowDefinition};
use wf_queue::{JobData, QueueClient};

pub use errors::RegistrationError;

pub struct WorkflowService<P, Ev, Q>
where
    P: EntityPort,
{
    engine: Arc<TransitionEngine<P, Ev>>,
    queue_client: Option<Arc<Q>>,
}

impl<P, Ev, Q> WorkflowService<P, Ev, Q>
where
    P: EntityPort + Send + Sync + 'static,
    P::Entity: Clone + Send + Sync + 'static,
    P::State: Clone + Eq + Hash + std::fmt::Debug + Send + Sync + 'static,
    Ev: Clone + Eq + Hash + std::fmt::Debug + Send + Sync + 'static,
    Q: QueueClient + 'static,
{
    /// Builds the Action Registry and validates registration invariants.
    /// `kafka_enabled` models the symmetric, not-re-specified Kafka
    /// backend: registering it alongside a queue client is an error.
    pub fn new(
        port: P,
        definition: WorkflowDefinition<P::State, Ev, P::Entity>,
        queue_client: Option<Arc<Q>>,
        kafka_enabled: bool,
    ) -> Result<Self, RegistrationError> {
        if queue_client.is_some() && kafka_enabled {
            return Err(RegistrationError::MutualExclusion);
        }

        let mut seen = HashSet::new();
        for binding in &definition.queue_bindings {
            if !seen.insert(binding.queue.clone()) {
                return Err(RegistrationError::DuplicateQueueBinding(binding.queue.clone()));
            }
        }

        let engine = Arc::new(TransitionEngine::new(port, definition));
        Ok(Self { engine, queue_client })
    }

    /// Spawns one consumer per declared queue binding. Each consumer maps a
    /// job to `emit(binding.event, job.data.urn, job.data.payload)` and
    /// re-raises any `emit` error so the queue runtime retries/DLQs it.
    /// `emit`'s own transition to `failed_state` is not a handler-level
    /// error: a successful transition to `failed_state` completes the job.
    pub async fn start(&self) -> Result<(), wf_queue::QueueError> {
        let Some(client) = &self.queue_client else {
            return Ok(());
        };

        for binding in &self.engine.definition().queue_bindings {
            let engine = self.engine.clone();
            let event = binding.event.clone();
            let queue = binding.queue.clone();

            info!(queue = %queue, "starting consumer");

            let handler: wf_queue::JobHandler = Arc::new(move |job| {
                let engine = engine.clone();
                let event = event.clone();
                Box::pin(async move {
                    let JobData { urn, payload } = job.data;
                    let payload: Payload = payload.unwrap_or(Payload::Null);
                    engine
                        .emit(event, &urn, payload)
                        .map(|_| ())
                        .map_err(engine_error_to_queue_error)
                })
            });

            client.consume(&queue, handler).await?;
        }

        Ok(())
    }

    /// Direct synchronous entry point, delegating to the Transition Engine.
    pub fn emit(&self, event: Ev, urn: &str, payload: Payload) -> Result<P::Entity, EngineError> {
        self.engine.emit(event, urn, payload)
    }
}

fn engine_error_to_queue_error(e: EngineError) -> wf_queue::QueueError {
    wf_queue::QueueError::Connection(e.to_string())
}
