/// Contract consumed by the transition engine for one entity type.
///
/// The engine never mutates an entity's fields directly; all mutation goes
/// through `update`, and `update`'s return value is what the engine keeps
/// using for the remainder of the cascade.
pub trait EntityPort {
    type Entity;
    type State: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync;

    /// Loads the entity identified by `urn`, or `None` if it doesn't exist.
    fn load(&self, urn: &str) -> Option<Self::Entity>;

    /// Reads the entity's current state. Pure, no side effects.
    fn status(&self, entity: &Self::Entity) -> Self::State;

    /// Persists `state` on `entity` and returns the updated entity. The
    /// engine treats this as the sole writer of state.
    fn update(
        &self,
        entity: Self::Entity,
        state: Self::State,
    ) -> Result<Self::Entity, crate::errors::EngineError>;

    /// Identifier used only for logging/correlation.
    fn urn(&self, entity: &Self::Entity) -> String;
}
