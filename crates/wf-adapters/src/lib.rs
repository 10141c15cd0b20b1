//! Example Entity Port implementation and fixtures used by integration
//! tests across the workspace: an in-memory `Order` entity exercising the
//! scenarios used throughout the core and service test suites.

mod order;

pub use order::{InMemoryEntityPort, Order, OrderEvent, OrderState};
