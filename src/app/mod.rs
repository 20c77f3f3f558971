//! Application layer containing business logic and shared state.

pub mod health;
pub mod service;
pub mod state;

pub use health::{DatabaseReadinessIndicator, DbHealthIndicator, HealthIndicator, HealthRegistry};
pub use service::CustomerService;
pub use state::AppState;
