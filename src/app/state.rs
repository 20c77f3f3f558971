//! Application state management.
//!
//! This module provides the shared application state that is
//! accessible to all request handlers via Axum's State extractor.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ConnectionProbe, CustomerRepository};
use crate::infra::PrometheusHandle;

use super::health::HealthRegistry;
use super::service::CustomerService;

/// Default time allowed for a readiness probe to validate a connection.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Shared application state for the Axum web server.
///
/// This is the composition root: the repository is injected into the
/// service, the probe into the health registry, and the whole state into
/// the router.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
///
/// let db = Arc::new(PostgresClient::with_defaults(&database_url).await?);
/// let state = AppState::new(db.clone(), db);
///
/// let router = create_router(Arc::new(state));
/// ```
#[derive(Clone)]
pub struct AppState {
    /// The customer use cases.
    pub service: Arc<CustomerService>,

    /// Database readiness indicators.
    pub health: Arc<HealthRegistry>,

    /// Prometheus scrape handle, when the recorder is installed.
    pub metrics: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    /// Creates a new `AppState`, wiring the service and health checks.
    ///
    /// # Arguments
    ///
    /// * `repository` - Customer persistence implementation.
    /// * `probe` - Connection probe used by the readiness indicators.
    #[must_use]
    pub fn new(repository: Arc<dyn CustomerRepository>, probe: Arc<dyn ConnectionProbe>) -> Self {
        Self::with_probe_timeout(repository, probe, DEFAULT_PROBE_TIMEOUT)
    }

    /// Same as [`AppState::new`] with a custom probe validation timeout.
    #[must_use]
    pub fn with_probe_timeout(
        repository: Arc<dyn CustomerRepository>,
        probe: Arc<dyn ConnectionProbe>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            service: Arc::new(CustomerService::new(repository)),
            health: Arc::new(HealthRegistry::for_database(probe, probe_timeout)),
            metrics: None,
        }
    }

    /// Attaches the Prometheus handle rendered at `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<Arc<PrometheusHandle>>) -> Self {
        self.metrics = handle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockCustomerRepository;

    #[test]
    fn test_app_state_creation() {
        let repo = Arc::new(MockCustomerRepository::new());

        let state = AppState::new(repo.clone(), repo);

        assert!(Arc::strong_count(&state.service) >= 1);
        assert!(state.metrics.is_none());
    }

    #[test]
    fn test_app_state_is_clone() {
        let repo = Arc::new(MockCustomerRepository::new());

        let state = AppState::new(repo.clone(), repo);
        let cloned = state.clone();

        // Both should point to the same service
        assert!(Arc::ptr_eq(&state.service, &cloned.service));
        assert!(Arc::ptr_eq(&state.health, &cloned.health));
    }
}
