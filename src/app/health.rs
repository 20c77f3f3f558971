//! Database readiness indicators.
//!
//! Each indicator acquires its own short-lived connection per check and
//! keeps no state between checks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::domain::{ComponentHealth, ConnectionProbe, HealthResponse};

/// Name of the detailed database indicator.
pub const DB_INDICATOR: &str = "db";

/// Name of the readiness indicator.
pub const READINESS_INDICATOR: &str = "databaseReadiness";

/// A named check contributing to the health report.
#[async_trait]
pub trait HealthIndicator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self) -> ComponentHealth;
}

/// Reports whether the database is reachable, with a `database` detail.
pub struct DbHealthIndicator {
    probe: Arc<dyn ConnectionProbe>,
    timeout: Duration,
}

impl DbHealthIndicator {
    #[must_use]
    pub fn new(probe: Arc<dyn ConnectionProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }
}

#[async_trait]
impl HealthIndicator for DbHealthIndicator {
    fn name(&self) -> &'static str {
        DB_INDICATOR
    }

    #[instrument(skip(self))]
    async fn check(&self) -> ComponentHealth {
        match self.probe.validate_connection(self.timeout).await {
            Ok(true) => ComponentHealth::up().with_detail("database", "reachable"),
            Ok(false) => ComponentHealth::down().with_detail("database", "not valid"),
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                ComponentHealth::down().with_detail("error", e.to_string())
            }
        }
    }
}

/// Plain up/down readiness of the database.
pub struct DatabaseReadinessIndicator {
    probe: Arc<dyn ConnectionProbe>,
    timeout: Duration,
}

impl DatabaseReadinessIndicator {
    #[must_use]
    pub fn new(probe: Arc<dyn ConnectionProbe>, timeout: Duration) -> Self {
        Self { probe, timeout }
    }
}

#[async_trait]
impl HealthIndicator for DatabaseReadinessIndicator {
    fn name(&self) -> &'static str {
        READINESS_INDICATOR
    }

    #[instrument(skip(self))]
    async fn check(&self) -> ComponentHealth {
        match self.probe.validate_connection(self.timeout).await {
            Ok(true) => ComponentHealth::up(),
            Ok(false) => ComponentHealth::down(),
            Err(e) => {
                warn!(error = %e, "Database readiness check failed");
                ComponentHealth::down().with_detail("error", e.to_string())
            }
        }
    }
}

/// Ordered set of indicators with a readiness subset.
pub struct HealthRegistry {
    indicators: Vec<Arc<dyn HealthIndicator>>,
    readiness: Vec<&'static str>,
}

impl HealthRegistry {
    /// Registers both database indicators over the same probe.
    #[must_use]
    pub fn for_database(probe: Arc<dyn ConnectionProbe>, timeout: Duration) -> Self {
        Self::new(vec![
            Arc::new(DbHealthIndicator::new(Arc::clone(&probe), timeout)) as Arc<dyn HealthIndicator>,
            Arc::new(DatabaseReadinessIndicator::new(probe, timeout)),
        ])
        .with_readiness(vec![READINESS_INDICATOR])
    }

    #[must_use]
    pub fn new(indicators: Vec<Arc<dyn HealthIndicator>>) -> Self {
        Self {
            indicators,
            readiness: Vec::new(),
        }
    }

    /// Restricts the readiness group to the named indicators.
    #[must_use]
    pub fn with_readiness(mut self, names: Vec<&'static str>) -> Self {
        self.readiness = names;
        self
    }

    /// Runs every indicator.
    pub async fn check_all(&self) -> HealthResponse {
        self.check_matching(|_| true).await
    }

    /// Runs the readiness group, or every indicator if none was configured.
    pub async fn check_readiness(&self) -> HealthResponse {
        if self.readiness.is_empty() {
            return self.check_all().await;
        }
        self.check_matching(|name| self.readiness.iter().any(|r| *r == name))
            .await
    }

    /// Runs a single indicator by name.
    pub async fn check_component(&self, name: &str) -> Option<ComponentHealth> {
        let indicator = self.indicators.iter().find(|i| i.name() == name)?;
        Some(indicator.check().await)
    }

    async fn check_matching(&self, include: impl Fn(&str) -> bool) -> HealthResponse {
        let mut components = BTreeMap::new();
        for indicator in self.indicators.iter().filter(|i| include(i.name())) {
            components.insert(indicator.name().to_string(), indicator.check().await);
        }
        HealthResponse::new(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HealthStatus;
    use crate::test_utils::MockCustomerRepository;

    fn registry_for(repo: &Arc<MockCustomerRepository>) -> HealthRegistry {
        HealthRegistry::for_database(
            Arc::clone(repo) as Arc<dyn ConnectionProbe>,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_db_indicator_up_reports_reachable() {
        let repo = Arc::new(MockCustomerRepository::new());
        let indicator = DbHealthIndicator::new(repo, Duration::from_secs(1));

        let health = indicator.check().await;
        assert_eq!(health.status, HealthStatus::Up);
        assert_eq!(health.details.get("database").unwrap(), "reachable");
    }

    #[tokio::test]
    async fn test_db_indicator_invalid_connection() {
        let repo = Arc::new(MockCustomerRepository::new());
        repo.set_connection_valid(false);
        let indicator = DbHealthIndicator::new(repo, Duration::from_secs(1));

        let health = indicator.check().await;
        assert_eq!(health.status, HealthStatus::Down);
        assert_eq!(health.details.get("database").unwrap(), "not valid");
    }

    #[tokio::test]
    async fn test_readiness_indicator_down_carries_error() {
        let repo = Arc::new(MockCustomerRepository::new());
        repo.set_healthy(false);
        let indicator = DatabaseReadinessIndicator::new(repo, Duration::from_secs(1));

        let health = indicator.check().await;
        assert_eq!(health.status, HealthStatus::Down);
        assert!(health.details.contains_key("error"));
    }

    #[tokio::test]
    async fn test_registry_groups() {
        let repo = Arc::new(MockCustomerRepository::new());
        let registry = registry_for(&repo);

        let all = registry.check_all().await;
        assert_eq!(all.status, HealthStatus::Up);
        assert_eq!(all.components.len(), 2);

        let ready = registry.check_readiness().await;
        assert_eq!(ready.components.len(), 1);
        assert!(ready.components.contains_key(READINESS_INDICATOR));

        repo.set_healthy(false);
        assert_eq!(registry.check_all().await.status, HealthStatus::Down);
        assert_eq!(registry.check_readiness().await.status, HealthStatus::Down);
    }

    #[tokio::test]
    async fn test_registry_single_component() {
        let repo = Arc::new(MockCustomerRepository::new());
        let registry = registry_for(&repo);

        assert!(registry.check_component(DB_INDICATOR).await.is_some());
        assert!(registry.check_component("unknown").await.is_none());
    }
}
