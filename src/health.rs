//! Health aggregation across service dependencies.
//!
//! A [`HealthAggregator`] owns a fixed list of probes (database, cache and,
//! optionally, registered providers), runs them concurrently under a deadline
//! and folds the outcomes into a [`HealthReport`]. Checking never fails; a
//! failing dependency shows up as `degraded`.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::HealthConfig;
use crate::deadline::Deadline;
use crate::error::BoxError;
use crate::provider::Provider;
use crate::registry::Registry;

/// A bounded-time liveness check against one dependency.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Dependency name as it appears in the report.
    fn name(&self) -> &str;

    /// Returns `Ok(())` when the dependency is reachable.
    async fn probe(&self) -> Result<(), BoxError>;
}

/// Probe backed by a closure, for wrapping client pings.
///
/// ```rust
/// use stash_core::{BoxError, FnProbe, HealthProbe};
///
/// let probe = FnProbe::new("redis", || async { Ok::<(), BoxError>(()) });
/// assert_eq!(probe.name(), "redis");
/// ```
pub struct FnProbe<F> {
    name: String,
    check: F,
}

impl<F> FnProbe<F> {
    /// Wrap `check` as the probe for dependency `name`.
    pub fn new(name: impl Into<String>, check: F) -> Self {
        Self {
            name: name.into(),
            check,
        }
    }
}

#[async_trait]
impl<F, Fut> HealthProbe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<(), BoxError> {
        (self.check)().await
    }
}

/// Probe that resolves a provider from its registry at check time and calls
/// its `health_check`.
///
/// Resolution happens on every probe, so a missing provider is reported as
/// unhealthy rather than failing construction.
pub struct ProviderProbe<T: ?Sized> {
    label: String,
    registry: Arc<Registry<T>>,
    provider: String,
}

impl<T: ?Sized + Provider> ProviderProbe<T> {
    /// The dependency is labelled `<category>:<provider>`.
    pub fn new(registry: Arc<Registry<T>>, provider: impl Into<String>) -> Self {
        let provider = provider.into();
        Self {
            label: format!("{}:{}", registry.category(), provider),
            registry,
            provider,
        }
    }
}

#[async_trait]
impl<T: ?Sized + Provider + 'static> HealthProbe for ProviderProbe<T> {
    fn name(&self) -> &str {
        &self.label
    }

    async fn probe(&self) -> Result<(), BoxError> {
        // The handle is cloned out of the registry; no lock is held while probing.
        let provider = self.registry.get(&self.provider)?;
        provider.health_check().await?;
        Ok(())
    }
}

/// Aggregate service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Ok,
    Degraded,
}

/// Status of a single dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    Healthy,
    Unhealthy,
}

/// Result of one health check.
///
/// Serializes flat: `{"status": "ok", "database": "healthy", "redis": "healthy"}`.
/// A dependency literally named `status` is keyed as `dependency:status` so it
/// cannot shadow the overall status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    #[serde(flatten)]
    pub dependencies: BTreeMap<String, DependencyStatus>,
}

/// Top-level key holding the overall status.
const STATUS_KEY: &str = "status";

fn dependency_key(name: String) -> String {
    if name == STATUS_KEY {
        format!("dependency:{name}")
    } else {
        name
    }
}

impl HealthReport {
    /// Fold per-dependency outcomes into a report.
    ///
    /// A name reported more than once is unhealthy if any occurrence is.
    pub fn from_outcomes<I, S>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (S, DependencyStatus)>,
        S: Into<String>,
    {
        let mut dependencies = BTreeMap::new();
        for (name, status) in outcomes {
            dependencies
                .entry(dependency_key(name.into()))
                .and_modify(|existing| {
                    if status == DependencyStatus::Unhealthy {
                        *existing = DependencyStatus::Unhealthy;
                    }
                })
                .or_insert(status);
        }

        let status = if dependencies
            .values()
            .all(|s| *s == DependencyStatus::Healthy)
        {
            OverallStatus::Ok
        } else {
            OverallStatus::Degraded
        };

        Self {
            status,
            dependencies,
        }
    }

    /// True when every dependency is healthy.
    pub fn is_ok(&self) -> bool {
        self.status == OverallStatus::Ok
    }

    /// HTTP status for the health endpoint: 200 when ok, 503 when degraded.
    pub fn status_code(&self) -> u16 {
        match self.status {
            OverallStatus::Ok => 200,
            OverallStatus::Degraded => 503,
        }
    }

    /// Status recorded for the dependency registered as `name`.
    pub fn dependency(&self, name: &str) -> Option<DependencyStatus> {
        self.dependencies
            .get(&dependency_key(name.to_string()))
            .copied()
    }

    /// Serialize as the health endpoint body.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Runs every registered probe and combines the results.
pub struct HealthAggregator {
    probes: Vec<Arc<dyn HealthProbe>>,
    probe_timeout: Duration,
}

impl HealthAggregator {
    /// Create an aggregator with no probes.
    pub fn new(probe_timeout: Duration) -> Self {
        Self {
            probes: Vec::new(),
            probe_timeout,
        }
    }

    /// Create an aggregator using the configured probe timeout.
    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(config.probe_timeout())
    }

    /// Add a probe (builder style).
    pub fn with_probe(mut self, probe: impl HealthProbe + 'static) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    /// Add several shared probes (builder style).
    pub fn with_probes(mut self, probes: impl IntoIterator<Item = Arc<dyn HealthProbe>>) -> Self {
        self.probes.extend(probes);
        self
    }

    /// Add a shared probe.
    pub fn add_probe(&mut self, probe: Arc<dyn HealthProbe>) {
        self.probes.push(probe);
    }

    /// Names of the registered probes, in registration order.
    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Upper bound applied to each probe.
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Check all dependencies, each bounded by the per-probe timeout.
    pub async fn check(&self) -> HealthReport {
        self.check_with(&Deadline::none()).await
    }

    /// Check all dependencies under the caller's deadline.
    ///
    /// Each probe gets the earlier of the caller's deadline and the per-probe
    /// timeout. Cancellation marks every unfinished probe unhealthy.
    pub async fn check_with(&self, deadline: &Deadline) -> HealthReport {
        let bounded = deadline.tighten(self.probe_timeout);

        let outcomes = join_all(self.probes.iter().map(|probe| {
            let bounded = &bounded;
            async move {
                let status = match bounded.run(probe.probe()).await {
                    Ok(Ok(())) => DependencyStatus::Healthy,
                    Ok(Err(err)) => {
                        warn!(dependency = probe.name(), error = %err, "health probe failed");
                        DependencyStatus::Unhealthy
                    }
                    Err(interrupted) => {
                        warn!(dependency = probe.name(), reason = %interrupted, "health probe interrupted");
                        DependencyStatus::Unhealthy
                    }
                };
                (probe.name().to_string(), status)
            }
        }))
        .await;

        let report = HealthReport::from_outcomes(outcomes);
        debug!(status = ?report.status, dependencies = report.dependencies.len(), "health check complete");
        report
    }
}

impl Default for HealthAggregator {
    fn default() -> Self {
        Self::from_config(&HealthConfig::default())
    }
}
