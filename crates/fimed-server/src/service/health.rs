//! Composite dependency health aggregation.
//!
//! The [`HealthAggregator`] runs a set of registered probes against declared
//! dependencies and folds the results into one [`HealthReport`]. Probes run
//! concurrently against a shared deadline; a failing, panicking, or hung
//! probe is isolated to its own component entry and never aborts its
//! siblings. Reports collect results in registration order so identical
//! probe sets produce reproducible reports.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fimed_core::{ComponentHealth, ComponentStatus, HealthReport, MetricsRegistry};
use tokio::time::timeout_at;

/// Tracing target for health aggregation.
const TRACING_TARGET: &str = "fimed_server::service::health";

/// Default per-probe timeout.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Message recorded for a probe that missed its deadline.
const TIMEOUT_MESSAGE: &str = "timed out";

/// Static liveness signal: the process can answer requests.
pub const LIVENESS_STATUS: &str = "alive";

/// Verdict returned by a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether the dependency answered.
    pub healthy: bool,
    /// Human-readable detail.
    pub message: String,
}

impl ProbeOutcome {
    /// Creates a healthy outcome.
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            healthy: true,
            message: message.into(),
        }
    }

    /// Creates an unhealthy outcome.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            message: message.into(),
        }
    }

    /// Folds a fallible check into an outcome, turning the error text into
    /// the unhealthy message.
    pub fn from_result<T, E>(result: Result<T, E>) -> Self
    where
        T: Into<String>,
        E: fmt::Display,
    {
        match result {
            Ok(message) => Self::healthy(message),
            Err(error) => Self::unhealthy(error.to_string()),
        }
    }
}

/// A named check verifying one dependency's operability.
///
/// Implementations perform their own I/O (a trivial query, a cache ping, a
/// worker inspection) and must convert internal failures into an unhealthy
/// [`ProbeOutcome`] rather than letting them escape.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Runs the check once.
    async fn check(&self) -> ProbeOutcome;
}

/// Adapter turning a plain async closure into a [`Probe`].
pub struct FnProbe<F> {
    check_fn: F,
}

impl<F> FnProbe<F> {
    /// Wraps an async closure.
    pub fn new(check_fn: F) -> Self {
        Self { check_fn }
    }
}

#[async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = ProbeOutcome> + Send,
{
    async fn check(&self) -> ProbeOutcome {
        (self.check_fn)().await
    }
}

/// Which endpoints a registered probe participates in.
///
/// Liveness itself never runs probes; the scope only controls whether the
/// probe is part of the readiness subset in addition to the full report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeScope {
    /// Full report only; excluded from readiness.
    Liveness,
    /// Readiness-relevant.
    Readiness,
    /// Both the full report and readiness.
    Both,
}

impl ProbeScope {
    /// Returns `true` if the probe participates in readiness checks.
    #[must_use]
    pub const fn is_readiness_relevant(self) -> bool {
        matches!(self, Self::Readiness | Self::Both)
    }
}

/// One registered probe with its name and scope.
#[derive(Clone)]
struct RegisteredProbe {
    name: Cow<'static, str>,
    scope: ProbeScope,
    probe: Arc<dyn Probe>,
}

/// Runs registered probes and aggregates their results into reports.
///
/// All configuration is held per-instance; independently configured
/// aggregators may coexist. Clones share the probe registry.
#[derive(Clone)]
pub struct HealthAggregator {
    probes: Arc<RwLock<Vec<RegisteredProbe>>>,
    probe_timeout: Duration,
    metrics: Option<MetricsRegistry>,
}

impl HealthAggregator {
    /// Creates an aggregator with the default probe timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_probe_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Creates an aggregator with a custom probe timeout.
    #[must_use]
    pub fn with_probe_timeout(probe_timeout: Duration) -> Self {
        Self {
            probes: Arc::new(RwLock::new(Vec::new())),
            probe_timeout,
            metrics: None,
        }
    }

    /// Attaches a metrics registry whose snapshot is taken at report time.
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the configured per-probe timeout.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Registers a named probe.
    pub fn register(
        &self,
        name: impl Into<Cow<'static, str>>,
        scope: ProbeScope,
        probe: impl Probe + 'static,
    ) {
        let name = name.into();
        tracing::debug!(
            target: TRACING_TARGET,
            probe = %name,
            scope = ?scope,
            "probe registered"
        );

        let mut probes = self.probes.write().unwrap_or_else(PoisonError::into_inner);
        probes.push(RegisteredProbe {
            name,
            scope,
            probe: Arc::new(probe),
        });
    }

    /// Registers a plain async closure as a probe.
    pub fn register_fn<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        scope: ProbeScope,
        check_fn: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ProbeOutcome> + Send + 'static,
    {
        self.register(name, scope, FnProbe::new(check_fn));
    }

    /// Number of registered probes.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs every registered probe with the configured timeout.
    pub async fn run_all(&self) -> HealthReport {
        self.run_all_within(self.probe_timeout).await
    }

    /// Runs every registered probe against the given deadline.
    pub async fn run_all_within(&self, timeout: Duration) -> HealthReport {
        self.run(timeout, |_| true).await
    }

    /// Runs the readiness-relevant subset with the configured timeout.
    pub async fn readiness(&self) -> HealthReport {
        self.readiness_within(self.probe_timeout).await
    }

    /// Runs the readiness-relevant subset against the given deadline.
    pub async fn readiness_within(&self, timeout: Duration) -> HealthReport {
        self.run(timeout, ProbeScope::is_readiness_relevant).await
    }

    /// Static liveness signal; invokes no probes.
    #[must_use]
    pub fn liveness(&self) -> &'static str {
        LIVENESS_STATUS
    }

    /// Runs the probes selected by `filter` and assembles the report.
    async fn run(&self, timeout: Duration, filter: impl Fn(ProbeScope) -> bool) -> HealthReport {
        let started = Instant::now();
        let probes: Vec<RegisteredProbe> = {
            let registered = self.probes.read().unwrap_or_else(PoisonError::into_inner);
            registered
                .iter()
                .filter(|entry| filter(entry.scope))
                .cloned()
                .collect()
        };

        // One shared deadline: probes run concurrently, so each gets the
        // full window and the report returns within roughly one timeout.
        let deadline = tokio::time::Instant::now() + timeout;
        let mut tasks = Vec::with_capacity(probes.len());
        for entry in &probes {
            let probe = Arc::clone(&entry.probe);
            tasks.push(tokio::spawn(async move {
                let probe_started = Instant::now();
                let outcome = probe.check().await;
                (outcome, probe_started.elapsed())
            }));
        }

        let mut components = Vec::with_capacity(probes.len());
        for (entry, mut task) in probes.iter().zip(tasks) {
            let component = match timeout_at(deadline, &mut task).await {
                Ok(Ok((outcome, latency))) => ComponentHealth::new(
                    entry.name.as_ref(),
                    ComponentStatus::from_healthy(outcome.healthy),
                    outcome.message,
                )
                .with_latency(latency),
                Ok(Err(join_error)) => {
                    let message = match join_error.try_into_panic() {
                        Ok(panic) => panic_message(panic),
                        Err(join_error) => join_error.to_string(),
                    };
                    tracing::warn!(
                        target: TRACING_TARGET,
                        probe = %entry.name,
                        error = %message,
                        "probe aborted abnormally"
                    );
                    ComponentHealth::unhealthy(entry.name.as_ref(), message)
                        .with_latency(started.elapsed())
                }
                Err(_elapsed) => {
                    // The hung probe must not linger past the report.
                    task.abort();
                    tracing::warn!(
                        target: TRACING_TARGET,
                        probe = %entry.name,
                        timeout_ms = timeout.as_millis(),
                        "probe timed out"
                    );
                    ComponentHealth::unhealthy(entry.name.as_ref(), TIMEOUT_MESSAGE)
                        .with_latency(timeout)
                }
            };
            components.push(component);
        }

        let mut report = HealthReport::new(components);
        if let Some(metrics) = &self.metrics {
            report = report.with_metrics(metrics.snapshot());
        }

        tracing::info!(
            target: TRACING_TARGET,
            duration_ms = started.elapsed().as_millis(),
            components = report.components.len(),
            overall_healthy = report.is_healthy(),
            "health check completed"
        );

        report
    }
}

impl Default for HealthAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a readable message from a probe's panic payload.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "probe panicked".to_string()
    }
}
