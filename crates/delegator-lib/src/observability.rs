//! Observability infrastructure for the delegator
//!
//! Provides:
//! - Prometheus metrics (telemetry latency, failures, dispatch attempts, priorities)
//! - Structured logging of delegation milestones with tracing

use crate::error::DelegationError;
use crate::models::Candidate;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, register_int_gauge_vec,
    Histogram, IntCounter, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for remote read latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DelegationMetricsInner> = OnceLock::new();

struct DelegationMetricsInner {
    telemetry_latency_seconds: Histogram,
    telemetry_failures: IntCounter,
    inadmissible_candidates: IntCounter,
    dispatch_attempts: IntCounter,
    dispatch_failures: IntCounter,
    candidates_ranked: IntGauge,
    candidate_priority: IntGaugeVec,
}

impl DelegationMetricsInner {
    fn new() -> Self {
        Self {
            telemetry_latency_seconds: register_histogram!(
                "delegator_telemetry_latency_seconds",
                "Duration of job history reads used as the latency criterion",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register telemetry_latency_seconds"),

            telemetry_failures: register_int_counter!(
                "delegator_telemetry_failures_total",
                "Candidates whose telemetry was replaced by the sentinel vector"
            )
            .expect("Failed to register telemetry_failures"),

            inadmissible_candidates: register_int_counter!(
                "delegator_inadmissible_candidates_total",
                "Candidates rejected by the capacity pre-check"
            )
            .expect("Failed to register inadmissible_candidates"),

            dispatch_attempts: register_int_counter!(
                "delegator_dispatch_attempts_total",
                "Job submission attempts"
            )
            .expect("Failed to register dispatch_attempts"),

            dispatch_failures: register_int_counter!(
                "delegator_dispatch_failures_total",
                "Job submission attempts that did not succeed"
            )
            .expect("Failed to register dispatch_failures"),

            candidates_ranked: register_int_gauge!(
                "delegator_candidates_ranked",
                "Number of candidates in the last delegation plan"
            )
            .expect("Failed to register candidates_ranked"),

            candidate_priority: register_int_gauge_vec!(
                "delegator_candidate_priority",
                "Priority assigned to each candidate in the last plan",
                &["url", "service"]
            )
            .expect("Failed to register candidate_priority"),
        }
    }
}

/// Delegation metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying collectors.
#[derive(Clone)]
pub struct DelegationMetrics {
    _private: (),
}

impl Default for DelegationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegationMetrics {
    /// Create a new metrics handle (registers global metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DelegationMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DelegationMetricsInner {
        GLOBAL_METRICS.get_or_init(DelegationMetricsInner::new)
    }

    pub fn observe_telemetry_latency(&self, duration_secs: f64) {
        self.inner().telemetry_latency_seconds.observe(duration_secs);
    }

    pub fn inc_telemetry_failures(&self) {
        self.inner().telemetry_failures.inc();
    }

    pub fn inc_inadmissible(&self) {
        self.inner().inadmissible_candidates.inc();
    }

    pub fn inc_dispatch_attempts(&self) {
        self.inner().dispatch_attempts.inc();
    }

    pub fn inc_dispatch_failures(&self) {
        self.inner().dispatch_failures.inc();
    }

    /// Record the priorities of a freshly computed plan
    pub fn set_plan<'a>(&self, candidates: impl IntoIterator<Item = &'a Candidate>) {
        let inner = self.inner();
        inner.candidate_priority.reset();
        let mut count = 0;
        for candidate in candidates {
            count += 1;
            if let Some(priority) = candidate.priority {
                inner
                    .candidate_priority
                    .with_label_values(&[candidate.url.as_str(), candidate.service.as_str()])
                    .set(priority);
            }
        }
        inner.candidates_ranked.set(count);
    }

    /// Text exposition of every registered metric
    pub fn render() -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for delegation events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    strategy: String,
}

impl StructuredLogger {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
        }
    }

    pub fn log_telemetry_collected(&self, candidate: &Candidate, values: &[f64]) {
        info!(
            event = "telemetry_collected",
            strategy = %self.strategy,
            url = %candidate.url,
            service = %candidate.service,
            metrics = ?values,
            "Collected candidate telemetry"
        );
    }

    pub fn log_telemetry_failed(&self, candidate: &Candidate, err: &DelegationError) {
        warn!(
            event = "telemetry_failed",
            strategy = %self.strategy,
            url = %candidate.url,
            service = %candidate.service,
            error = %err,
            "Telemetry unavailable, candidate demoted"
        );
    }

    pub fn log_inadmissible(&self, candidate: &Candidate, reason: &DelegationError) {
        info!(
            event = "candidate_inadmissible",
            strategy = %self.strategy,
            url = %candidate.url,
            service = %candidate.service,
            reason = %reason,
            "Candidate cannot host the job"
        );
    }

    pub fn log_ranking(&self, order: &[(usize, Option<i64>, Option<f64>)]) {
        info!(
            event = "ranking_computed",
            strategy = %self.strategy,
            order = ?order,
            "Computed delegation order"
        );
    }

    pub fn log_invalid_range(&self, err: &DelegationError) {
        error!(
            event = "invalid_priority_range",
            strategy = %self.strategy,
            error = %err,
            "Priority mapping is misconfigured"
        );
    }

    pub fn log_dispatch_attempt(&self, candidate: &Candidate, attempt: usize) {
        info!(
            event = "dispatch_attempt",
            strategy = %self.strategy,
            url = %candidate.url,
            service = %candidate.service,
            priority = ?candidate.priority,
            attempt = attempt,
            "Submitting job"
        );
    }

    pub fn log_dispatch_failed(&self, candidate: &Candidate, reason: &str) {
        warn!(
            event = "dispatch_failed",
            strategy = %self.strategy,
            url = %candidate.url,
            service = %candidate.service,
            reason = %reason,
            "Submission failed, trying next candidate"
        );
    }

    pub fn log_dispatch_succeeded(&self, candidate: &Candidate, status: u16, attempt: usize) {
        info!(
            event = "dispatch_succeeded",
            strategy = %self.strategy,
            url = %candidate.url,
            service = %candidate.service,
            status = status,
            attempt = attempt,
            "Job delegated"
        );
    }
}
