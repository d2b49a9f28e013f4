//! Concurrent telemetry collection
//!
//! One task per candidate reads the service descriptor (when the CPU request is
//! not configured), the cluster status and, if requested, the job history.
//! Every remote call is bounded by the same timeout. Results come back in
//! candidate order regardless of completion order.

use super::{ClusterApi, JobSummary};
use crate::admission;
use crate::error::{DelegationError, Result};
use crate::models::{Candidate, ClusterStatus, MetricVector};
use crate::observability::{DelegationMetrics, StructuredLogger};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What was learned about one candidate
#[derive(Debug, Clone)]
pub enum TelemetryOutcome {
    /// The candidate can host the job. `metrics` and `jobs` are present when
    /// the job history was requested.
    Admitted {
        status: ClusterStatus,
        metrics: Option<MetricVector>,
        jobs: Option<JobSummary>,
    },
    /// The largest free node is too small for the job
    Inadmissible {
        status: ClusterStatus,
        reason: DelegationError,
    },
    /// Telemetry could not be obtained
    Unavailable(DelegationError),
}

impl TelemetryOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, TelemetryOutcome::Admitted { .. })
    }

    pub fn status(&self) -> Option<&ClusterStatus> {
        match self {
            TelemetryOutcome::Admitted { status, .. } | TelemetryOutcome::Inadmissible { status, .. } => {
                Some(status)
            }
            TelemetryOutcome::Unavailable(_) => None,
        }
    }

    /// Row of the decision matrix: the measured vector, or the sentinel
    pub fn metric_row(&self) -> MetricVector {
        match self {
            TelemetryOutcome::Admitted {
                metrics: Some(metrics),
                ..
            } => *metrics,
            _ => MetricVector::SENTINEL,
        }
    }

    /// Why the candidate was demoted, if it was
    pub fn demotion_reason(&self) -> Option<&DelegationError> {
        match self {
            TelemetryOutcome::Admitted { .. } => None,
            TelemetryOutcome::Inadmissible { reason, .. } => Some(reason),
            TelemetryOutcome::Unavailable(err) => Some(err),
        }
    }
}

/// Collects telemetry from every candidate through a [`ClusterApi`]
#[derive(Clone)]
pub struct TelemetryCollector {
    api: Arc<dyn ClusterApi>,
    timeout: Duration,
    logger: StructuredLogger,
    metrics: DelegationMetrics,
}

impl TelemetryCollector {
    pub fn new(api: Arc<dyn ClusterApi>, timeout: Duration, logger: StructuredLogger) -> Self {
        Self {
            api,
            timeout,
            logger,
            metrics: DelegationMetrics::new(),
        }
    }

    /// Collect telemetry for all candidates concurrently.
    ///
    /// Entry `i` of the result belongs to `candidates[i]`.
    pub async fn collect_all(&self, candidates: &[Candidate], with_history: bool) -> Vec<TelemetryOutcome> {
        let handles: Vec<_> = candidates
            .iter()
            .cloned()
            .map(|candidate| {
                let collector = self.clone();
                tokio::spawn(async move { collector.collect(&candidate, with_history).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, candidate) in handles.into_iter().zip(candidates) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let err = DelegationError::Transport {
                        endpoint: candidate.url.clone(),
                        message: format!("telemetry task failed: {e}"),
                    };
                    self.metrics.inc_telemetry_failures();
                    self.logger.log_telemetry_failed(candidate, &err);
                    TelemetryOutcome::Unavailable(err)
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Collect telemetry for one candidate. Never fails: errors become
    /// [`TelemetryOutcome::Unavailable`].
    ///
    /// The timeout bounds each remote call separately. A candidate makes up
    /// to three sequential calls (descriptor, status, job history), so one
    /// candidate can take up to three times the timeout.
    pub async fn collect(&self, candidate: &Candidate, with_history: bool) -> TelemetryOutcome {
        match self.gather(candidate, with_history).await {
            Ok(outcome) => {
                match &outcome {
                    TelemetryOutcome::Inadmissible { reason, .. } => {
                        self.metrics.inc_inadmissible();
                        self.logger.log_inadmissible(candidate, reason);
                    }
                    TelemetryOutcome::Admitted {
                        metrics: Some(metrics),
                        ..
                    } => self.logger.log_telemetry_collected(candidate, metrics.values()),
                    _ => {}
                }
                outcome
            }
            Err(err) => {
                self.metrics.inc_telemetry_failures();
                self.logger.log_telemetry_failed(candidate, &err);
                TelemetryOutcome::Unavailable(err)
            }
        }
    }

    async fn gather(&self, candidate: &Candidate, with_history: bool) -> Result<TelemetryOutcome> {
        let cpu = match candidate.cpu {
            Some(cpu) => cpu,
            None => self.bounded(candidate, self.api.service(candidate)).await?.cpu,
        };

        let status = self.bounded(candidate, self.api.status(candidate)).await?;
        if let Err(reason) = admission::check(&candidate.service, &status, cpu) {
            return Ok(TelemetryOutcome::Inadmissible { status, reason });
        }

        if !with_history {
            return Ok(TelemetryOutcome::Admitted {
                status,
                metrics: None,
                jobs: None,
            });
        }

        let started = Instant::now();
        let history = self.bounded(candidate, self.api.job_history(candidate)).await?;
        let latency = started.elapsed().as_secs_f64();
        self.metrics.observe_telemetry_latency(latency);

        let jobs = JobSummary::from_history(&history, &candidate.url)?;
        let metrics = MetricVector::new(
            latency,
            status.number_nodes as f64,
            status.memory_free_total,
            status.cpu_free_total,
            jobs.avg_execution_secs,
            jobs.pending,
        );

        Ok(TelemetryOutcome::Admitted {
            status,
            metrics: Some(metrics),
            jobs: Some(jobs),
        })
    }

    async fn bounded<T>(&self, candidate: &Candidate, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DelegationError::Timeout {
                endpoint: candidate.url.clone(),
                after: self.timeout,
            }),
        }
    }
}
