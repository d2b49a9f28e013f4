//! Sequential dispatch with failover
//!
//! Candidates are tried one at a time in plan order. Each attempt fetches a
//! fresh token from the service descriptor and posts the payload; the first
//! 200 or 201 ends the loop.

use crate::error::{DelegationError, DispatchFailure, Result};
use crate::models::Candidate;
use crate::observability::{DelegationMetrics, StructuredLogger};
use crate::telemetry::ClusterApi;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where a job landed
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReceipt {
    pub url: String,
    pub service: String,
    pub status: u16,
    /// 1-based attempt that succeeded
    pub attempt: usize,
    /// Attempts that failed before the successful one
    pub failures: Vec<DispatchFailure>,
}

pub fn is_accepted(status: u16) -> bool {
    matches!(status, 200 | 201)
}

pub struct Dispatcher {
    api: Arc<dyn ClusterApi>,
    timeout: Duration,
    logger: StructuredLogger,
    metrics: DelegationMetrics,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn ClusterApi>, timeout: Duration, logger: StructuredLogger) -> Self {
        Self {
            api,
            timeout,
            logger,
            metrics: DelegationMetrics::new(),
        }
    }

    /// Submit `payload` to the first candidate that accepts it.
    ///
    /// Every candidate is attempted in order, including non-delegable ones.
    /// Returns [`DelegationError::AllCandidatesExhausted`] with one failure
    /// per candidate when none accepts.
    pub async fn dispatch<'a, I>(&self, candidates: I, payload: &[u8]) -> Result<DispatchReceipt>
    where
        I: IntoIterator<Item = &'a Candidate>,
    {
        let mut failures = Vec::new();

        for (i, candidate) in candidates.into_iter().enumerate() {
            let attempt = i + 1;
            self.metrics.inc_dispatch_attempts();
            self.logger.log_dispatch_attempt(candidate, attempt);

            let reason = match self.attempt(candidate, payload).await {
                Ok(status) if is_accepted(status) => {
                    self.logger.log_dispatch_succeeded(candidate, status, attempt);
                    return Ok(DispatchReceipt {
                        url: candidate.url.clone(),
                        service: candidate.service.clone(),
                        status,
                        attempt,
                        failures,
                    });
                }
                Ok(status) => format!("job endpoint answered HTTP {}", status),
                Err(err) => err.to_string(),
            };

            self.metrics.inc_dispatch_failures();
            self.logger.log_dispatch_failed(candidate, &reason);
            failures.push(DispatchFailure {
                url: candidate.url.clone(),
                service: candidate.service.clone(),
                reason,
            });
        }

        Err(DelegationError::AllCandidatesExhausted { failures })
    }

    async fn attempt(&self, candidate: &Candidate, payload: &[u8]) -> Result<u16> {
        let descriptor = self.bounded(candidate, self.api.service(candidate)).await?;
        let token = descriptor
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DelegationError::MalformedResponse {
                endpoint: candidate.url.clone(),
                message: format!("service '{}' descriptor has no token", candidate.service),
            })?;

        self.bounded(candidate, self.api.submit_job(candidate, &token, payload))
            .await
    }

    async fn bounded<T>(&self, candidate: &Candidate, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| DelegationError::Timeout {
                endpoint: candidate.url.clone(),
                after: self.timeout,
            })?
    }
}
