//! End-to-end delegation pipeline
//!
//! telemetry (concurrent) -> strategy -> dispatch (sequential failover)

use crate::config::DelegationConfig;
use crate::dispatch::{DispatchReceipt, Dispatcher};
use crate::error::{DelegationError, Result};
use crate::observability::{DelegationMetrics, StructuredLogger};
use crate::strategy::{self, DelegationPlan};
use crate::telemetry::{ClusterApi, HttpClusterApi, TelemetryCollector, TelemetryOutcome};
use rand::Rng;
use std::sync::Arc;
use tracing::info;

pub struct Delegator {
    config: DelegationConfig,
    collector: TelemetryCollector,
    dispatcher: Dispatcher,
    logger: StructuredLogger,
    metrics: DelegationMetrics,
}

impl Delegator {
    /// Validate `config` and build a delegator on top of `api`
    pub fn new(config: DelegationConfig, api: Arc<dyn ClusterApi>) -> Result<Self> {
        config.validate()?;

        let logger = StructuredLogger::new(config.strategy.as_str());
        let timeout = config.request_timeout();

        Ok(Self {
            collector: TelemetryCollector::new(api.clone(), timeout, logger.clone()),
            dispatcher: Dispatcher::new(api, timeout, logger.clone()),
            logger,
            metrics: DelegationMetrics::new(),
            config,
        })
    }

    /// Build a delegator that talks HTTP to the configured clusters
    pub fn from_config(config: DelegationConfig) -> Result<Self> {
        let api = HttpClusterApi::new(config.request_timeout(), config.insecure_tls)?;
        Self::new(config, Arc::new(api))
    }

    pub fn config(&self) -> &DelegationConfig {
        &self.config
    }

    /// Gather telemetry and compute the dispatch order
    pub async fn plan<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<DelegationPlan> {
        let strategy = self.config.strategy;
        let candidates = &self.config.candidates;

        let telemetry = if strategy.needs_telemetry() {
            self.collector
                .collect_all(candidates, strategy.needs_job_history())
                .await
        } else {
            Vec::new()
        };

        let entries = strategy::plan(
            strategy,
            candidates,
            telemetry,
            &self.config.ranking_settings(),
            rng,
        )
        .map_err(|err| {
            if matches!(err, DelegationError::InvalidRange { .. }) {
                self.logger.log_invalid_range(&err);
            }
            err
        })?;

        let plan = DelegationPlan { strategy, entries };
        self.metrics.set_plan(plan.dispatch_order());
        self.logger.log_ranking(&plan.summary());
        Ok(plan)
    }

    /// Run the dispatch loop over a computed plan
    pub async fn dispatch(&self, plan: &DelegationPlan, payload: &[u8]) -> Result<DispatchReceipt> {
        self.dispatcher.dispatch(plan.dispatch_order(), payload).await
    }

    /// Plan, then dispatch
    pub async fn delegate<R: Rng + ?Sized>(&self, payload: &[u8], rng: &mut R) -> Result<DispatchReceipt> {
        let plan = self.plan(rng).await?;
        let receipt = self.dispatch(&plan, payload).await?;
        info!(
            url = %receipt.url,
            service = %receipt.service,
            attempt = receipt.attempt,
            "Delegation complete"
        );
        Ok(receipt)
    }

    /// Live status and admissibility of every candidate, without job history
    pub async fn status_report(&self) -> Vec<TelemetryOutcome> {
        self.collector.collect_all(&self.config.candidates, false).await
    }
}

#[cfg(test)]
mod tests;
