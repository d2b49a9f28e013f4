//! Telemetry collection from candidate clusters
//!
//! This module provides the [`ClusterApi`] seam to a cluster's management
//! endpoints, an HTTP implementation of it, and the collector that turns
//! each candidate's responses into a [`MetricVector`](crate::models::MetricVector)
//! concurrently and under a bounded timeout.

mod collector;
mod http;
mod jobs;

pub use collector::{TelemetryCollector, TelemetryOutcome};
pub use http::HttpClusterApi;
pub use jobs::{JobSummary, TIMESTAMP_FORMAT};

use crate::error::Result;
use crate::models::{Candidate, ClusterStatus, JobHistory, ServiceDescriptor};

pub use async_trait::async_trait;

/// Management endpoints exposed by a candidate cluster
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// `GET {url}/system/services/{service}`
    async fn service(&self, candidate: &Candidate) -> Result<ServiceDescriptor>;

    /// `GET {url}/system/status`
    async fn status(&self, candidate: &Candidate) -> Result<ClusterStatus>;

    /// `GET {url}/system/logs/{service}`
    async fn job_history(&self, candidate: &Candidate) -> Result<JobHistory>;

    /// `POST {url}/job/{service}` with the service token; returns the HTTP status code
    async fn submit_job(&self, candidate: &Candidate, token: &str, payload: &[u8]) -> Result<u16>;
}
