//! Core data models for the delegator

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Number of criteria in a [`MetricVector`]
pub const CRITERIA: usize = 6;

/// Priority given to candidates that must not receive the job
pub const NON_DELEGABLE_PRIORITY: i64 = 101;

/// Offset added to the pending-job count so the criterion is never exactly zero
pub const PENDING_OFFSET: f64 = 0.1;

/// Credential resolved for a cluster's management endpoints
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Basic { user: String, password: String },
    Bearer { token: String },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Credential::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// One cluster/service pair a job may be delegated to
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Base URL of the cluster (e.g. "https://cluster-a.example.org")
    pub url: String,
    /// Service that executes the job on that cluster
    pub service: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Required CPU in fractional cores. Read from the service descriptor when unset.
    #[serde(default)]
    pub cpu: Option<f64>,
    /// Dispatch priority, lower goes first. Pre-assigned only for the static strategy.
    #[serde(default)]
    pub priority: Option<i64>,
}

impl Candidate {
    pub fn new(url: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service: service.into(),
            user: None,
            password: None,
            token: None,
            cpu: None,
            priority: None,
        }
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_cpu(mut self, cpu: f64) -> Self {
        self.cpu = Some(cpu);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Resolve the credential for this candidate.
    ///
    /// A non-empty token wins over basic auth; basic auth needs both halves.
    pub fn credential(&self) -> Option<Credential> {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);

        if let Some(token) = non_empty(&self.token) {
            return Some(Credential::Bearer { token });
        }
        match (non_empty(&self.user), non_empty(&self.password)) {
            (Some(user), Some(password)) => Some(Credential::Basic { user, password }),
            _ => None,
        }
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("url", &self.url)
            .field("service", &self.service)
            .field("credential", &self.credential())
            .field("cpu", &self.cpu)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Telemetry of one candidate in canonical criterion order:
/// latency (s), node count, free memory, free CPU, average execution time (s),
/// pending jobs + 0.1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricVector(pub [f64; CRITERIA]);

impl MetricVector {
    /// Worst-case telemetry used whenever real metrics cannot be obtained
    pub const SENTINEL: Self = Self([20.0, 0.0, 0.0, 0.0, 1e6, 1e6]);

    pub fn new(
        latency_secs: f64,
        number_nodes: f64,
        memory_free_total: f64,
        cpu_free_total: f64,
        avg_execution_secs: f64,
        pending_jobs: u64,
    ) -> Self {
        Self([
            latency_secs,
            number_nodes,
            memory_free_total,
            cpu_free_total,
            avg_execution_secs,
            pending_jobs as f64 + PENDING_OFFSET,
        ])
    }

    pub fn values(&self) -> &[f64; CRITERIA] {
        &self.0
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

/// Live capacity reported by `GET {url}/system/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    pub number_nodes: u64,
    pub memory_free_total: f64,
    /// Free CPU over all nodes, in millicores
    pub cpu_free_total: f64,
    /// Largest free CPU on a single node, in millicores
    pub cpu_max_free: f64,
    #[serde(default)]
    pub memory_max_free: Option<f64>,
    /// Per-node breakdown. `null` (a cluster scaled to zero) reads as empty.
    #[serde(default, rename = "detail", deserialize_with = "null_as_empty")]
    pub nodes: Vec<NodeDetail>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<NodeDetail>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<NodeDetail>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeDetail {
    pub node_name: String,
    pub cpu_capacity: String,
    pub cpu_usage: String,
    pub cpu_percentage: String,
    pub memory_capacity: String,
    pub memory_usage: String,
    pub memory_percentage: String,
}

/// Lifecycle state of a job in the history endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Succeeded,
    Failed,
    Pending,
    Running,
    #[serde(other)]
    Unknown,
}

/// One entry of `GET {url}/system/logs/{service}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    pub status: JobState,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub finish_time: Option<String>,
}

/// Job history keyed by job id
pub type JobHistory = HashMap<String, JobRecord>;

/// Service descriptor from `GET {url}/system/services/{service}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDescriptor {
    /// Required CPU in fractional cores
    #[serde(deserialize_with = "cpu_from_str_or_number")]
    pub cpu: f64,
    /// Bearer token used to submit jobs to the service
    #[serde(default)]
    pub token: Option<String>,
}

fn cpu_from_str_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cpu {
        Number(f64),
        Text(String),
    }

    match Cpu::deserialize(deserializer)? {
        Cpu::Number(n) => Ok(n),
        Cpu::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// A ranked candidate: 1-based index into the candidate list plus its TOPSIS score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub index: usize,
    pub preference: f64,
}
