//! Cluster delegation library
//!
//! This crate provides the core functionality for:
//! - Concurrent telemetry collection from candidate clusters
//! - Capacity admission checks
//! - TOPSIS ranking with near-tie shuffling and priority mapping
//! - Pluggable delegation strategies
//! - Sequential job dispatch with failover
//! - Metrics and structured logging

pub mod admission;
pub mod config;
pub mod delegator;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod observability;
pub mod ranking;
pub mod strategy;
pub mod telemetry;

pub use config::DelegationConfig;
pub use delegator::Delegator;
pub use dispatch::{DispatchReceipt, Dispatcher};
pub use error::{DelegationError, DispatchFailure, Result};
pub use models::*;
pub use observability::{DelegationMetrics, StructuredLogger};
pub use ranking::{TieBreakThreshold, Weights};
pub use strategy::{DelegationPlan, DelegationStrategy, PlannedCandidate};
pub use telemetry::{ClusterApi, HttpClusterApi, JobSummary, TelemetryCollector, TelemetryOutcome};
