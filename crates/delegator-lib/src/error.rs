//! Error types for the delegation pipeline
//!
//! Telemetry errors (`Timeout`, `Transport`, `MalformedResponse`,
//! `MissingCredential`) are absorbed by the collector and turned into the
//! sentinel metric vector. `InadmissibleCapacity` demotes a candidate and is
//! never surfaced as a failure. `InvalidRange` and `InvalidConfig` are
//! configuration faults. `AllCandidatesExhausted` is the only error a caller
//! sees when a job could not be delegated anywhere.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DelegationError>;

/// Why a single submission attempt did not succeed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchFailure {
    pub url: String,
    pub service: String,
    pub reason: String,
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.url, self.service, self.reason)
    }
}

#[derive(Debug, Clone, Error)]
pub enum DelegationError {
    /// A remote call did not complete within its bound
    #[error("request to {endpoint} timed out after {after:?}")]
    Timeout { endpoint: String, after: Duration },

    /// Connection, DNS or TLS failure, or an unexpected HTTP status
    #[error("transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The response body did not have the expected shape
    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// Neither a token nor a user/password pair is configured
    #[error("no usable credential configured for {endpoint}")]
    MissingCredential { endpoint: String },

    /// The largest free node cannot host the job
    #[error(
        "service '{service}' needs {required_millicores}m CPU but the largest free node has {max_free_millicores}m"
    )]
    InadmissibleCapacity {
        service: String,
        required_millicores: f64,
        max_free_millicores: f64,
    },

    /// Priority mapping over an empty domain
    #[error("invalid mapping domain [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Every candidate was tried and none accepted the job
    #[error("job could not be delegated, all {} candidates failed: {}", .failures.len(), join_failures(.failures))]
    AllCandidatesExhausted { failures: Vec<DispatchFailure> },
}

fn join_failures(failures: &[DispatchFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DelegationError {
    /// Classify a reqwest error raised while calling `endpoint`
    pub fn from_reqwest(endpoint: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DelegationError::Timeout {
                endpoint: endpoint.to_string(),
                after: timeout,
            }
        } else if err.is_decode() {
            DelegationError::MalformedResponse {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        } else {
            DelegationError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    /// True for the errors the telemetry collector replaces with the sentinel vector
    pub fn is_telemetry_fault(&self) -> bool {
        matches!(
            self,
            DelegationError::Timeout { .. }
                | DelegationError::Transport { .. }
                | DelegationError::MalformedResponse { .. }
                | DelegationError::MissingCredential { .. }
        )
    }
}
