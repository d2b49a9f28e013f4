//! Job history aggregation

use crate::error::{DelegationError, Result};
use crate::models::{JobHistory, JobState};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp format of the job history endpoint (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Outcome counts and execution time of a service's recorded jobs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobSummary {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub pending: u64,
    /// Mean of `finish_time - creation_time` over succeeded jobs, 0 if none succeeded
    pub avg_execution_secs: f64,
}

impl JobSummary {
    /// Aggregate a job history. `endpoint` labels parse errors.
    pub fn from_history(history: &JobHistory, endpoint: &str) -> Result<Self> {
        let mut summary = JobSummary::default();
        let mut total_execution_secs = 0.0;

        for (job_id, record) in history {
            summary.total += 1;
            match record.status {
                JobState::Succeeded => {
                    summary.succeeded += 1;
                    let created = parse_timestamp(record.creation_time.as_deref(), job_id, endpoint)?;
                    let finished = parse_timestamp(record.finish_time.as_deref(), job_id, endpoint)?;
                    total_execution_secs += (finished - created).num_seconds() as f64;
                }
                JobState::Failed => summary.failed += 1,
                JobState::Pending => summary.pending += 1,
                JobState::Running | JobState::Unknown => {}
            }
        }

        if summary.succeeded > 0 {
            summary.avg_execution_secs = total_execution_secs / summary.succeeded as f64;
        }
        Ok(summary)
    }
}

fn parse_timestamp(value: Option<&str>, job_id: &str, endpoint: &str) -> Result<NaiveDateTime> {
    let raw = value.ok_or_else(|| DelegationError::MalformedResponse {
        endpoint: endpoint.to_string(),
        message: format!("succeeded job '{}' has no timestamp", job_id),
    })?;

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        DelegationError::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: format!("job '{}' has invalid timestamp '{}': {}", job_id, raw, e),
        }
    })
}
