//! Subcommand implementations

pub mod rank;
pub mod status;
pub mod submit;

use delegator_lib::{DelegationPlan, JobSummary, MetricVector, PlannedCandidate, TelemetryOutcome};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{color_priority, color_score, color_state};

/// Short state name of a telemetry outcome
pub fn state_name(outcome: Option<&TelemetryOutcome>) -> &'static str {
    match outcome {
        None => "configured",
        Some(TelemetryOutcome::Admitted { .. }) => "admitted",
        Some(TelemetryOutcome::Inadmissible { .. }) => "inadmissible",
        Some(TelemetryOutcome::Unavailable(_)) => "unavailable",
    }
}

/// One plan entry as reported to the user
#[derive(Debug, Serialize)]
pub struct PlanEntryView {
    pub order: usize,
    /// 1-based index in the configured candidate list
    pub index: usize,
    pub url: String,
    pub service: String,
    pub priority: Option<i64>,
    pub score: Option<f64>,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jobs: Option<JobSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PlanEntryView {
    fn new(order: usize, entry: &PlannedCandidate) -> Self {
        let telemetry = entry.telemetry.as_ref();
        let jobs = match telemetry {
            Some(TelemetryOutcome::Admitted { jobs, .. }) => jobs.clone(),
            _ => None,
        };
        Self {
            order,
            index: entry.position + 1,
            url: entry.candidate.url.clone(),
            service: entry.candidate.service.clone(),
            priority: entry.candidate.priority,
            score: entry.preference,
            state: state_name(telemetry),
            metrics: entry.metric_row(),
            jobs,
            reason: telemetry
                .and_then(TelemetryOutcome::demotion_reason)
                .map(ToString::to_string),
        }
    }
}

pub fn plan_view(plan: &DelegationPlan) -> Vec<PlanEntryView> {
    plan.entries
        .iter()
        .enumerate()
        .map(|(i, entry)| PlanEntryView::new(i + 1, entry))
        .collect()
}

/// Row for the plan table
#[derive(Tabled)]
pub struct PlanRow {
    #[tabled(rename = "#")]
    order: usize,
    #[tabled(rename = "Candidate")]
    index: usize,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&PlanEntryView> for PlanRow {
    fn from(view: &PlanEntryView) -> Self {
        let detail = match (&view.reason, &view.metrics, &view.jobs) {
            (Some(reason), _, _) => reason.clone(),
            (None, Some(m), Some(jobs)) => format!(
                "latency {:.2}s, {} nodes, avg exec {:.0}s, {} pending, {}/{} jobs failed",
                m.values()[0],
                m.values()[1],
                m.values()[4],
                jobs.pending,
                jobs.failed,
                jobs.total
            ),
            _ => String::new(),
        };
        Self {
            order: view.order,
            index: view.index,
            url: view.url.clone(),
            service: view.service.clone(),
            priority: color_priority(view.priority),
            score: color_score(view.score),
            state: color_state(view.state),
            detail,
        }
    }
}
