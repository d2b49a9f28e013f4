//! Delegation strategies
//!
//! A strategy turns the candidate list (and, except for `static`, their
//! telemetry) into a dispatch order with a priority on every candidate.

use crate::error::{DelegationError, Result};
use crate::models::{Candidate, MetricVector, NON_DELEGABLE_PRIORITY};
use crate::ranking::{self, TieBreakThreshold, Weights, PRIORITY_MAX, PRIORITY_MIN};
use crate::telemetry::TelemetryOutcome;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelegationStrategy {
    /// Configured priorities, no remote calls
    Static,
    /// Uniform random priority for admissible candidates
    Random,
    /// Priority from free CPU
    #[serde(alias = "load_based")]
    LoadBased,
    /// Multi-criteria ranking of live telemetry
    #[default]
    Topsis,
}

impl DelegationStrategy {
    pub const ALL: [DelegationStrategy; 4] = [
        DelegationStrategy::Static,
        DelegationStrategy::Random,
        DelegationStrategy::LoadBased,
        DelegationStrategy::Topsis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationStrategy::Static => "static",
            DelegationStrategy::Random => "random",
            DelegationStrategy::LoadBased => "load-based",
            DelegationStrategy::Topsis => "topsis",
        }
    }

    pub fn needs_telemetry(&self) -> bool {
        !matches!(self, DelegationStrategy::Static)
    }

    pub fn needs_job_history(&self) -> bool {
        matches!(self, DelegationStrategy::Topsis)
    }
}

impl fmt::Display for DelegationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DelegationStrategy {
    type Err = DelegationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(DelegationStrategy::Static),
            "random" => Ok(DelegationStrategy::Random),
            "load-based" | "load_based" => Ok(DelegationStrategy::LoadBased),
            "topsis" => Ok(DelegationStrategy::Topsis),
            other => Err(DelegationError::InvalidConfig(format!(
                "unknown strategy '{}' (valid: static, random, load-based, topsis)",
                other
            ))),
        }
    }
}

/// Inputs of the ranking stages
#[derive(Debug, Clone, Copy)]
pub struct RankingSettings {
    pub weights: Weights,
    pub tie_break: TieBreakThreshold,
    /// Free CPU (millicores) that maps to the best load-based priority
    pub load_based_cpu_ceiling: f64,
}

/// A candidate with its assigned priority and the evidence behind it
#[derive(Debug, Clone)]
pub struct PlannedCandidate {
    /// 0-based position in the configured candidate list
    pub position: usize,
    pub candidate: Candidate,
    /// TOPSIS preference, `topsis` only
    pub preference: Option<f64>,
    /// Telemetry, absent for `static`
    pub telemetry: Option<TelemetryOutcome>,
}

impl PlannedCandidate {
    /// Decision-matrix row used for this candidate, `topsis` only
    pub fn metric_row(&self) -> Option<MetricVector> {
        self.preference?;
        self.telemetry.as_ref().map(TelemetryOutcome::metric_row)
    }
}

/// Candidates of one run in dispatch order
#[derive(Debug, Clone)]
pub struct DelegationPlan {
    pub strategy: DelegationStrategy,
    pub entries: Vec<PlannedCandidate>,
}

impl DelegationPlan {
    pub fn dispatch_order(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter().map(|e| &e.candidate)
    }

    /// `(1-based configured index, priority, preference)` per entry
    pub fn summary(&self) -> Vec<(usize, Option<i64>, Option<f64>)> {
        self.entries
            .iter()
            .map(|e| (e.position + 1, e.candidate.priority, e.preference))
            .collect()
    }
}

/// Assign priorities and return candidates in dispatch order.
///
/// `telemetry[i]` belongs to `candidates[i]`; it is ignored by `static`.
/// Under `topsis` the order is the tie-broken ranking itself. Other
/// strategies sort ascending by priority, stably, with unset priorities last.
pub fn plan<R: Rng + ?Sized>(
    strategy: DelegationStrategy,
    candidates: &[Candidate],
    telemetry: Vec<TelemetryOutcome>,
    settings: &RankingSettings,
    rng: &mut R,
) -> Result<Vec<PlannedCandidate>> {
    if strategy.needs_telemetry() && telemetry.len() != candidates.len() {
        return Err(DelegationError::InvalidConfig(format!(
            "{} candidates but {} telemetry outcomes",
            candidates.len(),
            telemetry.len()
        )));
    }

    let mut entries: Vec<PlannedCandidate> = match strategy {
        DelegationStrategy::Static => candidates
            .iter()
            .enumerate()
            .map(|(position, candidate)| PlannedCandidate {
                position,
                candidate: candidate.clone(),
                preference: None,
                telemetry: None,
            })
            .collect(),
        DelegationStrategy::Random => assign_each(candidates, telemetry, |_| {
            Ok(rng.gen_range(1..NON_DELEGABLE_PRIORITY))
        })?,
        DelegationStrategy::LoadBased => assign_each(candidates, telemetry, |outcome| {
            let cpu_free = outcome.status().map(|s| s.cpu_free_total).unwrap_or_default();
            ranking::map_range(
                cpu_free,
                0.0,
                settings.load_based_cpu_ceiling,
                PRIORITY_MAX,
                PRIORITY_MIN,
            )
        })?,
        DelegationStrategy::Topsis => return plan_topsis(candidates, telemetry, settings, rng),
    };

    entries.sort_by_key(|e| e.candidate.priority.unwrap_or(i64::MAX));
    Ok(entries)
}

/// Priority from `admitted` for admissible candidates, non-delegable otherwise
fn assign_each(
    candidates: &[Candidate],
    telemetry: Vec<TelemetryOutcome>,
    mut admitted: impl FnMut(&TelemetryOutcome) -> Result<i64>,
) -> Result<Vec<PlannedCandidate>> {
    candidates
        .iter()
        .zip(telemetry)
        .enumerate()
        .map(|(position, (candidate, outcome))| {
            let priority = if outcome.is_admitted() {
                admitted(&outcome)?
            } else {
                NON_DELEGABLE_PRIORITY
            };
            Ok(PlannedCandidate {
                position,
                candidate: candidate.clone().with_priority(priority),
                preference: None,
                telemetry: Some(outcome),
            })
        })
        .collect()
}

fn plan_topsis<R: Rng + ?Sized>(
    candidates: &[Candidate],
    telemetry: Vec<TelemetryOutcome>,
    settings: &RankingSettings,
    rng: &mut R,
) -> Result<Vec<PlannedCandidate>> {
    let matrix: Vec<MetricVector> = telemetry.iter().map(TelemetryOutcome::metric_row).collect();
    let order = ranking::rank_with_tiebreak(&matrix, &settings.weights, settings.tie_break, rng);

    let mut slots: Vec<Option<TelemetryOutcome>> = telemetry.into_iter().map(Some).collect();
    order
        .into_iter()
        .map(|alternative| {
            let position = alternative.index - 1;
            let priority = ranking::score_priority(alternative.preference)?;
            Ok(PlannedCandidate {
                position,
                candidate: candidates[position].clone().with_priority(priority),
                preference: Some(alternative.preference),
                telemetry: slots[position].take(),
            })
        })
        .collect()
}
