//! TOPSIS scoring over the candidate × criterion matrix
//!
//! Each column is vector-normalized, weighted, and compared against an ideal
//! and an anti-ideal point whose orientation follows [`DIRECTIONS`]. A
//! candidate's preference is its relative closeness to the ideal point.

use crate::error::{DelegationError, Result};
use crate::models::{Alternative, MetricVector, CRITERIA};
use serde::{Deserialize, Serialize};

type Row = [f64; CRITERIA];

/// Whether a higher raw value of a criterion is better or worse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Benefit,
    Cost,
}

/// Latency, average execution time and pending jobs are costs; node count,
/// free memory and free CPU are benefits.
pub const DIRECTIONS: [Direction; CRITERIA] = [
    Direction::Cost,
    Direction::Benefit,
    Direction::Benefit,
    Direction::Benefit,
    Direction::Cost,
    Direction::Cost,
];

/// Relative importance of each criterion, in [`MetricVector`] order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(pub [f64; CRITERIA]);

impl Default for Weights {
    fn default() -> Self {
        Self([1.0, 8.0, 18.0, 65.0, 2.0, 6.0])
    }
}

impl Weights {
    /// Every weight must be finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        match self.0.iter().position(|w| !w.is_finite() || *w <= 0.0) {
            Some(i) => Err(DelegationError::InvalidConfig(format!(
                "weight {} must be a positive number, got {}",
                i, self.0[i]
            ))),
            None => Ok(()),
        }
    }
}

/// Divide every column by its Euclidean norm. Columns with a zero norm are
/// returned unchanged.
pub fn normalize(matrix: &[Row]) -> Vec<Row> {
    let mut norms = [0.0; CRITERIA];
    for row in matrix {
        for (norm, value) in norms.iter_mut().zip(row) {
            *norm += value * value;
        }
    }
    for norm in norms.iter_mut() {
        *norm = norm.sqrt();
    }

    matrix
        .iter()
        .map(|row| {
            let mut out = *row;
            for (value, norm) in out.iter_mut().zip(norms) {
                if norm != 0.0 {
                    *value /= norm;
                }
            }
            out
        })
        .collect()
}

pub fn apply_weights(matrix: &[Row], weights: &Weights) -> Vec<Row> {
    matrix
        .iter()
        .map(|row| {
            let mut out = *row;
            for (value, weight) in out.iter_mut().zip(weights.0) {
                *value *= weight;
            }
            out
        })
        .collect()
}

/// Ideal and anti-ideal points of a weighted matrix.
///
/// Benefit columns take the maximum as ideal; cost columns take the minimum.
pub fn ideal_solutions(matrix: &[Row]) -> (Row, Row) {
    let mut max = [f64::NEG_INFINITY; CRITERIA];
    let mut min = [f64::INFINITY; CRITERIA];
    for row in matrix {
        for j in 0..CRITERIA {
            max[j] = max[j].max(row[j]);
            min[j] = min[j].min(row[j]);
        }
    }

    let mut ideal = max;
    let mut anti_ideal = min;
    for (j, direction) in DIRECTIONS.iter().enumerate() {
        if *direction == Direction::Cost {
            ideal[j] = min[j];
            anti_ideal[j] = max[j];
        }
    }
    (ideal, anti_ideal)
}

fn distance(a: &Row, b: &Row) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Preference score of every row, in input order.
///
/// A row that is both the ideal and the anti-ideal (all rows identical) scores
/// 1.0. Non-finite scores collapse to 0.0 so they rank last.
pub fn preferences(metrics: &[MetricVector], weights: &Weights) -> Vec<f64> {
    if metrics.is_empty() {
        return Vec::new();
    }

    let raw: Vec<Row> = metrics.iter().map(|m| m.0).collect();
    let weighted = apply_weights(&normalize(&raw), weights);
    let (ideal, anti_ideal) = ideal_solutions(&weighted);

    weighted
        .iter()
        .map(|row| {
            let d_pos = distance(row, &ideal);
            let d_neg = distance(row, &anti_ideal);
            let total = d_pos + d_neg;
            if total == 0.0 {
                1.0
            } else {
                let preference = d_neg / total;
                if preference.is_finite() {
                    preference
                } else {
                    0.0
                }
            }
        })
        .collect()
}

/// Rank scores descending. Equal scores keep ascending index order.
pub fn rank(preferences: &[f64]) -> Vec<Alternative> {
    let mut alternatives: Vec<Alternative> = preferences
        .iter()
        .enumerate()
        .map(|(i, preference)| Alternative {
            index: i + 1,
            preference: *preference,
        })
        .collect();
    alternatives.sort_by(|a, b| b.preference.total_cmp(&a.preference));
    alternatives
}
