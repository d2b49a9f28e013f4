//! Decision engine
//!
//! This module turns a matrix of candidate telemetry into a dispatch order:
//! - TOPSIS preference scoring with fixed benefit/cost directions
//! - Random reordering of near-tied leaders
//! - Mapping of scores and raw metrics onto the integer priority scale

mod priority;
mod tiebreak;
mod topsis;

pub use priority::{map_range, score_priority, PRIORITY_MAX, PRIORITY_MIN};
pub use tiebreak::{near_set_len, reorganize, TieBreakThreshold};
pub use topsis::{
    apply_weights, ideal_solutions, normalize, preferences, rank, Direction, Weights, DIRECTIONS,
};

use crate::models::{Alternative, MetricVector};
use rand::Rng;

/// Score, rank and tie-break a metric matrix in one pass
pub fn rank_with_tiebreak<R: Rng + ?Sized>(
    metrics: &[MetricVector],
    weights: &Weights,
    threshold: TieBreakThreshold,
    rng: &mut R,
) -> Vec<Alternative> {
    let ranked = rank(&preferences(metrics, weights));
    let top = ranked.first().map(|a| a.preference).unwrap_or_default();
    reorganize(ranked, threshold.resolve(top), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_distant_scores_are_not_shuffled() {
        let metrics = [
            MetricVector::new(2.0, 2.0, 1000.0, 500.0, 60.0, 20),
            MetricVector::SENTINEL,
            MetricVector::new(0.1, 10.0, 8000.0, 3000.0, 5.0, 2),
        ];

        for seed in 0..16 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let ranked = rank_with_tiebreak(
                &metrics,
                &Weights::default(),
                TieBreakThreshold::Relative(0.1),
                &mut rng,
            );
            let order: Vec<usize> = ranked.iter().map(|a| a.index).collect();
            assert_eq!(order, vec![3, 1, 2]);
        }
    }
}
