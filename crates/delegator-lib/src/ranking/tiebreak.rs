//! Random reordering of near-tied top candidates
//!
//! Candidates whose score is within a threshold of the best one are shuffled
//! so repeated delegations spread over equally good clusters.

use crate::error::{DelegationError, Result};
use crate::models::Alternative;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How far below the top score an alternative may be and still count as tied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakThreshold {
    /// Fraction of the top score (0.1 means within 10% of the best)
    Relative(f64),
    /// Fixed score difference
    Absolute(f64),
}

impl Default for TieBreakThreshold {
    fn default() -> Self {
        TieBreakThreshold::Relative(0.1)
    }
}

impl TieBreakThreshold {
    pub fn validate(&self) -> Result<()> {
        let value = match self {
            TieBreakThreshold::Relative(v) | TieBreakThreshold::Absolute(v) => *v,
        };
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(DelegationError::InvalidConfig(format!(
                "tie-break threshold must be a non-negative number, got {}",
                value
            )))
        }
    }

    /// Absolute threshold for a ranking whose best score is `top`
    pub fn resolve(&self, top: f64) -> f64 {
        match self {
            TieBreakThreshold::Relative(fraction) => top * fraction,
            TieBreakThreshold::Absolute(value) => *value,
        }
    }
}

/// Length of the near-tied prefix of a descending ranking.
///
/// The scan starts after the top alternative and stops at the first one whose
/// distance to the top score is not strictly below `threshold`.
pub fn near_set_len(ranked: &[Alternative], threshold: f64) -> usize {
    let Some(top) = ranked.first() else {
        return 0;
    };
    1 + ranked[1..]
        .iter()
        .take_while(|alt| (top.preference - alt.preference).abs() < threshold)
        .count()
}

/// Shuffle the near-tied prefix of `ranked` and keep the rest in rank order
pub fn reorganize<R: Rng + ?Sized>(
    mut ranked: Vec<Alternative>,
    threshold: f64,
    rng: &mut R,
) -> Vec<Alternative> {
    let near = near_set_len(&ranked, threshold);
    ranked[..near].shuffle(rng);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn alt(index: usize, preference: f64) -> Alternative {
        Alternative { index, preference }
    }

    #[test]
    fn test_close_pair_swaps_and_tail_stays() {
        let ranked = vec![alt(1, 0.81), alt(2, 0.80), alt(3, 0.40)];
        let mut seen_first = std::collections::HashSet::new();

        for seed in 0..64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let out = reorganize(ranked.clone(), 0.05, &mut rng);

            assert_eq!(out[2], alt(3, 0.40));
            seen_first.insert(out[0].index);
        }

        assert_eq!(seen_first.len(), 2, "both near candidates should lead at some point");
    }

    #[test]
    fn test_scan_stops_at_first_gap() {
        let ranked = vec![alt(1, 0.9), alt(2, 0.5), alt(3, 0.5)];
        assert_eq!(near_set_len(&ranked, 0.1), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let ranked = vec![alt(1, 0.75), alt(2, 0.5)];
        assert_eq!(near_set_len(&ranked, 0.25), 1);
        assert_eq!(near_set_len(&ranked, 0.2500001), 2);
    }

    #[test]
    fn test_empty_and_single() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(reorganize(Vec::new(), 0.1, &mut rng).is_empty());
        assert_eq!(reorganize(vec![alt(4, 0.3)], 0.1, &mut rng), vec![alt(4, 0.3)]);
    }

    #[test]
    fn test_threshold_resolution() {
        assert!((TieBreakThreshold::Relative(0.1).resolve(0.8) - 0.08).abs() < 1e-12);
        assert_eq!(TieBreakThreshold::Absolute(0.05).resolve(0.8), 0.05);
        assert!(TieBreakThreshold::Relative(-1.0).validate().is_err());
        assert!(TieBreakThreshold::Absolute(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_threshold_deserialize() {
        let relative: TieBreakThreshold = serde_json::from_str(r#"{"relative": 0.33}"#).unwrap();
        assert_eq!(relative, TieBreakThreshold::Relative(0.33));
    }

    proptest! {
        #[test]
        fn reorganize_only_permutes_near_prefix(
            seed: u64,
            mut scores in prop::collection::vec(0.0..=1.0f64, 1..12),
            threshold in 0.0..0.5f64,
        ) {
            scores.sort_by(|a, b| b.total_cmp(a));
            let ranked: Vec<Alternative> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| alt(i + 1, *s))
                .collect();
            let near = near_set_len(&ranked, threshold);

            let mut rng = SmallRng::seed_from_u64(seed);
            let out = reorganize(ranked.clone(), threshold, &mut rng);

            prop_assert_eq!(out.len(), ranked.len());
            prop_assert_eq!(&out[near..], &ranked[near..]);

            let mut head: Vec<usize> = out[..near].iter().map(|a| a.index).collect();
            head.sort_unstable();
            prop_assert_eq!(head, (1..=near).collect::<Vec<_>>());
        }
    }
}
