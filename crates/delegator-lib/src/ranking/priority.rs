//! Linear mapping of scores and raw metrics onto the integer priority scale

use crate::error::{DelegationError, Result};

/// Upper bound of the computed priority scale
pub const PRIORITY_MAX: i64 = 100;

/// Lower bound of the computed priority scale
pub const PRIORITY_MIN: i64 = 0;

/// Map `value` from `[domain_min, domain_max]` onto `[range_min, range_max]`,
/// inverted: `domain_min` lands on `range_max` and `domain_max` on
/// `range_min`. The result is truncated toward zero and clamped to the range.
pub fn map_range(
    value: f64,
    domain_min: f64,
    domain_max: f64,
    range_max: i64,
    range_min: i64,
) -> Result<i64> {
    if domain_max == domain_min || !domain_min.is_finite() || !domain_max.is_finite() {
        return Err(DelegationError::InvalidRange {
            min: domain_min,
            max: domain_max,
        });
    }
    if range_min > range_max {
        return Err(DelegationError::InvalidRange {
            min: range_min as f64,
            max: range_max as f64,
        });
    }

    let span = (range_max - range_min) as f64;
    let mapped = range_max as f64 - span * (value - domain_min) / (domain_max - domain_min);

    Ok((mapped as i64).clamp(range_min, range_max))
}

/// Priority of a TOPSIS preference in `[0, 1]`: the best score maps to 0
pub fn score_priority(preference: f64) -> Result<i64> {
    map_range(preference, 0.0, 1.0, PRIORITY_MAX, PRIORITY_MIN)
}
