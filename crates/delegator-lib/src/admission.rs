//! Capacity pre-check
//!
//! A candidate is admissible when its largest free node can hold the job's CPU
//! request. The check runs before any job history is fetched.

use crate::error::{DelegationError, Result};
use crate::models::ClusterStatus;

/// Convert fractional cores into millicores
pub fn required_millicores(cpu: f64) -> f64 {
    cpu * 1000.0
}

/// `max_free_millicores - cpu * 1000 >= 0`
pub fn is_admissible(max_free_millicores: f64, cpu: f64) -> bool {
    max_free_millicores - required_millicores(cpu) >= 0.0
}

/// Check a cluster's status against a service's CPU request.
///
/// Returns [`DelegationError::InadmissibleCapacity`] when the job does not fit.
pub fn check(service: &str, status: &ClusterStatus, cpu: f64) -> Result<()> {
    if is_admissible(status.cpu_max_free, cpu) {
        Ok(())
    } else {
        Err(DelegationError::InadmissibleCapacity {
            service: service.to_string(),
            required_millicores: required_millicores(cpu),
            max_free_millicores: status.cpu_max_free,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(cpu_max_free: f64) -> ClusterStatus {
        ClusterStatus {
            number_nodes: 1,
            memory_free_total: 1024.0,
            cpu_free_total: cpu_max_free,
            cpu_max_free,
            memory_max_free: None,
            nodes: Vec::new(),
        }
    }

    #[test]
    fn test_exact_fit_is_admissible() {
        assert!(is_admissible(500.0, 0.5));
        assert!(check("svc", &status(500.0), 0.5).is_ok());
    }

    #[test]
    fn test_insufficient_capacity() {
        let err = check("svc", &status(499.0), 0.5).unwrap_err();
        match err {
            DelegationError::InadmissibleCapacity {
                required_millicores,
                max_free_millicores,
                ..
            } => {
                assert_eq!(required_millicores, 500.0);
                assert_eq!(max_free_millicores, 499.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_request_always_fits() {
        assert!(is_admissible(0.0, 0.0));
    }
}
