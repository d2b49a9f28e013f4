//! Delegation configuration
//!
//! Supplied once at process start and immutable afterward.

use crate::error::{DelegationError, Result};
use crate::models::Candidate;
use crate::ranking::{TieBreakThreshold, Weights};
use crate::strategy::{DelegationStrategy, RankingSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationConfig {
    /// Clusters a job may be delegated to
    #[serde(default)]
    pub candidates: Vec<Candidate>,

    #[serde(default)]
    pub strategy: DelegationStrategy,

    /// TOPSIS criterion weights
    #[serde(default)]
    pub weights: Weights,

    #[serde(default)]
    pub tie_break: TieBreakThreshold,

    /// Bound on every remote call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Free CPU (millicores) mapped to the best load-based priority
    #[serde(default = "default_cpu_ceiling")]
    pub load_based_cpu_ceiling: f64,

    /// Accept self-signed cluster certificates
    #[serde(default)]
    pub insecure_tls: bool,
}

fn default_request_timeout() -> u64 {
    20
}

fn default_cpu_ceiling() -> f64 {
    4000.0
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            strategy: DelegationStrategy::default(),
            weights: Weights::default(),
            tie_break: TieBreakThreshold::default(),
            request_timeout_secs: default_request_timeout(),
            load_based_cpu_ceiling: default_cpu_ceiling(),
            insecure_tls: false,
        }
    }
}

impl DelegationConfig {
    pub fn new(candidates: Vec<Candidate>, strategy: DelegationStrategy) -> Self {
        Self {
            candidates,
            strategy,
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ranking_settings(&self) -> RankingSettings {
        RankingSettings {
            weights: self.weights,
            tie_break: self.tie_break,
            load_based_cpu_ceiling: self.load_based_cpu_ceiling,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(DelegationError::InvalidConfig(
                "at least one candidate is required".to_string(),
            ));
        }

        for candidate in &self.candidates {
            Url::parse(&candidate.url).map_err(|e| {
                DelegationError::InvalidConfig(format!(
                    "candidate url '{}' is invalid: {}",
                    candidate.url, e
                ))
            })?;
            if candidate.service.trim().is_empty() {
                return Err(DelegationError::InvalidConfig(format!(
                    "candidate '{}' has no service",
                    candidate.url
                )));
            }
            if let Some(cpu) = candidate.cpu {
                if !cpu.is_finite() || cpu < 0.0 {
                    return Err(DelegationError::InvalidConfig(format!(
                        "candidate '{}' has invalid cpu {}",
                        candidate.url, cpu
                    )));
                }
            }
        }

        self.weights.validate()?;
        self.tie_break.validate()?;

        if self.request_timeout_secs == 0 {
            return Err(DelegationError::InvalidConfig(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !self.load_based_cpu_ceiling.is_finite() || self.load_based_cpu_ceiling <= 0.0 {
            return Err(DelegationError::InvalidConfig(format!(
                "load_based_cpu_ceiling must be positive, got {}",
                self.load_based_cpu_ceiling
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DelegationConfig {
        DelegationConfig::new(
            vec![Candidate::new("https://cluster-a.example.org", "svc").with_token("t")],
            DelegationStrategy::Topsis,
        )
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: DelegationConfig = serde_json::from_str(
            r#"{"candidates": [{"url": "https://a.example.org", "service": "blur"}]}"#,
        )
        .unwrap();

        assert_eq!(config.strategy, DelegationStrategy::Topsis);
        assert_eq!(config.weights, Weights::default());
        assert_eq!(config.tie_break, TieBreakThreshold::Relative(0.1));
        assert_eq!(config.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.load_based_cpu_ceiling, 4000.0);
        assert!(!config.insecure_tls);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_json() {
        let config: DelegationConfig = serde_json::from_str(
            r#"{
                "candidates": [
                    {"url": "https://a", "service": "blur", "user": "oscar", "password": "x", "cpu": 0.5},
                    {"url": "https://b", "service": "blur", "token": "t", "priority": 2}
                ],
                "strategy": "load-based",
                "weights": [1, 1, 1, 1, 1, 1],
                "tie_break": {"absolute": 0.05},
                "request_timeout_secs": 5,
                "insecure_tls": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.strategy, DelegationStrategy::LoadBased);
        assert_eq!(config.tie_break, TieBreakThreshold::Absolute(0.05));
        assert_eq!(config.candidates[0].cpu, Some(0.5));
        assert_eq!(config.candidates[1].priority, Some(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut config = valid();
        config.candidates[0] = config.candidates[0].clone().with_basic_auth("oscar", "hunter2");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_rejects_empty_candidates() {
        let config = DelegationConfig::default();
        assert!(matches!(config.validate(), Err(DelegationError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_url() {
        let mut config = valid();
        config.candidates.push(Candidate::new("not a url", "svc"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_weights_and_threshold() {
        let mut config = valid();
        config.weights = Weights([1.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert!(config.validate().is_err());

        let mut config = valid();
        config.tie_break = TieBreakThreshold::Relative(-0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout_and_ceiling() {
        let mut config = valid();
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.load_based_cpu_ceiling = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_cpu() {
        let mut config = valid();
        config.candidates[0].cpu = Some(-1.0);
        assert!(config.validate().is_err());
    }
}
