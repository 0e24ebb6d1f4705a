//! Engine configuration with environment overrides.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single expected constitutional hash.
///
/// Every configuration must carry exactly this value; every verdict is
/// stamped with it. A mismatch anywhere is a fatal configuration defect.
pub const CONSTITUTIONAL_HASH: &str =
    "c0857265f5a1e6d4973b85cbbb1a6a9f2be737bde0be6d3a4dbe9ad33eaf1c3e";

/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "QUORUM_";

/// What to do when the rate limiter has no tokens left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "policy")]
pub enum RateLimitPolicy {
    /// Fail immediately with `RateLimitExceeded`.
    Reject,
    /// Delay the caller up to `max_wait_ms`, then fail.
    Wait { max_wait_ms: u64 },
}

/// Errors from configuration validation or environment parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("constitutional hash mismatch: got {0:?}")]
    ConstitutionalHashMismatch(String),

    #[error("{name} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("unit count must be at least 1")]
    ZeroUnitCount,

    #[error("rate limit must be positive, got {0}")]
    NonPositiveRate(f64),

    #[error("request timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("invalid value for {key}: {value:?}")]
    InvalidEnvValue { key: String, value: String },
}

/// Validated engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Below this calibrated confidence, verdicts recommend manual review.
    pub confidence_threshold: f64,
    /// Units whose out-of-bag violation rate exceeds this are flagged.
    pub violation_threshold: f64,
    /// How long cached verdicts stay valid. Zero disables caching.
    pub cache_ttl_secs: u64,
    /// Upper bound on a whole `govern` call.
    pub request_timeout_secs: u64,
    /// Sustained requests per second per engine instance.
    pub rate_limit_rps: f64,
    /// Behavior when the rate limit is exhausted.
    pub rate_limit_policy: RateLimitPolicy,
    /// Number of decision units in the forest (B).
    pub unit_count: usize,
    /// Seed for diversity-aware bootstrap sampling; fixed for reproducible
    /// forests.
    pub sampling_seed: u64,
    /// Must equal [`CONSTITUTIONAL_HASH`].
    pub constitutional_hash: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            violation_threshold: 0.1,
            cache_ttl_secs: 300,
            request_timeout_secs: 5,
            rate_limit_rps: 10.0,
            rate_limit_policy: RateLimitPolicy::Reject,
            unit_count: 32,
            sampling_seed: 0x51_u64,
            constitutional_hash: CONSTITUTIONAL_HASH.to_string(),
        }
    }
}

impl EngineConfig {
    /// Validate the configuration.
    ///
    /// Construction-time errors are fatal; an engine must refuse to start
    /// from an invalid configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.constitutional_hash != CONSTITUTIONAL_HASH {
            return Err(ConfigError::ConstitutionalHashMismatch(
                self.constitutional_hash.clone(),
            ));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("violation_threshold", self.violation_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.unit_count == 0 {
            return Err(ConfigError::ZeroUnitCount);
        }
        if !(self.rate_limit_rps > 0.0) || !self.rate_limit_rps.is_finite() {
            return Err(ConfigError::NonPositiveRate(self.rate_limit_rps));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Build a configuration from defaults plus `QUORUM_*` environment
    /// overrides, then validate it.
    ///
    /// Recognized variables: `QUORUM_CONFIDENCE_THRESHOLD`,
    /// `QUORUM_VIOLATION_THRESHOLD`, `QUORUM_CACHE_TTL_SECS`,
    /// `QUORUM_REQUEST_TIMEOUT_SECS`, `QUORUM_RATE_LIMIT_RPS`,
    /// `QUORUM_RATE_LIMIT_MAX_WAIT_MS`, `QUORUM_UNIT_COUNT`,
    /// `QUORUM_SAMPLING_SEED`, `QUORUM_CONSTITUTIONAL_HASH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = env_parse::<f64>("CONFIDENCE_THRESHOLD")? {
            config.confidence_threshold = v;
        }
        if let Some(v) = env_parse::<f64>("VIOLATION_THRESHOLD")? {
            config.violation_threshold = v;
        }
        if let Some(v) = env_parse::<u64>("CACHE_TTL_SECS")? {
            config.cache_ttl_secs = v;
        }
        if let Some(v) = env_parse::<u64>("REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = v;
        }
        if let Some(v) = env_parse::<f64>("RATE_LIMIT_RPS")? {
            config.rate_limit_rps = v;
        }
        if let Some(v) = env_parse::<u64>("RATE_LIMIT_MAX_WAIT_MS")? {
            config.rate_limit_policy = RateLimitPolicy::Wait { max_wait_ms: v };
        }
        if let Some(v) = env_parse::<usize>("UNIT_COUNT")? {
            config.unit_count = v;
        }
        if let Some(v) = env_parse::<u64>("SAMPLING_SEED")? {
            config.sampling_seed = v;
        }
        if let Ok(v) = std::env::var(format!("{ENV_PREFIX}CONSTITUTIONAL_HASH")) {
            config.constitutional_hash = v;
        }

        config.validate()?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(suffix: &str) -> Result<Option<T>, ConfigError> {
    let key = format!("{ENV_PREFIX}{suffix}");
    match std::env::var(&key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn tampered_hash_rejected() {
        let config = EngineConfig {
            constitutional_hash: "deadbeef".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConstitutionalHashMismatch(_))
        ));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let config = EngineConfig {
            confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn zero_units_rejected() {
        let config = EngineConfig {
            unit_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroUnitCount)));
    }

    #[test]
    fn non_positive_rate_rejected() {
        let config = EngineConfig {
            rate_limit_rps: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveRate(_))
        ));
    }

    // Serializes tests that touch process environment variables.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn env_overrides_apply() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("QUORUM_CONFIDENCE_THRESHOLD", "0.8");
        std::env::set_var("QUORUM_UNIT_COUNT", "7");
        let config = EngineConfig::from_env().unwrap();
        std::env::remove_var("QUORUM_CONFIDENCE_THRESHOLD");
        std::env::remove_var("QUORUM_UNIT_COUNT");

        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(config.unit_count, 7);
    }

    #[test]
    fn malformed_env_value_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("QUORUM_RATE_LIMIT_RPS", "fast");
        let result = EngineConfig::from_env();
        std::env::remove_var("QUORUM_RATE_LIMIT_RPS");

        assert!(matches!(result, Err(ConfigError::InvalidEnvValue { .. })));
    }
}
