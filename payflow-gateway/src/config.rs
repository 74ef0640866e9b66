//! Gateway configuration (`SPEC_FULL.md` §8.1).
//!
//! TOML-loadable via the `config` crate, with `PAYFLOW_*` environment
//! overrides applied afterward, mirroring the teacher's two-phase
//! `Config::load` / `Config::apply_env_overrides` pattern in
//! `ultrafast-gateway/src/config.rs`. Unlike the teacher's `Config` there
//! is no `[server]`, `[auth]`, `[cache]`, or `[plugins]` section: this
//! gateway is an embedded library with no HTTP/JWT/Redis/plugin surface
//! (`spec.md` §1 non-goals).

use serde::{Deserialize, Serialize};

use payflow_core::models::{ErrorKind, RoutingStrategy};

use crate::error::ConfigError;

/// Root configuration object passed into `PaymentGateway::new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub routing: RoutingSection,
    pub retry: RetrySection,
    pub circuit_breaker: CircuitBreakerSection,
    pub logging: LoggingSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            routing: RoutingSection::default(),
            retry: RetrySection::default(),
            circuit_breaker: CircuitBreakerSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSection {
    pub strategy: RoutingStrategy,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::default(),
        }
    }
}

/// `SPEC_FULL.md` §8.1 `RetryConfig` section (`SPEC_FULL.md` §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub initial_delay_secs: f64,
    pub backoff_multiplier: f64,
    pub max_delay_secs: f64,
    pub retry_on_errors: Vec<ErrorKind>,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_secs: 1.0,
            backoff_multiplier: 2.0,
            max_delay_secs: 60.0,
            retry_on_errors: ErrorKind::default_retryable().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSection {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerSection {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 30,
            half_open_max_calls: 3,
        }
    }
}

impl From<&CircuitBreakerSection> for payflow_core::circuit_breaker::CircuitBreakerConfig {
    fn from(section: &CircuitBreakerSection) -> Self {
        Self {
            failure_threshold: section.failure_threshold,
            timeout_seconds: section.timeout_seconds,
            half_open_max_calls: section.half_open_max_calls,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub log_directory: String,
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_directory: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from a TOML file, falling back to defaults for
    /// any section the file omits, then applies `PAYFLOW_*` environment
    /// overrides. Mirrors `ultrafast-gateway::config::Config::load`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("PAYFLOW").separator("__"));

        let built = builder.build()?;
        let mut cfg: GatewayConfig = built.try_deserialize().unwrap_or_default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies the three `PAYFLOW_*` overrides named in `SPEC_FULL.md`
    /// §8.1 on top of whatever the file (or defaults) already set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(dir) = std::env::var("PAYFLOW_LOG_DIR") {
            self.logging.log_directory = dir;
        }
        if let Ok(strategy) = std::env::var("PAYFLOW_ROUTING_STRATEGY") {
            self.routing.strategy = parse_routing_strategy(&strategy)?;
        }
        if let Ok(max_attempts) = std::env::var("PAYFLOW_MAX_ATTEMPTS") {
            self.retry.max_attempts = max_attempts
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid PAYFLOW_MAX_ATTEMPTS: {max_attempts}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Validation("retry.max_attempts must be >= 1".to_string()));
        }
        if self.retry.initial_delay_secs < 0.0 || self.retry.max_delay_secs < 0.0 {
            return Err(ConfigError::Validation("retry delays must be non-negative".to_string()));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::Validation("retry.backoff_multiplier must be >= 1.0".to_string()));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Validation(
                "circuit_breaker.failure_threshold must be >= 1".to_string(),
            ));
        }
        if self.circuit_breaker.half_open_max_calls == 0 {
            return Err(ConfigError::Validation(
                "circuit_breaker.half_open_max_calls must be >= 1".to_string(),
            ));
        }
        if self.logging.log_directory.trim().is_empty() {
            return Err(ConfigError::Validation("logging.log_directory must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_routing_strategy(raw: &str) -> Result<RoutingStrategy, ConfigError> {
    match raw {
        "health_based" => Ok(RoutingStrategy::HealthBased),
        "round_robin" => Ok(RoutingStrategy::RoundRobin),
        "failover" => Ok(RoutingStrategy::Failover),
        "card_network_optimized" => Ok(RoutingStrategy::CardNetworkOptimized),
        "cost_optimized" => Ok(RoutingStrategy::CostOptimized),
        other => Err(ConfigError::Validation(format!("unknown routing strategy: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GatewayConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let mut cfg = GatewayConfig::default();
        cfg.retry.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_override_sets_log_directory() {
        std::env::set_var("PAYFLOW_LOG_DIR", "/tmp/payflow-test-logs");
        let mut cfg = GatewayConfig::default();
        cfg.apply_env_overrides().unwrap();
        assert_eq!(cfg.logging.log_directory, "/tmp/payflow-test-logs");
        std::env::remove_var("PAYFLOW_LOG_DIR");
    }
}
