//! Environment-driven configuration, read once at cold start.
//!
//! # Environment Variables
//!
//! - `TRANSITER_HOST`: upstream host, `host[:port]` or a full URL (required)
//! - `TRANSITER_SYSTEM`: Transiter system id (default: `us-ny-subway`)
//! - `TRANSITER_CALL_TIMEOUT_MS`: per-call timeout (default: 3000)
//! - `PROXY_TIME_BUDGET_MS`: invocation budget (default: 10000)
//! - `PROXY_DEADLINE_MARGIN_MS`: reserved tail of the budget (default: 1500)

use std::time::Duration;

use transiter_proxy_lib::config::{DEFAULT_CALL_TIMEOUT, DEFAULT_SYSTEM_ID};
use transiter_proxy_lib::UpstreamConfig;

use crate::deadline::{DeadlinePolicy, DEFAULT_SAFETY_MARGIN, DEFAULT_TIME_BUDGET};
use crate::runtime::InitError;

pub const ENV_TRANSITER_HOST: &str = "TRANSITER_HOST";
pub const ENV_TRANSITER_SYSTEM: &str = "TRANSITER_SYSTEM";
pub const ENV_CALL_TIMEOUT_MS: &str = "TRANSITER_CALL_TIMEOUT_MS";
pub const ENV_TIME_BUDGET_MS: &str = "PROXY_TIME_BUDGET_MS";
pub const ENV_DEADLINE_MARGIN_MS: &str = "PROXY_DEADLINE_MARGIN_MS";

/// Resolved proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub upstream: UpstreamConfig,
    pub deadline: DeadlinePolicy,
}

impl ProxyConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, InitError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get(ENV_TRANSITER_HOST).ok_or_else(|| InitError {
            message: format!("{} must be set", ENV_TRANSITER_HOST),
        })?;
        let system = get(ENV_TRANSITER_SYSTEM).unwrap_or_else(|| DEFAULT_SYSTEM_ID.to_string());
        let call_timeout = millis(ENV_CALL_TIMEOUT_MS, get(ENV_CALL_TIMEOUT_MS), DEFAULT_CALL_TIMEOUT)?;
        let time_budget = millis(ENV_TIME_BUDGET_MS, get(ENV_TIME_BUDGET_MS), DEFAULT_TIME_BUDGET)?;
        let safety_margin = millis(
            ENV_DEADLINE_MARGIN_MS,
            get(ENV_DEADLINE_MARGIN_MS),
            DEFAULT_SAFETY_MARGIN,
        )?;

        let deadline = DeadlinePolicy::new(time_budget, safety_margin);
        if safety_margin >= time_budget {
            return Err(InitError {
                message: format!(
                    "{} ({} ms) must be smaller than {} ({} ms)",
                    ENV_DEADLINE_MARGIN_MS,
                    safety_margin.as_millis(),
                    ENV_TIME_BUDGET_MS,
                    time_budget.as_millis()
                ),
            });
        }
        if call_timeout >= deadline.usable_budget() {
            return Err(InitError {
                message: format!(
                    "{} ({} ms) must be shorter than the usable budget ({} ms)",
                    ENV_CALL_TIMEOUT_MS,
                    call_timeout.as_millis(),
                    deadline.usable_budget().as_millis()
                ),
            });
        }

        let upstream = UpstreamConfig::new(host)
            .with_system(system)
            .with_call_timeout(call_timeout);
        upstream.base_url()?;

        Ok(Self { upstream, deadline })
    }
}

fn millis(key: &str, raw: Option<String>, default: Duration) -> Result<Duration, InitError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(InitError {
                message: format!("{} must be a positive number of milliseconds, got '{}'", key, value),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_host_is_set() {
        let config = ProxyConfig::from_lookup(lookup(&[(ENV_TRANSITER_HOST, "10.0.1.5:8080")])).unwrap();

        assert_eq!(config.upstream.host, "10.0.1.5:8080");
        assert_eq!(config.upstream.system_id, DEFAULT_SYSTEM_ID);
        assert_eq!(config.upstream.call_timeout, DEFAULT_CALL_TIMEOUT);
        assert_eq!(config.deadline, DeadlinePolicy::default());
    }

    #[test]
    fn missing_host_fails() {
        let err = ProxyConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.message.contains(ENV_TRANSITER_HOST));

        let err = ProxyConfig::from_lookup(lookup(&[(ENV_TRANSITER_HOST, "  ")])).unwrap_err();
        assert!(err.message.contains(ENV_TRANSITER_HOST));
    }

    #[test]
    fn overrides_are_read() {
        let config = ProxyConfig::from_lookup(lookup(&[
            (ENV_TRANSITER_HOST, "https://transiter.internal"),
            (ENV_TRANSITER_SYSTEM, "us-ny-path"),
            (ENV_CALL_TIMEOUT_MS, "1000"),
            (ENV_TIME_BUDGET_MS, "5000"),
            (ENV_DEADLINE_MARGIN_MS, "500"),
        ]))
        .unwrap();

        assert_eq!(config.upstream.system_id, "us-ny-path");
        assert_eq!(config.upstream.call_timeout, Duration::from_secs(1));
        assert_eq!(config.deadline.usable_budget(), Duration::from_millis(4_500));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = ProxyConfig::from_lookup(lookup(&[
            (ENV_TRANSITER_HOST, "transiter"),
            (ENV_CALL_TIMEOUT_MS, "3s"),
        ]))
        .unwrap_err();
        assert!(err.message.contains(ENV_CALL_TIMEOUT_MS));
    }

    #[test]
    fn call_timeout_must_fit_inside_deadline() {
        let err = ProxyConfig::from_lookup(lookup(&[
            (ENV_TRANSITER_HOST, "transiter"),
            (ENV_CALL_TIMEOUT_MS, "9000"),
        ]))
        .unwrap_err();
        assert!(err.message.contains("usable budget"));
    }

    #[test]
    fn margin_must_be_smaller_than_budget() {
        let err = ProxyConfig::from_lookup(lookup(&[
            (ENV_TRANSITER_HOST, "transiter"),
            (ENV_TIME_BUDGET_MS, "1000"),
            (ENV_DEADLINE_MARGIN_MS, "1000"),
        ]))
        .unwrap_err();
        assert!(err.message.contains(ENV_DEADLINE_MARGIN_MS));
    }
}
