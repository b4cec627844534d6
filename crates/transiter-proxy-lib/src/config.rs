use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

/// Transiter system queried when none is configured.
pub const DEFAULT_SYSTEM_ID: &str = "us-ny-subway";

/// Default per-call timeout against the upstream host.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Connection location and timeouts for the upstream Transiter host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Host as configured: either `host[:port]` or a full `http(s)://` URL.
    pub host: String,
    pub system_id: String,
    pub call_timeout: Duration,
}

impl UpstreamConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            system_id: DEFAULT_SYSTEM_ID.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_system(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = system_id.into();
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Connect timeout, a fraction of the call timeout so a slow handshake
    /// still leaves room for the request itself.
    pub fn connect_timeout(&self) -> Duration {
        self.call_timeout / 2
    }

    /// Parse the configured host into a base URL, defaulting the scheme to
    /// plain HTTP as the upstream is only reachable inside the VPC.
    pub fn base_url(&self) -> Result<Url> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "upstream host is empty".to_string(),
            });
        }

        let candidate = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let url = Url::parse(&candidate).map_err(|e| Error::InvalidConfig {
            message: format!("cannot parse upstream host '{}': {}", self.host, e),
        })?;

        if url.cannot_be_a_base() {
            return Err(Error::InvalidConfig {
                message: format!("upstream host '{}' is not a base URL", self.host),
            });
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        let url = UpstreamConfig::new("transiter.internal:8080")
            .base_url()
            .unwrap();
        assert_eq!(url.as_str(), "http://transiter.internal:8080/");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = UpstreamConfig::new("https://transiter.example.com/api/")
            .base_url()
            .unwrap();
        assert_eq!(url.as_str(), "https://transiter.example.com/api");
    }

    #[test]
    fn empty_host_is_rejected() {
        let err = UpstreamConfig::new("  ").base_url().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn defaults() {
        let config = UpstreamConfig::new("localhost");
        assert_eq!(config.system_id, DEFAULT_SYSTEM_ID);
        assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);
        assert_eq!(config.connect_timeout(), Duration::from_millis(1_500));
    }
}
