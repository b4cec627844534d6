//! Lambda runtime state built once at cold start.
//!
//! The runtime holds the upstream client (and with it the HTTP connection
//! pool) together with the deadline policy. Construction logs its timing so
//! cold-start cost shows up in CloudWatch:
//!
//! - `client_init_ms`: time to build the HTTP client
//! - `total_init_ms`: total initialization time

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use transiter_proxy_lib::{Error as LibError, TransiterClient, Upstream};

use crate::config::ProxyConfig;
use crate::deadline::DeadlinePolicy;

/// Error during runtime initialization.
#[derive(Debug, Clone)]
pub struct InitError {
    pub message: String,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lambda initialization failed: {}", self.message)
    }
}

impl std::error::Error for InitError {}

impl From<LibError> for InitError {
    fn from(err: LibError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// State shared by every invocation handled by this execution environment.
#[derive(Clone)]
pub struct ProxyRuntime {
    upstream: Arc<dyn Upstream>,
    deadline: DeadlinePolicy,
}

impl std::fmt::Debug for ProxyRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyRuntime")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl ProxyRuntime {
    /// Assemble a runtime around any upstream implementation.
    pub fn new(upstream: Arc<dyn Upstream>, deadline: DeadlinePolicy) -> Self {
        Self { upstream, deadline }
    }

    /// Build the HTTP upstream client described by `config`.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, InitError> {
        let total_start = Instant::now();

        info!(
            system = %config.upstream.system_id,
            call_timeout_ms = config.upstream.call_timeout.as_millis() as u64,
            time_budget_ms = config.deadline.time_budget.as_millis() as u64,
            safety_margin_ms = config.deadline.safety_margin.as_millis() as u64,
            "initializing Lambda runtime"
        );

        let client_start = Instant::now();
        let client = TransiterClient::new(&config.upstream).map_err(|e| {
            error!(error = %e, "failed to build upstream client");
            InitError::from(e)
        })?;
        let client_init_ms = client_start.elapsed().as_millis() as u64;

        info!(
            client_init_ms,
            total_init_ms = total_start.elapsed().as_millis() as u64,
            "Lambda runtime initialization complete"
        );

        Ok(Self::new(Arc::new(client), config.deadline))
    }

    /// Read the environment and build the runtime.
    pub fn from_env() -> Result<Self, InitError> {
        let config = ProxyConfig::from_env().map_err(|e| {
            error!(error = %e, "invalid Lambda configuration");
            e
        })?;
        Self::from_config(&config)
    }

    pub fn upstream(&self) -> &dyn Upstream {
        self.upstream.as_ref()
    }

    pub fn deadline(&self) -> &DeadlinePolicy {
        &self.deadline
    }
}
