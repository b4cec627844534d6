//! Shared infrastructure for the Transiter GraphQL proxy Lambda.
//!
//! - [`ProxyConfig`]: environment configuration read once at cold start
//! - [`ProxyRuntime`]: upstream client and [`DeadlinePolicy`] reused across invocations
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`ProblemDetails`]: RFC 9457 Problem Details for failed invocations
//! - [`InvocationEnvelope`] and the validated argument types of each field
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides a fake upstream and AppSync event
//! builders. Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

mod config;
mod deadline;
mod problem;
mod requests;
mod runtime;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{
    ProxyConfig, ENV_CALL_TIMEOUT_MS, ENV_DEADLINE_MARGIN_MS, ENV_TIME_BUDGET_MS,
    ENV_TRANSITER_HOST, ENV_TRANSITER_SYSTEM,
};
pub use deadline::{DeadlinePolicy, DEFAULT_SAFETY_MARGIN, DEFAULT_TIME_BUDGET};
pub use problem::{
    from_lib_error, from_upstream_error, ProblemDetails, PROBLEM_INTERNAL_ERROR,
    PROBLEM_INVALID_ARGUMENT, PROBLEM_UNSUPPORTED_FIELD, PROBLEM_UPSTREAM_MALFORMED,
    PROBLEM_UPSTREAM_REJECTED, PROBLEM_UPSTREAM_TIMEOUT, PROBLEM_UPSTREAM_UNREACHABLE,
};
pub use requests::{
    InvocationEnvelope, InvocationInfo, NearbyTrainTimesArgs, ResolverField, RouteStatusesArgs,
    Validate, MAX_STATUS_ROUTES,
};
pub use runtime::{InitError, ProxyRuntime};
pub use tracing_init::{init_tracing, LogFormat};
