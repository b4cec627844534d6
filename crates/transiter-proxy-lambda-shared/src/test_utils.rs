//! Test utilities for resolver handler testing.
//!
//! Re-exports the in-memory upstream from the library and adds builders for
//! AppSync invocation payloads and runtimes wired to a fake upstream.
//!
//! ```ignore
//! use transiter_proxy_lambda_shared::test_utils::{
//!     fake_runtime, mock_request_id, nearby_event, FakeUpstream,
//! };
//!
//! let upstream = Arc::new(FakeUpstream::new());
//! let runtime = fake_runtime(upstream.clone());
//! let payload = nearby_event(json!({"lat": 40.0, "lon": -73.0}));
//! let request_id = mock_request_id("nearby-1");
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

pub use transiter_proxy_lib::test_helpers::{
    alert_detail, alert_preview, north_of, route, route_with_alert, route_with_alerts, stop_at,
    stop_time, stop_with_times, FakeUpstream,
};

use crate::deadline::DeadlinePolicy;
use crate::runtime::ProxyRuntime;

/// Create a mock request ID for testing.
///
/// `lambda_runtime::Context` is non-exhaustive, so tests pass the request
/// ID directly to the dispatcher.
pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{}", suffix)
}

/// A runtime over `upstream` with the default deadline policy.
pub fn fake_runtime(upstream: Arc<FakeUpstream>) -> ProxyRuntime {
    ProxyRuntime::new(upstream, DeadlinePolicy::default())
}

/// A runtime over `upstream` whose translations may run for `budget`.
pub fn fake_runtime_with_budget(upstream: Arc<FakeUpstream>, budget: Duration) -> ProxyRuntime {
    ProxyRuntime::new(upstream, DeadlinePolicy::new(budget, Duration::ZERO))
}

/// AppSync direct resolver event for `field` with the given arguments.
pub fn appsync_event(field: &str, arguments: Value) -> Value {
    json!({
        "arguments": arguments,
        "identity": null,
        "source": null,
        "info": {
            "fieldName": field,
            "parentTypeName": "Query",
            "variables": {}
        }
    })
}

/// `nearbyTrainTimes` event.
pub fn nearby_event(arguments: Value) -> Value {
    appsync_event("nearbyTrainTimes", arguments)
}

/// `routeStatuses` event whose selection set is `selection`.
pub fn route_statuses_event(routes: &[&str], selection: &str) -> Value {
    let mut event = appsync_event("routeStatuses", json!({ "routes": routes }));
    event["info"]["selectionSetGraphQL"] = Value::String(selection.to_string());
    event
}
