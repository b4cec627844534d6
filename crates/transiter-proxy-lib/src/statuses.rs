//! `routeStatuses`: one route lookup per unique requested route.

use tracing::debug;

use crate::assemble::{assemble_statuses, Assembled, RouteLookup};
use crate::client::Upstream;
use crate::fanout::{fan_out, FAN_OUT_LIMIT};
use crate::model::{RouteStatus, RouteStatusQuery};

/// Resolve the status of every route in the query.
///
/// Never fails as a whole: a route the upstream cannot answer for is reported
/// with the `unknown` status. When the query asks for the running flag, a
/// trip listing is fetched for each resolved route; a failed listing leaves
/// the flag unset.
///
/// Routes only carry alert previews. When any resolved route has one, the
/// system's alerts are listed once to fill in their messages; if that listing
/// fails the alerts keep their cause and effect, messages stay unset and the
/// failure is counted as unresolved.
pub async fn route_statuses(
    upstream: &dyn Upstream,
    query: &RouteStatusQuery,
) -> Assembled<RouteStatus> {
    let include_running = query.include_running;

    let lookups: Vec<RouteLookup> = fan_out(query.routes(), FAN_OUT_LIMIT, |route_id| async move {
        let result = match upstream.route(route_id).await {
            Ok(route) => {
                let running = if include_running {
                    upstream
                        .route_trips(route_id)
                        .await
                        .ok()
                        .map(|trips| !trips.is_empty())
                } else {
                    None
                };
                Ok((route, running))
            }
            Err(err) => Err(err),
        };
        (route_id.clone(), result)
    })
    .await;

    let has_alerts = lookups
        .iter()
        .any(|(_, result)| matches!(result, Ok((route, _)) if !route.alerts.is_empty()));
    if !has_alerts {
        return assemble_statuses(lookups, &[]);
    }

    match upstream.alerts().await {
        Ok(details) => assemble_statuses(lookups, &details),
        Err(err) => {
            debug!(error = %err, "alert messages unavailable, keeping previews");
            let mut assembled = assemble_statuses(lookups, &[]);
            assembled.unresolved.push(err);
            assembled
        }
    }
}
