//! Upstream access: the [`Upstream`] seam and its reqwest-backed
//! [`TransiterClient`] implementation.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::{Error, Result, UpstreamError, UpstreamErrorKind};
use crate::model::Coordinate;
use crate::transiter::{Alert, ListAlertsReply, ListStopsReply, ListTripsReply, Route, Stop, Trip};

/// Attempts per upstream call: the first try plus one retry for transient
/// failures.
pub const MAX_ATTEMPTS: u32 = 2;

/// Calls the proxy issues against the transit data service.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Stops within `radius_km` of `coordinate`, closest first.
    async fn nearby_stops(
        &self,
        coordinate: Coordinate,
        radius_km: f64,
    ) -> std::result::Result<Vec<Stop>, UpstreamError>;

    /// A single stop including its upcoming stop times.
    async fn stop(&self, stop_id: &str) -> std::result::Result<Stop, UpstreamError>;

    /// A single route including previews of its active alerts.
    async fn route(&self, route_id: &str) -> std::result::Result<Route, UpstreamError>;

    /// Trips currently running on a route.
    async fn route_trips(&self, route_id: &str) -> std::result::Result<Vec<Trip>, UpstreamError>;

    /// Every active alert in the system, with message texts.
    async fn alerts(&self) -> std::result::Result<Vec<Alert>, UpstreamError>;
}

/// HTTP client for a Transiter instance.
///
/// Wraps a single `reqwest::Client`, so connections to the upstream host are
/// pooled across calls and across invocations of a warm Lambda.
#[derive(Debug, Clone)]
pub struct TransiterClient {
    http: Client,
    base: Url,
    system_id: String,
}

impl TransiterClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let base = config.base_url()?;
        if config.system_id.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "upstream system id is empty".to_string(),
            });
        }

        let http = Client::builder()
            .timeout(config.call_timeout)
            .connect_timeout(config.connect_timeout())
            .user_agent(user_agent())
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            http,
            base,
            system_id: config.system_id.clone(),
        })
    }

    /// Build `{base}/systems/{system}/{segments..}?{params}` with every path
    /// segment percent-encoded.
    fn url(&self, segments: &[&str], params: &[(&str, String)]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("systems")
                .push(&self.system_id)
                .extend(segments);
        }
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
        target: Option<&str>,
    ) -> std::result::Result<T, UpstreamError> {
        let url = self.url(segments, params);
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let outcome = self.fetch::<T>(url.clone()).await;
            debug!(
                path = %url.path(),
                attempt,
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = outcome.is_ok(),
                "upstream call finished"
            );

            match outcome {
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    warn!(path = %url.path(), attempt, error = %err, "retrying transient upstream failure");
                    attempt += 1;
                }
                Err(err) => {
                    return Err(match target {
                        Some(id) => err.with_target(id),
                        None => err,
                    })
                }
                Ok(value) => return Ok(value),
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, UpstreamError> {
        let response = self.http.get(url).send().await.map_err(classify)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::new(
                UpstreamErrorKind::NotFound,
                "resource does not exist",
            ));
        }
        if status.is_server_error() {
            return Err(UpstreamError::new(
                UpstreamErrorKind::Unreachable,
                format!("upstream answered {}", status),
            ));
        }
        if !status.is_success() {
            return Err(UpstreamError::new(
                UpstreamErrorKind::Rejected(status.as_u16()),
                format!("upstream answered {}", status),
            ));
        }

        let body = response.bytes().await.map_err(classify)?;
        serde_json::from_slice(&body).map_err(|e| {
            UpstreamError::new(
                UpstreamErrorKind::Malformed,
                format!("undecodable response body: {}", e),
            )
        })
    }
}

#[async_trait]
impl Upstream for TransiterClient {
    async fn nearby_stops(
        &self,
        coordinate: Coordinate,
        radius_km: f64,
    ) -> std::result::Result<Vec<Stop>, UpstreamError> {
        let params = [
            ("filter_by_distance", "true".to_string()),
            ("sort_mode", "DISTANCE".to_string()),
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("max_distance", radius_km.to_string()),
        ];
        let reply: ListStopsReply = self.get_json(&["stops"], &params, None).await?;
        Ok(reply.stops)
    }

    async fn stop(&self, stop_id: &str) -> std::result::Result<Stop, UpstreamError> {
        self.get_json(&["stops", stop_id], &[], Some(stop_id)).await
    }

    async fn route(&self, route_id: &str) -> std::result::Result<Route, UpstreamError> {
        self.get_json(&["routes", route_id], &[], Some(route_id))
            .await
    }

    async fn route_trips(&self, route_id: &str) -> std::result::Result<Vec<Trip>, UpstreamError> {
        let reply: ListTripsReply = self
            .get_json(&["routes", route_id, "trips"], &[], Some(route_id))
            .await?;
        Ok(reply.trips)
    }

    async fn alerts(&self) -> std::result::Result<Vec<Alert>, UpstreamError> {
        let reply: ListAlertsReply = self.get_json(&["alerts"], &[], Some("alerts")).await?;
        Ok(reply.alerts)
    }
}

/// Map transport-level failures onto the upstream error kinds.
fn classify(err: reqwest::Error) -> UpstreamError {
    let kind = if err.is_timeout() {
        UpstreamErrorKind::Timeout
    } else if err.is_decode() {
        UpstreamErrorKind::Malformed
    } else {
        UpstreamErrorKind::Unreachable
    };
    UpstreamError::new(kind, err.to_string())
}

fn user_agent() -> String {
    format!(
        "transiter-proxy/{version}",
        version = env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> TransiterClient {
        TransiterClient::new(&UpstreamConfig::new(host)).expect("client builds")
    }

    #[test]
    fn builds_system_scoped_urls() {
        let client = client("transiter.internal:8080");
        let url = client.url(&["routes", "A"], &[]);
        assert_eq!(
            url.as_str(),
            "http://transiter.internal:8080/systems/us-ny-subway/routes/A"
        );
    }

    #[test]
    fn escapes_path_segments_and_encodes_params() {
        let client = client("http://localhost/api");
        let url = client.url(
            &["stops", "a/b c"],
            &[("latitude", "40.5".to_string()), ("sort_mode", "DISTANCE".to_string())],
        );
        assert_eq!(
            url.as_str(),
            "http://localhost/api/systems/us-ny-subway/stops/a%2Fb%20c?latitude=40.5&sort_mode=DISTANCE"
        );
    }

    #[test]
    fn rejects_empty_system() {
        let err = TransiterClient::new(&UpstreamConfig::new("localhost").with_system(" "))
            .unwrap_err();
        assert!(err.to_string().contains("system id"));
    }
}
