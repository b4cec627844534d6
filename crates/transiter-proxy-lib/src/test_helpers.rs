//! In-memory upstream fixture and wire-type builders for tests.
//!
//! Available to this crate's unit tests and, through the `test-helpers`
//! feature, to dependent crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::Upstream;
use crate::error::UpstreamError;
use crate::model::Coordinate;
use crate::transiter::{
    Alert, EstimatedTime, Route, RouteReference, Stop, StopTime, Timestamp, TranslatedText, Trip,
    TripReference,
};

/// Deterministic [`Upstream`] backed by canned replies.
///
/// Unknown stops and routes answer not-found; unknown trip lists are empty.
/// Every method counts its calls so tests can assert how much upstream work
/// an invocation caused.
#[derive(Debug)]
pub struct FakeUpstream {
    nearby: Result<Vec<Stop>, UpstreamError>,
    stops: HashMap<String, Result<Stop, UpstreamError>>,
    routes: HashMap<String, Result<Route, UpstreamError>>,
    trips: HashMap<String, Vec<Trip>>,
    alerts: Result<Vec<Alert>, UpstreamError>,
    hang: bool,
    nearby_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    route_calls: AtomicUsize,
    trip_calls: AtomicUsize,
    alert_calls: AtomicUsize,
    requested_routes: Mutex<Vec<String>>,
}

impl Default for FakeUpstream {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self {
            nearby: Ok(Vec::new()),
            stops: HashMap::new(),
            routes: HashMap::new(),
            trips: HashMap::new(),
            alerts: Ok(Vec::new()),
            hang: false,
            nearby_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            route_calls: AtomicUsize::new(0),
            trip_calls: AtomicUsize::new(0),
            alert_calls: AtomicUsize::new(0),
            requested_routes: Mutex::new(Vec::new()),
        }
    }

    /// Proximity lookup reply. Stops are returned in the given order.
    pub fn with_nearby_stops(mut self, stops: Vec<Stop>) -> Self {
        self.nearby = Ok(stops);
        self
    }

    pub fn with_nearby_error(mut self, err: UpstreamError) -> Self {
        self.nearby = Err(err);
        self
    }

    pub fn with_stop(mut self, stop: Stop) -> Self {
        self.stops.insert(stop.id.clone(), Ok(stop));
        self
    }

    pub fn with_stop_error(mut self, stop_id: &str, err: UpstreamError) -> Self {
        self.stops.insert(stop_id.to_string(), Err(err));
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.routes.insert(route.id.clone(), Ok(route));
        self
    }

    pub fn with_route_error(mut self, route_id: &str, err: UpstreamError) -> Self {
        self.routes.insert(route_id.to_string(), Err(err));
        self
    }

    pub fn with_trips(mut self, route_id: &str, count: usize) -> Self {
        let trips = (0..count)
            .map(|n| Trip {
                id: format!("{}-trip-{}", route_id, n),
            })
            .collect();
        self.trips.insert(route_id.to_string(), trips);
        self
    }

    /// System alert listing reply.
    pub fn with_alerts(mut self, alerts: Vec<Alert>) -> Self {
        self.alerts = Ok(alerts);
        self
    }

    pub fn with_alerts_error(mut self, err: UpstreamError) -> Self {
        self.alerts = Err(err);
        self
    }

    /// Never answer any call.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn nearby_calls(&self) -> usize {
        self.nearby_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn route_calls(&self) -> usize {
        self.route_calls.load(Ordering::SeqCst)
    }

    pub fn trip_calls(&self) -> usize {
        self.trip_calls.load(Ordering::SeqCst)
    }

    pub fn alert_calls(&self) -> usize {
        self.alert_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.nearby_calls()
            + self.stop_calls()
            + self.route_calls()
            + self.trip_calls()
            + self.alert_calls()
    }

    /// Route ids passed to [`Upstream::route`], in call order.
    pub fn requested_routes(&self) -> Vec<String> {
        self.requested_routes
            .lock()
            .map(|routes| routes.clone())
            .unwrap_or_default()
    }

    async fn maybe_hang(&self) {
        if self.hang {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn nearby_stops(
        &self,
        _coordinate: Coordinate,
        _radius_km: f64,
    ) -> Result<Vec<Stop>, UpstreamError> {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        self.nearby.clone()
    }

    async fn stop(&self, stop_id: &str) -> Result<Stop, UpstreamError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        self.stops
            .get(stop_id)
            .cloned()
            .unwrap_or_else(|| Err(UpstreamError::not_found(stop_id)))
    }

    async fn route(&self, route_id: &str) -> Result<Route, UpstreamError> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested_routes.lock() {
            requested.push(route_id.to_string());
        }
        self.maybe_hang().await;
        self.routes
            .get(route_id)
            .cloned()
            .unwrap_or_else(|| Err(UpstreamError::not_found(route_id)))
    }

    async fn route_trips(&self, route_id: &str) -> Result<Vec<Trip>, UpstreamError> {
        self.trip_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        Ok(self.trips.get(route_id).cloned().unwrap_or_default())
    }

    async fn alerts(&self) -> Result<Vec<Alert>, UpstreamError> {
        self.alert_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_hang().await;
        self.alerts.clone()
    }
}

/// A stop time for `trip_id` on `route_id` arriving at `arrival` (Unix seconds).
pub fn stop_time(trip_id: &str, route_id: &str, arrival: i64) -> StopTime {
    StopTime {
        trip: Some(TripReference {
            id: trip_id.to_string(),
            route: Some(RouteReference {
                id: route_id.to_string(),
            }),
        }),
        arrival: Some(EstimatedTime {
            time: Some(Timestamp::Text(arrival.to_string())),
        }),
        departure: None,
    }
}

/// A stop at a coordinate, as returned by the proximity lookup (no times).
pub fn stop_at(id: &str, latitude: f64, longitude: f64) -> Stop {
    Stop {
        id: id.to_string(),
        name: Some(format!("Stop {}", id)),
        latitude: Some(latitude),
        longitude: Some(longitude),
        stop_times: None,
    }
}

/// A stop carrying stop times, as returned by the per-stop lookup.
pub fn stop_with_times(id: &str, stop_times: Vec<StopTime>) -> Stop {
    Stop {
        id: id.to_string(),
        name: Some(format!("Stop {}", id)),
        latitude: None,
        longitude: None,
        stop_times: Some(stop_times),
    }
}

/// A route with no active alerts.
pub fn route(id: &str) -> Route {
    Route {
        id: id.to_string(),
        alerts: Vec::new(),
    }
}

/// A route with one alert preview `{id}-alert` carrying `effect`.
pub fn route_with_alert(id: &str, effect: &str) -> Route {
    route_with_alerts(id, vec![alert_preview(&format!("{}-alert", id), effect)])
}

pub fn route_with_alerts(id: &str, alerts: Vec<Alert>) -> Route {
    Route {
        id: id.to_string(),
        alerts,
    }
}

/// An alert as previewed in a route reply: id, cause and effect only.
pub fn alert_preview(id: &str, effect: &str) -> Alert {
    Alert {
        id: id.to_string(),
        cause: Some("UNKNOWN_CAUSE".to_string()),
        effect: Some(effect.to_string()),
        ..Alert::default()
    }
}

/// An alert as listed by the system, with English header and description
/// and a status page URL.
pub fn alert_detail(id: &str, header: &str, description: &str) -> Alert {
    let english = |text: &str| {
        vec![TranslatedText {
            text: text.to_string(),
            language: Some("en".to_string()),
        }]
    };
    Alert {
        id: id.to_string(),
        cause: Some("UNKNOWN_CAUSE".to_string()),
        effect: None,
        header: english(header),
        description: english(description),
        url: english(&format!("https://status.example/alerts/{}", id)),
    }
}

/// Latitude `km` kilometres north of `latitude` along a meridian.
pub fn north_of(latitude: f64, km: f64) -> f64 {
    latitude + km / 111.195
}
