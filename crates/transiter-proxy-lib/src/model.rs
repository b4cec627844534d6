//! Typed queries and the result entities produced by the translators.
//!
//! Queries are constructed by the Lambda layer after argument validation;
//! the translators trust their invariants.

use std::collections::HashSet;

/// Default search radius in kilometres (about two miles).
pub const DEFAULT_RADIUS_KM: f64 = 3.2;

/// Default number of train times returned by a nearby query.
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Hard upper bound on the number of train times a nearby query may request.
pub const MAX_RESULT_LIMIT: usize = 100;

/// Status reported for a route that has no active alerts.
pub const STATUS_NORMAL: &str = "normal";

/// Status reported for a route the upstream could not answer for.
pub const STATUS_UNKNOWN: &str = "unknown";

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Travel direction of a platform. Directional stop ids carry an `N` or `S`
/// suffix on the parent station id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
}

impl Direction {
    pub fn stop_suffix(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_uppercase().as_str() {
            "N" | "NORTH" => Ok(Direction::North),
            "S" | "SOUTH" => Ok(Direction::South),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// Query for upcoming trains near a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub coordinate: Coordinate,
    /// Search radius in kilometres; [`DEFAULT_RADIUS_KM`] when absent.
    pub radius_km: Option<f64>,
    /// Maximum number of train times returned.
    pub limit: usize,
    /// Only keep train times on these routes when set.
    pub routes: Option<HashSet<String>>,
    /// Only consider platforms serving this direction when set.
    pub direction: Option<Direction>,
}

impl NearbyQuery {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            radius_km: None,
            limit: DEFAULT_RESULT_LIMIT,
            routes: None,
            direction: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    pub fn with_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routes = Some(routes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn effective_radius(&self) -> f64 {
        self.radius_km.unwrap_or(DEFAULT_RADIUS_KM)
    }

    /// Result cap clamped to `1..=MAX_RESULT_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_RESULT_LIMIT)
    }

    pub fn accepts_route(&self, route_id: &str) -> bool {
        self.routes
            .as_ref()
            .map_or(true, |routes| routes.contains(route_id))
    }

    pub fn accepts_stop(&self, stop_id: &str) -> bool {
        self.direction
            .map_or(true, |direction| stop_id.ends_with(direction.stop_suffix()))
    }
}

/// Query for the status of a set of routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStatusQuery {
    routes: Vec<String>,
    /// Also determine whether each route currently has trips.
    pub include_running: bool,
}

impl RouteStatusQuery {
    /// Build a query, dropping repeated route ids while keeping the position
    /// of their first occurrence.
    pub fn new<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let routes = routes
            .into_iter()
            .map(Into::into)
            .filter(|route| seen.insert(route.clone()))
            .collect();
        Self {
            routes,
            include_running: false,
        }
    }

    pub fn with_running(mut self, include_running: bool) -> Self {
        self.include_running = include_running;
        self
    }

    /// Unique route ids in request order.
    pub fn routes(&self) -> &[String] {
        &self.routes
    }
}

/// One upcoming train at a nearby stop.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTime {
    pub route_id: String,
    pub stop_id: String,
    pub stop_name: Option<String>,
    pub trip_id: Option<String>,
    /// Arrival (or departure, when no arrival is published) as Unix seconds.
    pub arrival: i64,
    /// Great-circle distance from the query coordinate in kilometres.
    pub distance_km: f64,
}

/// One translation of an alert message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertText {
    pub text: String,
    pub language: Option<String>,
}

/// An alert attached to a route, with its messages in every published
/// translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAlert {
    pub id: String,
    pub cause: Option<String>,
    pub effect: Option<String>,
    pub headers: Vec<AlertText>,
    pub descriptions: Vec<AlertText>,
    pub urls: Vec<AlertText>,
}

impl RouteAlert {
    /// Header text, preferring English (or untagged) over other languages.
    pub fn header(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|text| matches!(text.language.as_deref(), Some("en") | None))
            .or_else(|| self.headers.first())
            .map(|text| text.text.as_str())
    }
}

/// Aggregated status of one requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStatus {
    pub route_id: String,
    pub status: String,
    pub message: Option<String>,
    /// Whether the route currently has trips; only set when requested.
    pub running: Option<bool>,
    pub alerts: Vec<RouteAlert>,
}

impl RouteStatus {
    /// Placeholder for a route the upstream could not answer for.
    pub fn unknown(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            status: STATUS_UNKNOWN.to_string(),
            message: None,
            running: None,
            alerts: Vec::new(),
        }
    }
}
