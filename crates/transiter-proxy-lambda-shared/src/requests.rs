//! Invocation envelope and argument types for the resolver fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use transiter_proxy_lib::model::MAX_RESULT_LIMIT;
use transiter_proxy_lib::{Coordinate, Direction, NearbyQuery, RouteStatusQuery};

use crate::ProblemDetails;

/// Upper bound on route ids accepted by a single `routeStatuses` query.
pub const MAX_STATUS_ROUTES: usize = 50;

/// Validation trait for resolver argument types.
///
/// Implementations should validate all fields and return a `ProblemDetails`
/// error for invalid input.
pub trait Validate {
    /// Validate the arguments, returning an error if invalid.
    ///
    /// The `request_id` is used to populate the `instance` field of any
    /// returned `ProblemDetails`.
    ///
    /// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// AppSync direct Lambda resolver event.
///
/// Only the parts the resolver reads are modelled; identity, source and
/// request headers are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationEnvelope {
    /// Raw GraphQL arguments of the resolved field.
    #[serde(default)]
    pub arguments: Value,
    pub info: InvocationInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationInfo {
    pub field_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type_name: Option<String>,

    #[serde(
        default,
        rename = "selectionSetGraphQL",
        skip_serializing_if = "Option::is_none"
    )]
    pub selection_set_graphql: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection_set_list: Vec<String>,
}

impl InvocationInfo {
    /// Whether the client's selection set asks for the top-level `field`.
    ///
    /// Prefers the structured selection list; falls back to scanning the
    /// selection set text for the field name as a whole word.
    pub fn selects(&self, field: &str) -> bool {
        if !self.selection_set_list.is_empty() {
            return self.selection_set_list.iter().any(|f| f == field);
        }
        self.selection_set_graphql
            .as_deref()
            .map(|text| {
                text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .any(|word| word == field)
            })
            .unwrap_or(false)
    }
}

impl InvocationEnvelope {
    /// Parse the raw event payload.
    pub fn from_payload(payload: Value, request_id: &str) -> Result<Self, Box<ProblemDetails>> {
        serde_json::from_value(payload).map_err(|e| {
            Box::new(ProblemDetails::invalid_argument(
                format!("Invalid invocation envelope: {}", e),
                request_id,
            ))
        })
    }

    /// Deserialize and validate the field arguments.
    ///
    /// A missing `arguments` object is treated as empty so that required
    /// arguments are reported by name.
    pub fn arguments<T>(&self, request_id: &str) -> Result<T, Box<ProblemDetails>>
    where
        T: DeserializeOwned + Validate,
    {
        let raw = match &self.arguments {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        let args: T = serde_json::from_value(raw).map_err(|e| {
            Box::new(ProblemDetails::invalid_argument(
                format!("Invalid arguments: {}", e),
                request_id,
            ))
        })?;
        args.validate(request_id)?;
        Ok(args)
    }
}

/// The GraphQL fields this function resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverField {
    NearbyTrainTimes,
    RouteStatuses,
}

impl ResolverField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "nearbyTrainTimes" => Some(Self::NearbyTrainTimes),
            "routeStatuses" => Some(Self::RouteStatuses),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NearbyTrainTimes => "nearbyTrainTimes",
            Self::RouteStatuses => "routeStatuses",
        }
    }
}

/// Arguments of `nearbyTrainTimes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyTrainTimesArgs {
    /// Latitude in decimal degrees.
    pub lat: f64,

    /// Longitude in decimal degrees.
    pub lon: f64,

    /// Search radius in kilometres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,

    /// Maximum number of train times to return (default 20).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Only return train times on these routes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<String>>,

    /// `N`/`NORTH` or `S`/`SOUTH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

impl Validate for NearbyTrainTimesArgs {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Box::new(ProblemDetails::invalid_argument(
                format!("'lat' must be between -90 and 90, got {}", self.lat),
                request_id,
            )));
        }

        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Box::new(ProblemDetails::invalid_argument(
                format!("'lon' must be between -180 and 180, got {}", self.lon),
                request_id,
            )));
        }

        if let Some(radius) = self.radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(Box::new(ProblemDetails::invalid_argument(
                    "'radius' must be a positive number of kilometres",
                    request_id,
                )));
            }
        }

        if let Some(limit) = self.limit {
            if !(1..=MAX_RESULT_LIMIT).contains(&limit) {
                return Err(Box::new(ProblemDetails::invalid_argument(
                    format!("'limit' must be between 1 and {}", MAX_RESULT_LIMIT),
                    request_id,
                )));
            }
        }

        if let Some(routes) = &self.routes {
            if routes.is_empty() || routes.iter().any(|r| r.trim().is_empty()) {
                return Err(Box::new(ProblemDetails::invalid_argument(
                    "'routes' must contain non-empty route ids when provided",
                    request_id,
                )));
            }
        }

        if let Some(direction) = &self.direction {
            Direction::try_from(direction.as_str())
                .map_err(|e| Box::new(ProblemDetails::invalid_argument(e, request_id)))?;
        }

        Ok(())
    }
}

impl NearbyTrainTimesArgs {
    /// Convert validated arguments into a library query.
    pub fn to_query(&self) -> NearbyQuery {
        let mut query = NearbyQuery::new(Coordinate::new(self.lat, self.lon));
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        if let Some(radius) = self.radius {
            query = query.with_radius(radius);
        }
        if let Some(routes) = &self.routes {
            query = query.with_routes(routes.iter().map(|r| r.trim()));
        }
        if let Some(direction) = self
            .direction
            .as_deref()
            .and_then(|d| Direction::try_from(d).ok())
        {
            query = query.with_direction(direction);
        }
        query
    }
}

/// Arguments of `routeStatuses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStatusesArgs {
    pub routes: Vec<String>,
}

impl Validate for RouteStatusesArgs {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.routes.is_empty() {
            return Err(Box::new(ProblemDetails::invalid_argument(
                "'routes' must contain at least one route id",
                request_id,
            )));
        }

        if let Some(position) = self.routes.iter().position(|r| r.trim().is_empty()) {
            return Err(Box::new(ProblemDetails::invalid_argument(
                format!("'routes[{}]' must not be empty", position),
                request_id,
            )));
        }

        if self.routes.len() > MAX_STATUS_ROUTES {
            return Err(Box::new(ProblemDetails::invalid_argument(
                format!("'routes' accepts at most {} route ids", MAX_STATUS_ROUTES),
                request_id,
            )));
        }

        Ok(())
    }
}

impl RouteStatusesArgs {
    pub fn to_query(&self, include_running: bool) -> RouteStatusQuery {
        RouteStatusQuery::new(self.routes.iter().map(|r| r.trim())).with_running(include_running)
    }
}
