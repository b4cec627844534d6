//! Wire types for the subset of the Transiter public HTTP API the proxy uses.
//!
//! Field names follow Transiter's camelCase JSON encoding. 64-bit integers
//! are emitted as JSON strings by Transiter's protobuf JSON mapping, so
//! timestamps accept either representation.

use serde::{Deserialize, Serialize};

/// Reply of `GET /systems/{system}/stops`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStopsReply {
    #[serde(default)]
    pub stops: Vec<Stop>,
}

/// A stop, optionally carrying its upcoming stop times.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Absent when the endpoint does not embed stop times at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_times: Option<Vec<StopTime>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<EstimatedTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<EstimatedTime>,
}

impl StopTime {
    /// Route the trip runs on, if the upstream included it.
    pub fn route_id(&self) -> Option<&str> {
        self.trip
            .as_ref()
            .and_then(|trip| trip.route.as_ref())
            .map(|route| route.id.as_str())
    }

    /// Arrival time in Unix seconds, falling back to the departure time.
    pub fn arrival_or_departure(&self) -> Option<i64> {
        self.arrival
            .as_ref()
            .and_then(EstimatedTime::unix_seconds)
            .or_else(|| self.departure.as_ref().and_then(EstimatedTime::unix_seconds))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteReference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteReference {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Timestamp>,
}

impl EstimatedTime {
    pub fn unix_seconds(&self) -> Option<i64> {
        self.time.as_ref().and_then(Timestamp::unix_seconds)
    }
}

/// Unix timestamp encoded either as a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Seconds(i64),
    Text(String),
}

impl Timestamp {
    pub fn unix_seconds(&self) -> Option<i64> {
        match self {
            Timestamp::Seconds(value) => Some(*value),
            Timestamp::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Reply of `GET /systems/{system}/routes/{route}`.
///
/// Route replies carry alert previews only (id, cause, effect); the message
/// texts come from the system's alert listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// Reply of `GET /systems/{system}/alerts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsReply {
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// An alert, either as a preview embedded in a route or in full.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<TranslatedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<TranslatedText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<TranslatedText>,
}

impl Alert {
    /// Whether any message text is present.
    pub fn has_messages(&self) -> bool {
        !(self.header.is_empty() && self.description.is_empty() && self.url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedText {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Reply of `GET /systems/{system}/routes/{route}/trips`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTripsReply {
    #[serde(default)]
    pub trips: Vec<Trip>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_stop_with_string_times() {
        let payload = json!({
            "id": "A27N",
            "name": "42 St-Port Authority Bus Terminal",
            "latitude": 40.757308,
            "longitude": -73.989735,
            "stopTimes": [
                {
                    "trip": {"id": "t1", "route": {"id": "A"}},
                    "arrival": {"time": "1700000100"},
                    "departure": {"time": "1700000130"}
                },
                {
                    "trip": {"id": "t2", "route": {"id": "E"}},
                    "departure": {"time": 1700000200}
                }
            ]
        });
        let stop: Stop = serde_json::from_value(payload).unwrap();
        let times = stop.stop_times.expect("stop times present");
        assert_eq!(times.len(), 2);
        assert_eq!(times[0].route_id(), Some("A"));
        assert_eq!(times[0].arrival_or_departure(), Some(1_700_000_100));
        assert_eq!(times[1].arrival_or_departure(), Some(1_700_000_200));
    }

    #[test]
    fn stop_times_absent_is_none() {
        let stop: Stop = serde_json::from_value(json!({"id": "A27"})).unwrap();
        assert!(stop.stop_times.is_none());
        assert!(stop.latitude.is_none());
    }

    #[test]
    fn unparseable_time_is_ignored() {
        let time = EstimatedTime {
            time: Some(Timestamp::Text("soon".to_string())),
        };
        assert_eq!(time.unix_seconds(), None);
    }

    #[test]
    fn route_alerts_decode_as_previews() {
        let route: Route = serde_json::from_value(json!({
            "id": "F",
            "alerts": [{"id": "a1", "cause": "UNKNOWN_CAUSE", "effect": "SIGNIFICANT_DELAYS"}]
        }))
        .unwrap();
        assert_eq!(route.alerts[0].effect.as_deref(), Some("SIGNIFICANT_DELAYS"));
        assert!(!route.alerts[0].has_messages());
    }

    #[test]
    fn decodes_alert_listing_with_messages() {
        let reply: ListAlertsReply = serde_json::from_value(json!({
            "alerts": [{
                "id": "a1",
                "header": [{"text": "Delays", "language": "en"}],
                "description": [{"text": "Signal problems at 59 St"}],
                "url": [{"text": "https://new.mta.info/alerts"}]
            }]
        }))
        .unwrap();
        let alert = &reply.alerts[0];
        assert!(alert.has_messages());
        assert_eq!(alert.description[0].language, None);
        assert_eq!(alert.url[0].text, "https://new.mta.info/alerts");
    }
}
