use serde::Serialize;

use transiter_proxy_lib::{AlertText, RouteAlert, RouteStatus, TrainTime};

/// One element of the `nearbyTrainTimes` result list.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrainTimeDto {
    pub route_id: String,
    pub stop_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    /// Unix seconds.
    pub arrival: i64,
    /// Kilometres from the queried coordinate.
    pub distance: f64,
}

impl From<TrainTime> for TrainTimeDto {
    fn from(value: TrainTime) -> Self {
        Self {
            route_id: value.route_id,
            stop_id: value.stop_id,
            stop_name: value.stop_name,
            trip_id: value.trip_id,
            arrival: value.arrival,
            distance: value.distance_km,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlertTextDto {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl From<AlertText> for AlertTextDto {
    fn from(value: AlertText) -> Self {
        Self {
            text: value.text,
            language: value.language,
        }
    }
}

/// Alert message texts, every translation included.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlertMessagesDto {
    pub headers: Vec<AlertTextDto>,
    pub descriptions: Vec<AlertTextDto>,
    pub urls: Vec<AlertTextDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteAlertDto {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    pub messages: AlertMessagesDto,
}

fn texts(values: Vec<AlertText>) -> Vec<AlertTextDto> {
    values.into_iter().map(AlertTextDto::from).collect()
}

impl From<RouteAlert> for RouteAlertDto {
    fn from(value: RouteAlert) -> Self {
        Self {
            id: value.id,
            cause: value.cause,
            effect: value.effect,
            messages: AlertMessagesDto {
                headers: texts(value.headers),
                descriptions: texts(value.descriptions),
                urls: texts(value.urls),
            },
        }
    }
}

/// One element of the `routeStatuses` result list.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteStatusDto {
    pub route_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    pub alerts: Vec<RouteAlertDto>,
}

impl From<RouteStatus> for RouteStatusDto {
    fn from(value: RouteStatus) -> Self {
        Self {
            route_id: value.route_id,
            status: value.status,
            message: value.message,
            running: value.running,
            alerts: value.alerts.into_iter().map(RouteAlertDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_time_serializes_camel_case() {
        let dto = TrainTimeDto::from(TrainTime {
            route_id: "A".to_string(),
            stop_id: "A27N".to_string(),
            stop_name: None,
            trip_id: Some("t1".to_string()),
            arrival: 1_700_000_000,
            distance_km: 0.25,
        });

        let json = serde_json::to_string(&dto).unwrap();
        assert_eq!(
            json,
            r#"{"routeId":"A","stopId":"A27N","tripId":"t1","arrival":1700000000,"distance":0.25}"#
        );
    }

    #[test]
    fn route_alert_nests_messages() {
        let dto = RouteAlertDto::from(RouteAlert {
            id: "a1".to_string(),
            cause: None,
            effect: Some("DETOUR".to_string()),
            headers: vec![AlertText {
                text: "Detour".to_string(),
                language: Some("en".to_string()),
            }],
            descriptions: vec![],
            urls: vec![AlertText {
                text: "https://new.mta.info".to_string(),
                language: None,
            }],
        });

        let json = serde_json::to_string(&dto).unwrap();
        assert_eq!(
            json,
            r#"{"id":"a1","effect":"DETOUR","messages":{"headers":[{"text":"Detour","language":"en"}],"descriptions":[],"urls":[{"text":"https://new.mta.info"}]}}"#
        );
    }

    #[test]
    fn route_status_omits_unrequested_running_flag() {
        let dto = RouteStatusDto::from(RouteStatus::unknown("B"));
        let json = serde_json::to_string(&dto).unwrap();
        assert_eq!(json, r#"{"routeId":"B","status":"unknown","alerts":[]}"#);
    }
}
