//! Merging per-item upstream results into the final ordered output.
//!
//! The two fields deliberately apply different policies to unresolved
//! items: nearby train times omit them, route statuses account for every
//! requested route with an `unknown` entry.

use std::collections::HashMap;

use tracing::debug;

use crate::error::UpstreamError;
use crate::model::{
    AlertText, NearbyQuery, RouteAlert, RouteStatus, TrainTime, STATUS_NORMAL,
};
use crate::transiter::{Alert, Route, StopTime, TranslatedText};

/// Final ordered items plus the per-item failures that shaped them.
#[derive(Debug, Clone)]
pub struct Assembled<T> {
    pub items: Vec<T>,
    pub unresolved: Vec<UpstreamError>,
}

impl<T> Assembled<T> {
    /// True when at least one item could not be resolved upstream.
    pub fn is_partial(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

/// A stop selected by the proximity lookup, with its distance resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStop {
    pub id: String,
    pub name: Option<String>,
    pub distance_km: f64,
}

/// Stop times for one nearby stop, or the error that prevented loading them.
pub type StopLookup = (NearbyStop, Result<Vec<StopTime>, UpstreamError>);

/// Route and optional running flag for one requested route.
pub type RouteLookup = (String, Result<(Route, Option<bool>), UpstreamError>);

/// Assemble nearby train times: failed stops are dropped, the rest sorted by
/// distance then arrival and truncated to the query's cap.
pub fn assemble_nearby(lookups: Vec<StopLookup>, query: &NearbyQuery) -> Assembled<TrainTime> {
    let mut items = Vec::new();
    let mut unresolved = Vec::new();

    for (stop, result) in lookups {
        match result {
            Ok(stop_times) => items.extend(train_times_for_stop(&stop, &stop_times, query)),
            Err(err) => {
                debug!(stop_id = %stop.id, error = %err, "omitting unresolved nearby stop");
                unresolved.push(err);
            }
        }
    }

    items.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.arrival.cmp(&b.arrival))
            .then_with(|| a.stop_id.cmp(&b.stop_id))
            .then_with(|| a.route_id.cmp(&b.route_id))
            .then_with(|| a.trip_id.cmp(&b.trip_id))
    });
    items.truncate(query.effective_limit());

    Assembled { items, unresolved }
}

fn train_times_for_stop(
    stop: &NearbyStop,
    stop_times: &[StopTime],
    query: &NearbyQuery,
) -> Vec<TrainTime> {
    stop_times
        .iter()
        .filter_map(|stop_time| {
            let route_id = stop_time.route_id()?;
            if !query.accepts_route(route_id) {
                return None;
            }
            let arrival = stop_time.arrival_or_departure()?;
            Some(TrainTime {
                route_id: route_id.to_string(),
                stop_id: stop.id.clone(),
                stop_name: stop.name.clone(),
                trip_id: stop_time.trip.as_ref().map(|trip| trip.id.clone()),
                arrival,
                distance_km: stop.distance_km,
            })
        })
        .collect()
}

/// Assemble route statuses: one entry per requested route, in request order,
/// with unresolved routes reported as `unknown`.
///
/// Route alert previews are joined by id with `details`, the system's full
/// alerts, to pick up their message texts. A preview without a matching
/// detail keeps whatever texts it carried itself.
pub fn assemble_statuses(lookups: Vec<RouteLookup>, details: &[Alert]) -> Assembled<RouteStatus> {
    let details: HashMap<&str, &Alert> = details
        .iter()
        .map(|alert| (alert.id.as_str(), alert))
        .collect();
    let mut items = Vec::with_capacity(lookups.len());
    let mut unresolved = Vec::new();

    for (route_id, result) in lookups {
        match result {
            Ok((route, running)) => {
                items.push(status_from_route(route_id, &route, running, &details))
            }
            Err(err) => {
                debug!(route_id = %route_id, error = %err, "reporting unresolved route as unknown");
                items.push(RouteStatus::unknown(route_id));
                unresolved.push(err);
            }
        }
    }

    Assembled { items, unresolved }
}

fn status_from_route(
    route_id: String,
    route: &Route,
    running: Option<bool>,
    details: &HashMap<&str, &Alert>,
) -> RouteStatus {
    let alerts: Vec<RouteAlert> = route
        .alerts
        .iter()
        .map(|preview| join_alert(preview, details.get(preview.id.as_str()).copied()))
        .collect();

    let status = alerts
        .first()
        .and_then(|alert| alert.effect.clone())
        .unwrap_or_else(|| STATUS_NORMAL.to_string());
    let message = alerts
        .first()
        .and_then(|alert| alert.header())
        .map(str::to_string);

    RouteStatus {
        route_id,
        status,
        message,
        running,
        alerts,
    }
}

fn join_alert(preview: &Alert, detail: Option<&Alert>) -> RouteAlert {
    let texts = detail.filter(|alert| alert.has_messages()).unwrap_or(preview);
    RouteAlert {
        id: preview.id.clone(),
        cause: preview
            .cause
            .clone()
            .or_else(|| detail.and_then(|alert| alert.cause.clone())),
        effect: preview
            .effect
            .clone()
            .or_else(|| detail.and_then(|alert| alert.effect.clone())),
        headers: alert_texts(&texts.header),
        descriptions: alert_texts(&texts.description),
        urls: alert_texts(&texts.url),
    }
}

fn alert_texts(texts: &[TranslatedText]) -> Vec<AlertText> {
    texts
        .iter()
        .map(|text| AlertText {
            text: text.text.clone(),
            language: text.language.clone(),
        })
        .collect()
}
