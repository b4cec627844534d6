//! `nearbyTrainTimes`: proximity lookup, then per-stop time lookups.

use tracing::debug;

use crate::assemble::{assemble_nearby, Assembled, NearbyStop, StopLookup};
use crate::client::Upstream;
use crate::distance::haversine_km;
use crate::error::Result;
use crate::fanout::{fan_out, FAN_OUT_LIMIT};
use crate::model::{Coordinate, NearbyQuery, TrainTime};
use crate::transiter::{Stop, StopTime};

/// Maximum number of nearby stops whose times are looked up per query.
pub const MAX_STOP_LOOKUPS: usize = 25;

/// Resolve upcoming train times around the query coordinate.
///
/// The proximity lookup is a single call and its failure fails the query.
/// Per-stop lookups are best-effort: a stop that cannot be resolved is left
/// out and reported through [`Assembled::unresolved`].
///
/// When the proximity reply already embeds stop times for a stop, those are
/// used as-is and no per-stop call is made for it.
pub async fn nearby_train_times(
    upstream: &dyn Upstream,
    query: &NearbyQuery,
) -> Result<Assembled<TrainTime>> {
    let stops = upstream
        .nearby_stops(query.coordinate, query.effective_radius())
        .await?;
    let found = stops.len();

    let candidates: Vec<(NearbyStop, Option<Vec<StopTime>>)> = stops
        .into_iter()
        .filter(|stop| query.accepts_stop(&stop.id))
        .filter_map(|stop| candidate(query.coordinate, stop))
        .take(MAX_STOP_LOOKUPS)
        .collect();

    debug!(
        stops_found = found,
        candidates = candidates.len(),
        direction = ?query.direction,
        "selected nearby stops"
    );

    let lookups: Vec<StopLookup> = fan_out(candidates, FAN_OUT_LIMIT, |(stop, embedded)| async move {
        let result = match embedded {
            Some(stop_times) => Ok(stop_times),
            None => upstream
                .stop(&stop.id)
                .await
                .map(|detail| detail.stop_times.unwrap_or_default()),
        };
        (stop, result)
    })
    .await;

    Ok(assemble_nearby(lookups, query))
}

/// Resolve a stop's distance; stops without coordinates cannot be ranked and
/// are skipped.
fn candidate(origin: Coordinate, stop: Stop) -> Option<(NearbyStop, Option<Vec<StopTime>>)> {
    let latitude = stop.latitude?;
    let longitude = stop.longitude?;
    let distance_km = haversine_km(origin, Coordinate::new(latitude, longitude));
    Some((
        NearbyStop {
            id: stop.id,
            name: stop.name,
            distance_km,
        },
        stop.stop_times,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, UpstreamError, UpstreamErrorKind};
    use crate::model::Direction;
    use crate::test_helpers::{north_of, stop_at, stop_time, stop_with_times, FakeUpstream};

    const LAT: f64 = 40.0;
    const LON: f64 = -73.0;

    fn three_stop_fixture() -> FakeUpstream {
        FakeUpstream::new()
            .with_nearby_stops(vec![
                stop_at("S1", north_of(LAT, 0.1), LON),
                stop_at("S2", north_of(LAT, 0.2), LON),
                stop_at("S3", north_of(LAT, 0.3), LON),
            ])
            .with_stop(stop_with_times("S1", vec![stop_time("t1", "A", 1_000)]))
            .with_stop(stop_with_times("S2", vec![stop_time("t2", "A", 900)]))
            .with_stop(stop_with_times("S3", vec![stop_time("t3", "A", 800)]))
    }

    #[tokio::test]
    async fn returns_closest_stops_first_up_to_limit() {
        let upstream = three_stop_fixture();
        let query = NearbyQuery::new(Coordinate::new(LAT, LON)).with_limit(2);

        let assembled = nearby_train_times(&upstream, &query).await.unwrap();

        let stops: Vec<_> = assembled.items.iter().map(|t| t.stop_id.as_str()).collect();
        assert_eq!(stops, vec!["S1", "S2"]);
        assert!((assembled.items[0].distance_km - 0.1).abs() < 0.001);
        assert!((assembled.items[1].distance_km - 0.2).abs() < 0.001);
        assert_eq!(upstream.nearby_calls(), 1);
        assert_eq!(upstream.stop_calls(), 3);
    }

    #[tokio::test]
    async fn unresolved_stop_is_omitted() {
        let upstream = three_stop_fixture().with_stop_error(
            "S1",
            UpstreamError::new(UpstreamErrorKind::Unreachable, "reset").with_target("S1"),
        );
        let query = NearbyQuery::new(Coordinate::new(LAT, LON));

        let assembled = nearby_train_times(&upstream, &query).await.unwrap();

        let stops: Vec<_> = assembled.items.iter().map(|t| t.stop_id.as_str()).collect();
        assert_eq!(stops, vec!["S2", "S3"]);
        assert!(assembled.is_partial());
    }

    #[tokio::test]
    async fn proximity_failure_fails_the_query() {
        let upstream = FakeUpstream::new()
            .with_nearby_error(UpstreamError::new(UpstreamErrorKind::Unreachable, "down"));
        let query = NearbyQuery::new(Coordinate::new(LAT, LON));

        let err = nearby_train_times(&upstream, &query).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(ref e) if e.kind == UpstreamErrorKind::Unreachable));
        assert_eq!(upstream.stop_calls(), 0);
    }

    #[tokio::test]
    async fn embedded_stop_times_skip_per_stop_lookup() {
        let mut embedded = stop_at("S1", north_of(LAT, 0.1), LON);
        embedded.stop_times = Some(vec![stop_time("t1", "A", 500)]);
        let upstream = FakeUpstream::new().with_nearby_stops(vec![embedded]);
        let query = NearbyQuery::new(Coordinate::new(LAT, LON));

        let assembled = nearby_train_times(&upstream, &query).await.unwrap();

        assert_eq!(assembled.items.len(), 1);
        assert_eq!(upstream.stop_calls(), 0);
    }

    #[tokio::test]
    async fn direction_filter_limits_lookups() {
        let upstream = FakeUpstream::new()
            .with_nearby_stops(vec![
                stop_at("A27N", north_of(LAT, 0.1), LON),
                stop_at("A27S", north_of(LAT, 0.1), LON),
                stop_at("A27", north_of(LAT, 0.1), LON),
            ])
            .with_stop(stop_with_times("A27N", vec![stop_time("t1", "A", 10)]));
        let query = NearbyQuery::new(Coordinate::new(LAT, LON)).with_direction(Direction::North);

        let assembled = nearby_train_times(&upstream, &query).await.unwrap();

        assert_eq!(assembled.items.len(), 1);
        assert_eq!(assembled.items[0].stop_id, "A27N");
        assert_eq!(upstream.stop_calls(), 1);
    }

    #[tokio::test]
    async fn stops_without_coordinates_are_skipped() {
        let mut unplaced = stop_at("X", 0.0, 0.0);
        unplaced.latitude = None;
        let upstream = FakeUpstream::new().with_nearby_stops(vec![unplaced]);
        let query = NearbyQuery::new(Coordinate::new(LAT, LON));

        let assembled = nearby_train_times(&upstream, &query).await.unwrap();

        assert!(assembled.items.is_empty());
        assert!(!assembled.is_partial());
        assert_eq!(upstream.stop_calls(), 0);
    }
}
