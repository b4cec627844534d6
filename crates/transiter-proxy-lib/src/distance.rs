use geo::{HaversineDistance, Point};

use crate::model::Coordinate;

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let from = Point::new(from.longitude, from.latitude);
    let to = Point::new(to.longitude, to.latitude);
    from.haversine_distance(&to) / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_for_identical_points() {
        let point = Coordinate::new(40.7527, -73.9772);
        assert!(haversine_km(point, point) < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let km = haversine_km(Coordinate::new(40.0, -73.0), Coordinate::new(41.0, -73.0));
        assert!((km - 111.2).abs() < 0.5, "got {km}");
    }

    #[test]
    fn symmetric() {
        let a = Coordinate::new(40.7527, -73.9772);
        let b = Coordinate::new(40.6892, -74.0445);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }
}
