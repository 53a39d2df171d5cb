//! Great-circle distance and radius filtering.

use crate::geo::Coordinate;

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A candidate that passed a radius filter, with its distance to the query point.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub distance_km: f64,
}

/// Great-circle distance between two points in kilometres.
///
/// Uses the spherical law of cosines:
///
/// ```text
/// 6371 * acos(cos(φa)·cos(φb)·cos(λb − λa) + sin(φa)·sin(φb))
/// ```
///
/// The `acos` argument is clamped to `[-1, 1]`; rounding can push it just past
/// 1 for identical points, which would otherwise yield `NaN`.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let lat_a = a.latitude().to_radians();
    let lat_b = b.latitude().to_radians();
    let delta_lon = (b.longitude() - a.longitude()).to_radians();

    let cosine = lat_a.cos() * lat_b.cos() * delta_lon.cos() + lat_a.sin() * lat_b.sin();
    EARTH_RADIUS_KM * cosine.clamp(-1.0, 1.0).acos()
}

/// Keeps the candidates within `radius_km` of `query`, nearest first.
///
/// The sort is stable, so candidates at equal distance keep their input order.
pub fn within_radius<T, I>(query: Coordinate, candidates: I, radius_km: f64) -> Vec<Ranked<T>>
where
    I: IntoIterator<Item = (T, Coordinate)>,
{
    let mut ranked: Vec<Ranked<T>> = candidates
        .into_iter()
        .map(|(item, at)| Ranked {
            item,
            distance_km: distance_km(query, at),
        })
        .filter(|r| r.distance_km <= radius_km)
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("valid test coordinate")
    }

    #[test]
    fn identical_points_are_zero_not_nan() {
        let samples = [
            point(52.520_008, 13.404_954),
            point(48.137_154, 11.576_124),
            point(-33.868_820, 151.209_296),
            point(0.0, 0.0),
            point(89.999_999, -179.999_999),
        ];
        for p in samples {
            let d = distance_km(p, p);
            assert!(!d.is_nan(), "distance for {p} must not be NaN");
            assert!(d == 0.0, "distance for {p} should be 0, got {d}");
        }
    }

    #[test]
    fn nearly_identical_points_stay_finite() {
        let a = point(52.520_008, 13.404_954);
        let b = point(52.520_008, 13.404_954_000_1);
        let d = distance_km(a, b);
        assert!(d.is_finite());
        assert!(d < 0.001, "expected under a metre, got {d} km");
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (point(52.532, 13.385), point(52.520, 13.405)),
            (point(52.532, 13.385), point(48.137, 11.575)),
            (point(-45.0, 170.0), point(45.0, -170.0)),
            (point(10.0, 0.0), point(10.0, 180.0)),
        ];
        for (a, b) in pairs {
            let ab = distance_km(a, b);
            let ba = distance_km(b, a);
            assert!((ab - ba).abs() < 1e-9, "{a} <-> {b}: {ab} vs {ba}");
            assert!(ab >= 0.0);
        }
    }

    #[test]
    fn berlin_mitte_to_prenzlauer_berg_is_under_two_km() {
        let d = distance_km(point(52.532, 13.385), point(52.520, 13.405));
        assert!((1.5..2.0).contains(&d), "expected ~1.9 km, got {d}");
    }

    #[test]
    fn berlin_to_munich_is_about_500_km() {
        let d = distance_km(point(52.532, 13.385), point(48.137, 11.575));
        assert!((490.0..515.0).contains(&d), "expected ~505 km, got {d}");
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let d = distance_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn within_radius_filters_and_sorts_ascending() {
        let query = point(52.532, 13.385);
        let candidates = vec![
            ("munich", point(48.137, 11.575)),
            ("potsdam", point(52.391, 13.064)),
            ("mitte", point(52.520, 13.405)),
            ("wedding", point(52.549, 13.359)),
        ];

        let ranked = within_radius(query, candidates, 30.0);
        let names: Vec<&str> = ranked.iter().map(|r| r.item).collect();

        assert_eq!(names, vec!["mitte", "wedding", "potsdam"]);
        assert!(ranked.iter().all(|r| r.distance_km <= 30.0));
        assert!(ranked
            .windows(2)
            .all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn within_radius_keeps_input_order_for_ties() {
        let query = point(52.532, 13.385);
        let same = point(52.520, 13.405);
        let candidates = vec![("first", same), ("second", same), ("third", same)];

        let ranked = within_radius(query, candidates, 5.0);
        let names: Vec<&str> = ranked.iter().map(|r| r.item).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn within_radius_includes_points_exactly_on_the_boundary() {
        let query = point(52.532, 13.385);
        let target = point(52.520, 13.405);
        let exact = distance_km(query, target);

        let ranked = within_radius(query, vec![((), target)], exact);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn within_radius_of_empty_input_is_empty() {
        let ranked = within_radius::<(), _>(point(0.0, 0.0), Vec::new(), 100.0);
        assert!(ranked.is_empty());
    }
}
