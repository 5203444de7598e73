//! Point-to-point distance metrics.
//!
//! Both metrics canonicalize their arguments before computing, so
//! `distance(a, b)` and `distance(b, a)` are bit-identical.

use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};
use water_route_models::{DistanceEstimate, GeoPoint};

/// Earth radius used by the flat-earth projection, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Average ratio of road distance to straight-line distance in Germany.
pub const CIRCUITY_FACTOR_GERMANY: f64 = 1.32;

/// A stateless, symmetric distance function between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Equirectangular projection around the mean latitude of the pair.
    #[default]
    FlatEarth,
    /// Haversine great-circle distance.
    GreatCircle,
}

impl Metric {
    /// Distance between `a` and `b`.
    #[must_use]
    pub fn distance(self, a: GeoPoint, b: GeoPoint) -> DistanceEstimate {
        let (a, b) = GeoPoint::canonical_pair(a, b);
        match self {
            Self::FlatEarth => flat_earth(a, b),
            Self::GreatCircle => {
                DistanceEstimate::from_meters(Haversine.distance(a.into(), b.into()))
            }
        }
    }

    /// Distance scaled by [`CIRCUITY_FACTOR_GERMANY`].
    #[must_use]
    pub fn circuity_distance(self, a: GeoPoint, b: GeoPoint) -> DistanceEstimate {
        self.distance(a, b) * CIRCUITY_FACTOR_GERMANY
    }

    /// Either the plain or the circuity-scaled distance.
    #[must_use]
    pub fn weighted(self, a: GeoPoint, b: GeoPoint, circuity: bool) -> DistanceEstimate {
        if circuity {
            self.circuity_distance(a, b)
        } else {
            self.distance(a, b)
        }
    }
}

fn flat_earth(a: GeoPoint, b: GeoPoint) -> DistanceEstimate {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = lat2 - lat1;
    let x = (b.lon - a.lon).to_radians() * f64::midpoint(lat1, lat2).cos();
    DistanceEstimate::from_meters(EARTH_RADIUS_M * x.hypot(d_lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_symmetric_bit_for_bit() {
        let a = GeoPoint::new(49.785, 9.925);
        let b = GeoPoint::new(49.797, 9.928);
        for metric in [Metric::FlatEarth, Metric::GreatCircle] {
            assert_eq!(
                metric.distance(a, b).meters().to_bits(),
                metric.distance(b, a).meters().to_bits()
            );
        }
    }

    #[test]
    fn metrics_agree_at_city_scale() {
        let a = GeoPoint::new(49.785, 9.925);
        let b = GeoPoint::new(49.797, 9.928);
        let flat = Metric::FlatEarth.distance(a, b).meters();
        let great = Metric::GreatCircle.distance(a, b).meters();
        assert!((flat - 1351.0).abs() < 5.0, "flat-earth was {flat}");
        assert!((flat - great).abs() < 2.0, "{flat} vs {great}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = Metric::FlatEarth
            .distance(GeoPoint::new(49.0, 9.0), GeoPoint::new(50.0, 9.0))
            .meters();
        assert!((d - 111_194.9).abs() < 1.0, "got {d}");
    }

    #[test]
    fn identical_points_are_zero() {
        let p = GeoPoint::new(49.79, 9.93);
        assert!(Metric::FlatEarth.distance(p, p).is_zero());
        assert!(Metric::GreatCircle.distance(p, p).is_zero());
    }

    #[test]
    fn metric_names_in_config() {
        #[derive(Deserialize)]
        struct Section {
            metric: Metric,
        }
        let s: Section = toml::from_str("metric = \"great_circle\"").unwrap();
        assert_eq!(s.metric, Metric::GreatCircle);
        assert_eq!(Metric::default(), Metric::FlatEarth);
    }

    #[test]
    fn circuity_scales_by_factor() {
        let a = GeoPoint::new(49.0, 9.0);
        let b = GeoPoint::new(49.01, 9.0);
        let plain = Metric::GreatCircle.distance(a, b).meters();
        let scaled = Metric::GreatCircle.circuity_distance(a, b).meters();
        assert!((scaled - plain * CIRCUITY_FACTOR_GERMANY).abs() < 1e-9);
        assert!((Metric::GreatCircle.weighted(a, b, false).meters() - plain).abs() < f64::EPSILON);
    }
}
