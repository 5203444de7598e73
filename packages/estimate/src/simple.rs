//! The plain metrics as estimators.

use water_route_models::GeoPoint;
use water_route_spatial::Metric;

use crate::{DistanceEstimator, EstimateError, Estimation};

impl DistanceEstimator for Metric {
    fn estimate(&self, start: GeoPoint, dest: GeoPoint) -> Result<Estimation, EstimateError> {
        let (a, b) = GeoPoint::canonical_pair(start, dest);
        Ok(Estimation::direct(self.distance(a, b), a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{D, S};

    #[test]
    fn metric_estimates_are_symmetric() {
        for metric in [Metric::FlatEarth, Metric::GreatCircle] {
            let there = metric.estimate(S, D).unwrap();
            let back = metric.estimate(D, S).unwrap();
            assert_eq!(there, back);
            assert_eq!(there.path.len(), 2);
        }
    }

    #[test]
    fn same_point_is_zero() {
        let e = Metric::GreatCircle.estimate(S, S).unwrap();
        assert!(e.distance.is_zero());
        assert_eq!(e.path, vec![S]);
    }
}
