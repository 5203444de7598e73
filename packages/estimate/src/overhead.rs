//! Great-circle distance scaled by a sampled circuity ratio.

use water_route_models::GeoPoint;
use water_route_preprocess::circuity::CircuityTable;
use water_route_spatial::Metric;

use crate::{DistanceEstimator, EstimateError, Estimation};

/// Looks up the ratio between the reference points nearest to start and
/// destination.
pub struct OverheadEstimator<'a> {
    table: &'a CircuityTable,
}

impl<'a> OverheadEstimator<'a> {
    #[must_use]
    pub const fn new(table: &'a CircuityTable) -> Self {
        Self { table }
    }

    fn ratio(&self, start: GeoPoint, dest: GeoPoint) -> Result<f64, EstimateError> {
        let (Some(a), Some(b)) = (self.table.nearest(start), self.table.nearest(dest)) else {
            return Err(EstimateError::EmptyReferenceIndex);
        };
        let ratio = if a == b {
            self.table.minimum_ratio(a)
        } else {
            self.table.ratio(a, b)
        };
        ratio.ok_or(EstimateError::MissingRatio { from: a, to: b })
    }
}

impl DistanceEstimator for OverheadEstimator<'_> {
    fn estimate(&self, start: GeoPoint, dest: GeoPoint) -> Result<Estimation, EstimateError> {
        let (start, dest) = GeoPoint::canonical_pair(start, dest);
        let ratio = self.ratio(start, dest)?;
        log::trace!("Circuity ratio {ratio:.3} for {start} -> {dest}");
        Ok(Estimation::direct(
            Metric::GreatCircle.distance(start, dest) * ratio,
            start,
            dest,
        ))
    }
}
