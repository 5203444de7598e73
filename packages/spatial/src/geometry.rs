//! Planar geometry helpers used during preprocessing.

use geo::{
    Area, BooleanOps, ChamberlainDuquetteArea, Distance, Haversine, LineString, MultiPolygon,
    Point, Polygon, Simplify, Validation,
};
use water_route_models::DistanceEstimate;

/// Douglas-Peucker simplification of every polygon. A polygon whose
/// exterior would collapse below a valid ring is kept unsimplified.
#[must_use]
pub fn simplify(geometry: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    MultiPolygon(
        geometry
            .0
            .iter()
            .map(|polygon| {
                let simplified = polygon.simplify(tolerance);
                if simplified.exterior().0.len() < 4 {
                    polygon.clone()
                } else {
                    simplified
                }
            })
            .collect(),
    )
}

/// Drops all interior rings.
#[must_use]
pub fn exterior_only(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    MultiPolygon(
        geometry
            .0
            .iter()
            .map(|p| Polygon::new(p.exterior().clone(), Vec::new()))
            .collect(),
    )
}

/// Returns `polygon` if it is valid, otherwise the largest component of
/// its self-union. `None` if nothing with positive area survives.
#[must_use]
pub fn repair(polygon: Polygon<f64>) -> Option<Polygon<f64>> {
    if polygon.is_valid() {
        return Some(polygon);
    }

    let fixed = MultiPolygon(vec![polygon]).union(&MultiPolygon::<f64>(Vec::new()));
    fixed
        .0
        .into_iter()
        .filter(|p| p.unsigned_area() > 0.0)
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
}

/// Geodesic area in square meters.
#[must_use]
pub fn area_sq_m(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.chamberlain_duquette_unsigned_area()
}

/// Smallest great-circle distance between any coordinate of `line` and
/// any exterior coordinate of `geometry`.
#[must_use]
pub fn min_vertex_distance(line: &LineString<f64>, geometry: &MultiPolygon<f64>) -> DistanceEstimate {
    let mut best = f64::INFINITY;
    for a in line.points() {
        for polygon in &geometry.0 {
            for b in polygon.exterior().points() {
                best = best.min(Haversine.distance(a, b));
            }
        }
    }
    DistanceEstimate::from_meters(best)
}

/// Squared planar distance in `(lon, lat)` degrees.
#[must_use]
pub fn planar_distance_sq(a: Point<f64>, b: Point<f64>) -> f64 {
    let dx = a.x() - b.x();
    let dy = a.y() - b.y();
    dx.mul_add(dx, dy * dy)
}
