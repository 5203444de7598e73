//! Synthetic geodata shared by the preprocessing and estimator tests.
//!
//! Everything lives around Wuerzburg: a straight river with one bridge,
//! a second river further north, and two bridgeless lakes whose shapes
//! make a straight line cross them more than once.

use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon, polygon};
use water_route_models::{Street, WaterArea};

/// Rectangle lon 9.90..9.96, lat 49.790..49.792, densified every
/// 0.0015 degrees of longitude and wound counterclockwise. Ring
/// positions `0..=40` are the southern bank going east, `41..=81` the
/// northern bank going west.
#[must_use]
pub fn river() -> WaterArea {
    river_between("Main", 49.790, 49.792)
}

/// A river like [`river`] whose banks lie at `south` and `north`.
#[must_use]
pub fn river_between(name: &str, south: f64, north: f64) -> WaterArea {
    let mut coords = Vec::with_capacity(83);
    for k in 0..=40 {
        coords.push(Coord {
            x: 0.0015f64.mul_add(f64::from(k), 9.90),
            y: south,
        });
    }
    for k in 0..=40 {
        coords.push(Coord {
            x: 0.0015f64.mul_add(-f64::from(k), 9.96),
            y: north,
        });
    }
    coords.push(coords[0]);
    WaterArea::new(
        name,
        MultiPolygon(vec![Polygon::new(LineString(coords), Vec::new())]),
    )
}

/// A street crossing [`river`] at lon 9.93, digitized south to north.
#[must_use]
pub fn bridge_street() -> Street {
    street("Alte Mainbruecke", (9.93, 49.7895), (9.93, 49.7925))
}

/// A single-part street from `from` to `to`, given as `(lon, lat)`.
#[must_use]
pub fn street(name: &str, from: (f64, f64), to: (f64, f64)) -> Street {
    Street {
        name: name.to_string(),
        geometry: MultiLineString(vec![LineString::from(vec![from, to])]),
    }
}

/// A lake open to the north; the line lat 49.705 crosses both arms.
#[must_use]
pub fn u_lake() -> WaterArea {
    WaterArea::new(
        "Hufeisensee",
        MultiPolygon(vec![polygon![
            (x: 9.80, y: 49.70),
            (x: 9.83, y: 49.70),
            (x: 9.83, y: 49.71),
            (x: 9.825, y: 49.71),
            (x: 9.825, y: 49.703),
            (x: 9.805, y: 49.703),
            (x: 9.805, y: 49.71),
            (x: 9.80, y: 49.71),
        ]]),
    )
}

/// A lake with three arms open to the north, east of [`u_lake`]; the line
/// lat 49.705 crosses all three.
#[must_use]
pub fn comb_lake() -> WaterArea {
    WaterArea::new(
        "Kammsee",
        MultiPolygon(vec![polygon![
            (x: 9.86, y: 49.70),
            (x: 9.91, y: 49.70),
            (x: 9.91, y: 49.71),
            (x: 9.905, y: 49.71),
            (x: 9.905, y: 49.703),
            (x: 9.8875, y: 49.703),
            (x: 9.8875, y: 49.71),
            (x: 9.8825, y: 49.71),
            (x: 9.8825, y: 49.703),
            (x: 9.865, y: 49.703),
            (x: 9.865, y: 49.71),
            (x: 9.86, y: 49.71),
        ]]),
    )
}
