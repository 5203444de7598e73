//! Steps shared by the bridge-route and water-graph pipelines: hole
//! removal, street-to-bridge conversion and bridge/area association.

use geo::{BoundingRect, Intersects};
use rayon::prelude::*;
use water_route_models::{Bridge, Street, WaterArea};
use water_route_spatial::{WaterAreaIndex, geometry};

/// Keeps only the exterior ring of every polygon.
#[must_use]
pub fn exterior_rings_only(areas: Vec<WaterArea>) -> Vec<WaterArea> {
    areas
        .into_iter()
        .map(|area| area.with_geometry(geometry::exterior_only(area.geometry())))
        .collect()
}

/// Converts single-part streets into bridges. Streets that cannot be
/// bridges are skipped.
#[must_use]
pub fn streets_to_bridges(streets: Vec<Street>) -> Vec<Bridge> {
    let total = streets.len();
    let bridges: Vec<Bridge> = streets
        .into_iter()
        .filter_map(|street| match street.into_bridge() {
            Ok(bridge) => Some(bridge),
            Err(e) => {
                log::warn!("Skipping bridge candidate: {e}");
                None
            }
        })
        .collect();
    log::info!("{} of {total} bridge candidates are usable", bridges.len());
    bridges
}

/// For every area (by position), the bridges whose line intersects it.
///
/// A bridge spanning two areas belongs to both.
#[must_use]
pub fn associate(areas: &[WaterArea], bridges: &[Bridge]) -> Vec<Vec<Bridge>> {
    let index = WaterAreaIndex::build(areas);

    let mut pairs: Vec<(usize, usize)> = bridges
        .par_iter()
        .enumerate()
        .flat_map_iter(|(b, bridge)| {
            let candidates = bridge
                .line()
                .bounding_rect()
                .map(|rect| index.candidates(rect))
                .unwrap_or_default();
            candidates
                .into_iter()
                .filter(|&a| areas[a].geometry().intersects(bridge.line()))
                .map(move |a| (a, b))
                .collect::<Vec<_>>()
        })
        .collect();
    pairs.sort_unstable();

    let mut out = vec![Vec::new(); areas.len()];
    for (a, b) in pairs {
        out[a].push(bridges[b].clone());
    }

    log::debug!(
        "Associated bridges with {} of {} water areas",
        out.iter().filter(|b| !b.is_empty()).count(),
        areas.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiLineString, MultiPolygon, polygon};

    use super::*;
    use crate::fixtures;

    #[test]
    fn multi_part_streets_are_skipped() {
        let split = Street {
            name: "Split".to_string(),
            geometry: MultiLineString(vec![
                LineString::from(vec![(9.0, 49.0), (9.0, 49.1)]),
                LineString::from(vec![(9.0, 49.2), (9.0, 49.3)]),
            ]),
        };
        let bridges = streets_to_bridges(vec![fixtures::bridge_street(), split]);
        assert_eq!(bridges.len(), 1);
        assert_eq!(bridges[0].name(), "Alte Mainbruecke");
    }

    #[test]
    fn bridge_belongs_to_the_area_it_crosses() {
        let lake = WaterArea::new(
            "See",
            MultiPolygon(vec![polygon![
                (x: 10.0, y: 50.0),
                (x: 10.01, y: 50.0),
                (x: 10.01, y: 50.01),
                (x: 10.0, y: 50.01),
            ]]),
        );
        let areas = vec![fixtures::river(), lake];
        let bridges = streets_to_bridges(vec![fixtures::bridge_street()]);

        let associated = associate(&areas, &bridges);
        assert_eq!(associated[0].len(), 1);
        assert!(associated[1].is_empty());
    }
}
