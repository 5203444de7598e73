//! Splits water-area boundary rings at bridge crossings.
//!
//! Each bridge becomes a two-way shortcut between the boundary vertices
//! nearest to its endpoints. Walking a ring and taking every shortcut
//! once cuts a long river into the stretches between consecutive bridges.

use std::collections::{HashMap, HashSet};

use geo::{Coord, LineString};
use water_route_models::{Bridge, GeoPoint, WaterArea};
use water_route_spatial::geometry::planar_distance_sq;

use crate::PreprocessError;

/// Shortcut targets keyed by boundary vertex. The value is a position in
/// the ring that contains the key.
pub type ShortcutTable = HashMap<GeoPoint, usize>;

/// One closed walk produced by [`walk_ring`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubRing {
    /// Closed ring, first coordinate repeated at the end.
    pub ring: LineString<f64>,
    /// Vertices at which the walk jumped across a bridge.
    pub shortcuts_taken: Vec<GeoPoint>,
}

/// Nearest vertex over all `rings`, as `(ring, position)`. Ties keep the
/// earliest vertex.
fn nearest_vertex(rings: &[&LineString<f64>], point: GeoPoint) -> Option<(usize, usize)> {
    let target: geo::Point<f64> = point.into();
    let mut best: Option<(f64, usize, usize)> = None;
    for (r, ring) in rings.iter().enumerate() {
        for (i, coord) in ring.0.iter().enumerate() {
            let d = planar_distance_sq((*coord).into(), target);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, r, i));
            }
        }
    }
    best.map(|(_, r, i)| (r, i))
}

/// Builds the shortcut table of one area.
///
/// A bridge whose endpoints snap to different rings invalidates the whole
/// table: the area is then left unsplit.
#[must_use]
pub fn shortcuts(area_name: &str, rings: &[&LineString<f64>], bridges: &[Bridge]) -> ShortcutTable {
    let mut table = ShortcutTable::new();

    for bridge in bridges {
        let (Some((start_ring, start_index)), Some((end_ring, end_index))) = (
            nearest_vertex(rings, bridge.start()),
            nearest_vertex(rings, bridge.end()),
        ) else {
            continue;
        };

        if start_ring != end_ring {
            log::error!(
                "Bridge {} of {area_name} connects two different rings, not splitting",
                bridge.name()
            );
            return ShortcutTable::new();
        }
        if start_index == end_index {
            continue;
        }

        let ring = &rings[start_ring].0;
        table.insert(GeoPoint::from(ring[start_index]), end_index);
        table.insert(GeoPoint::from(ring[end_index]), start_index);
    }

    table
}

/// Walks `ring` from every vertex not covered by an earlier walk,
/// following ring order but jumping through each shortcut whose target
/// the current walk has not visited yet. Two jumps are never taken back
/// to back.
///
/// Walks shorter than a valid ring are dropped.
///
/// # Errors
///
/// Returns [`PreprocessError::NonTerminatingWalk`] if a walk fails to get
/// back to its start.
pub fn walk_ring(
    ring: &LineString<f64>,
    shortcuts: &ShortcutTable,
) -> Result<Vec<SubRing>, PreprocessError> {
    let r = &ring.0;
    let n = r.len();
    if n < 4 {
        return Ok(Vec::new());
    }
    let max_steps = 4 * n;

    let mut processed: HashSet<GeoPoint> = HashSet::new();
    let mut out = Vec::new();

    for start_index in 0..n {
        let start = GeoPoint::from(r[start_index]);
        if processed.contains(&start) {
            continue;
        }

        let mut in_run: HashSet<GeoPoint> = HashSet::from([start]);
        let mut taken = Vec::new();
        let mut coords: Vec<Coord<f64>> = vec![r[start_index]];

        let mut i = start_index + 1;
        if i >= n - 1 {
            i = 0;
        }
        let mut last_was_bridge = false;
        let mut steps = 0;

        while GeoPoint::from(r[i]) != start {
            steps += 1;
            if steps > max_steps {
                return Err(PreprocessError::NonTerminatingWalk {
                    start: start_index,
                    steps,
                });
            }

            let current = GeoPoint::from(r[i]);
            coords.push(r[i]);
            in_run.insert(current);

            match shortcuts.get(&current) {
                Some(&target)
                    if !last_was_bridge
                        && target < n
                        && !in_run.contains(&GeoPoint::from(r[target])) =>
                {
                    taken.push(current);
                    i = target;
                    last_was_bridge = true;
                }
                _ => {
                    last_was_bridge = false;
                    i += 1;
                }
            }
            if i >= n - 1 {
                i = 0;
            }
        }
        coords.push(r[start_index]);

        if coords.len() >= 4 {
            out.push(SubRing {
                ring: LineString(coords),
                shortcuts_taken: taken,
            });
        }
        processed.extend(in_run);
    }

    Ok(out)
}

/// Splits every exterior ring of `area` at its bridges. A ring whose walk
/// fails is kept whole.
#[must_use]
pub fn split_area(area: &WaterArea, bridges: &[Bridge]) -> Vec<SubRing> {
    let rings: Vec<&LineString<f64>> = area.geometry().0.iter().map(|p| p.exterior()).collect();
    let table = shortcuts(area.name(), &rings, bridges);

    let mut out = Vec::new();
    for ring in rings {
        match walk_ring(ring, &table) {
            Ok(sub) => out.extend(sub),
            Err(e) => {
                log::warn!("Keeping a ring of {} whole: {e}", area.name());
                out.push(SubRing {
                    ring: ring.clone(),
                    shortcuts_taken: Vec::new(),
                });
            }
        }
    }
    out
}
