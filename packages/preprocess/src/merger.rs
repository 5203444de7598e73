//! Splices bridge segments that share endpoints into continuous bridges.
//!
//! OSM often delivers one physical bridge as several ways. Starting from
//! every segment not yet absorbed by a previous walk, the merger extends
//! backward from the segment start and forward from its end. A walk forks
//! wherever an endpoint is shared by more than one other segment, so one
//! segment can yield several merged variants.

use std::collections::{HashMap, HashSet};

use geo::{Coord, LineString};
use water_route_models::{Bridge, GeoPoint};

use crate::PreprocessError;

/// Upper bound on variants produced by one walk.
const MAX_VARIANTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

struct Frame {
    last: usize,
    chain: Option<Vec<Coord<f64>>>,
    on_path: Vec<usize>,
}

/// Merges the bridge segments of one water area.
///
/// A component that cannot be spliced is logged and dropped; the other
/// components are still returned. The output contains no duplicates.
#[must_use]
pub fn merge(area_name: &str, segments: &[Bridge]) -> Vec<Bridge> {
    let mut unique = HashSet::with_capacity(segments.len());
    let segments: Vec<&Bridge> = segments.iter().filter(|b| unique.insert(*b)).collect();

    let mut adjacency: HashMap<GeoPoint, Vec<usize>> = HashMap::new();
    for (i, segment) in segments.iter().enumerate() {
        adjacency.entry(segment.start()).or_default().push(i);
        if segment.end() != segment.start() {
            adjacency.entry(segment.end()).or_default().push(i);
        }
    }

    let mut absorbed = vec![false; segments.len()];
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        if absorbed[i] {
            continue;
        }
        match merge_from(i, &segments, &adjacency, &mut absorbed) {
            Ok(lines) => {
                for line in lines {
                    match Bridge::new(segment.name(), line) {
                        Ok(bridge) => {
                            if seen.insert(bridge.clone()) {
                                out.push(bridge);
                            }
                        }
                        Err(e) => log::warn!("{area_name}: {e}"),
                    }
                }
            }
            Err(e) => log::warn!(
                "Error merging bridges of {area_name} at {}: {e}",
                segment.start()
            ),
        }
    }

    log::debug!(
        "Merged {} segments of {area_name} into {} bridges",
        segments.len(),
        out.len()
    );
    out
}

fn merge_from(
    origin: usize,
    segments: &[&Bridge],
    adjacency: &HashMap<GeoPoint, Vec<usize>>,
    absorbed: &mut [bool],
) -> Result<Vec<LineString<f64>>, PreprocessError> {
    let backward = extend(origin, Direction::Backward, segments, adjacency, absorbed)?;
    let forward = extend(origin, Direction::Forward, segments, adjacency, absorbed)?;

    let bridge = segments[origin];
    let base = bridge.line();
    let name = bridge.name();

    let mut lines = Vec::new();
    match (backward.is_empty(), forward.is_empty()) {
        (true, true) => lines.push(base.clone()),
        (false, true) => {
            for back in &backward {
                lines.push(splice(name, base, back)?);
            }
        }
        (true, false) => {
            for ahead in &forward {
                lines.push(splice(name, base, ahead)?);
            }
        }
        (false, false) => {
            for back in &backward {
                let head = splice(name, base, back)?;
                for ahead in &forward {
                    lines.push(splice(name, &head, ahead)?);
                }
            }
        }
    }
    Ok(lines)
}

/// Every maximal chain of segments reachable from one end of `origin`,
/// excluding `origin` itself. Backward chains end at the origin's start,
/// forward chains begin at its end.
fn extend(
    origin: usize,
    direction: Direction,
    segments: &[&Bridge],
    adjacency: &HashMap<GeoPoint, Vec<usize>>,
    absorbed: &mut [bool],
) -> Result<Vec<LineString<f64>>, PreprocessError> {
    let mut frontiers = Vec::new();
    let mut stack = vec![Frame {
        last: origin,
        chain: None,
        on_path: vec![origin],
    }];

    while let Some(frame) = stack.pop() {
        absorbed[frame.last] = true;

        let frontier = match (&frame.chain, direction) {
            (None, Direction::Backward) => segments[origin].start(),
            (None, Direction::Forward) => segments[origin].end(),
            (Some(chain), Direction::Backward) => GeoPoint::from(chain[0]),
            (Some(chain), Direction::Forward) => GeoPoint::from(chain[chain.len() - 1]),
        };

        let next: Vec<usize> = adjacency
            .get(&frontier)
            .into_iter()
            .flatten()
            .copied()
            .filter(|o| !frame.on_path.contains(o))
            .collect();

        if next.is_empty() {
            if let Some(chain) = frame.chain {
                frontiers.push(LineString(chain));
            }
            continue;
        }

        for o in next {
            let mut part = segments[o].line().0.clone();
            let chain = match direction {
                Direction::Backward => {
                    if GeoPoint::from(part[part.len() - 1]) != frontier {
                        part.reverse();
                    }
                    if let Some(chain) = &frame.chain {
                        part.extend_from_slice(&chain[1..]);
                    }
                    part
                }
                Direction::Forward => {
                    if GeoPoint::from(part[0]) != frontier {
                        part.reverse();
                    }
                    match &frame.chain {
                        Some(chain) => {
                            let mut chain = chain.clone();
                            chain.extend_from_slice(&part[1..]);
                            chain
                        }
                        None => part,
                    }
                }
            };

            let mut on_path = frame.on_path.clone();
            on_path.push(o);
            stack.push(Frame {
                last: o,
                chain: Some(chain),
                on_path,
            });
        }

        if stack.len() + frontiers.len() > MAX_VARIANTS {
            return Err(PreprocessError::Merge {
                name: segments[origin].name().to_string(),
                message: format!("more than {MAX_VARIANTS} merge variants"),
            });
        }
    }

    Ok(frontiers)
}

/// Joins two lines at a shared endpoint, reversing `b` where needed.
fn splice(
    name: &str,
    a: &LineString<f64>,
    b: &LineString<f64>,
) -> Result<LineString<f64>, PreprocessError> {
    let (a_start, a_end) = (a.0[0], a.0[a.0.len() - 1]);
    let (b_start, b_end) = (b.0[0], b.0[b.0.len() - 1]);

    let mut coords;
    if a_end == b_start {
        coords = a.0.clone();
        coords.extend_from_slice(&b.0[1..]);
    } else if a_start == b_end {
        coords = b.0.clone();
        coords.extend_from_slice(&a.0[1..]);
    } else if a_end == b_end {
        coords = a.0.clone();
        coords.extend(b.0.iter().rev().skip(1));
    } else if a_start == b_start {
        coords = b.0.iter().rev().copied().collect();
        coords.extend_from_slice(&a.0[1..]);
    } else {
        return Err(PreprocessError::Merge {
            name: name.to_string(),
            message: "lines share no endpoint".to_string(),
        });
    }
    Ok(LineString(coords))
}
