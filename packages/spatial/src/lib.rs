#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial machinery shared by every heuristic.
//!
//! Holds the two distance metrics, the R-tree over water-area envelopes,
//! the KD-tree over snapped reference points, and the intersection engine
//! that clips straight segments against water areas. Everything here is
//! built once during preprocessing and read concurrently afterwards.

pub mod geometry;
pub mod index;
pub mod intersection;
pub mod layer;
pub mod metric;
pub mod nearest;

pub use index::WaterAreaIndex;
pub use intersection::{DEFAULT_MIN_GAP, Intersection, sort_by_distance_from_start};
pub use layer::{Precision, WaterLayer};
pub use metric::{CIRCUITY_FACTOR_GERMANY, EARTH_RADIUS_M, Metric};
pub use nearest::ReferencePointIndex;
