//! Water areas, bridges, and the raw streets bridges are derived from.

use std::hash::{Hash, Hasher};

use geo::{BoundingRect, CoordsIter, LineString, MultiLineString, MultiPolygon, Rect};

use crate::{GeoPoint, ModelError};

/// Hashes coordinate bits with `-0.0` folded into `0.0`, so that hashing
/// agrees with the `==` geo uses on coordinates.
fn hash_coords<H: Hasher>(coords: impl Iterator<Item = geo::Coord<f64>>, state: &mut H) {
    for c in coords {
        (c.x + 0.0).to_bits().hash(state);
        (c.y + 0.0).to_bits().hash(state);
    }
}

/// A named body of water a straight path may have to cross.
#[derive(Debug, Clone)]
pub struct WaterArea {
    name: String,
    geometry: MultiPolygon<f64>,
    envelope: Rect<f64>,
}

impl WaterArea {
    /// Creates a water area and computes its bounding envelope.
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let envelope = geometry
            .bounding_rect()
            .unwrap_or_else(|| Rect::new((0.0, 0.0), (0.0, 0.0)));
        Self {
            name: name.into(),
            geometry,
            envelope,
        }
    }

    /// Area name as supplied by the geodata source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact geometry.
    #[must_use]
    pub const fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Axis-aligned bounding rectangle in `(lon, lat)` space.
    #[must_use]
    pub const fn envelope(&self) -> Rect<f64> {
        self.envelope
    }

    /// Returns a copy carrying a different geometry under the same name.
    #[must_use]
    pub fn with_geometry(&self, geometry: MultiPolygon<f64>) -> Self {
        Self::new(self.name.clone(), geometry)
    }
}

impl PartialEq for WaterArea {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.geometry == other.geometry
    }
}

impl Eq for WaterArea {}

impl Hash for WaterArea {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        hash_coords(self.geometry.coords_iter(), state);
    }
}

/// A continuous crossing line over a water area.
#[derive(Debug, Clone)]
pub struct Bridge {
    name: String,
    line: LineString<f64>,
}

impl Bridge {
    /// Creates a bridge from a line with at least two coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DegenerateBridge`] for shorter lines.
    pub fn new(name: impl Into<String>, line: LineString<f64>) -> Result<Self, ModelError> {
        let name = name.into();
        if line.0.len() < 2 {
            return Err(ModelError::DegenerateBridge { name });
        }
        Ok(Self { name, line })
    }

    /// Bridge name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Crossing line.
    #[must_use]
    pub const fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// First coordinate of the crossing line.
    #[must_use]
    pub fn start(&self) -> GeoPoint {
        GeoPoint::from(self.line.0[0])
    }

    /// Last coordinate of the crossing line.
    #[must_use]
    pub fn end(&self) -> GeoPoint {
        GeoPoint::from(self.line.0[self.line.0.len() - 1])
    }

    /// The point a route passes through when it uses this bridge.
    #[must_use]
    pub fn representative(&self) -> GeoPoint {
        self.start()
    }
}

impl PartialEq for Bridge {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.line == other.line
    }
}

impl Eq for Bridge {}

impl Hash for Bridge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        hash_coords(self.line.coords_iter(), state);
    }
}

/// A raw bridge candidate as delivered by the geodata source.
#[derive(Debug, Clone, PartialEq)]
pub struct Street {
    /// Street name.
    pub name: String,
    /// Raw geometry, possibly made of several parts.
    pub geometry: MultiLineString<f64>,
}

impl Street {
    /// Converts a single-part street into a [`Bridge`].
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MultiPartStreet`] unless the geometry has
    /// exactly one line, or [`ModelError::DegenerateBridge`] if that line is
    /// shorter than two coordinates.
    pub fn into_bridge(self) -> Result<Bridge, ModelError> {
        let mut lines = self.geometry.0;
        let parts = lines.len();
        match lines.pop() {
            Some(line) if parts == 1 => Bridge::new(self.name, line),
            _ => Err(ModelError::MultiPartStreet {
                name: self.name,
                parts,
            }),
        }
    }
}
