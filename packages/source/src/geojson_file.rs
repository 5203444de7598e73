//! Geodata read from `GeoJSON` `FeatureCollection` files.
//!
//! Every feature's `name` property becomes the name of the water area or
//! street; features without one are named `unnamed-<position>`.

use std::path::{Path, PathBuf};

use geo::{Geometry, MultiLineString, MultiPolygon};
use geojson::GeoJson;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use water_route_models::{GeoPoint, Street, WaterArea};

use crate::{GeodataSource, SourceError};

/// Bounding box random points are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Western edge in degrees.
    pub min_lon: f64,
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Eastern edge in degrees.
    pub max_lon: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
}

impl Region {
    /// Checks that both ranges are ordered. A degenerate range (`min ==
    /// max`) is allowed and pins that coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Malformed`] if a minimum exceeds its maximum
    /// or a bound is not a number.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.min_lat <= self.max_lat && self.min_lon <= self.max_lon {
            Ok(())
        } else {
            Err(SourceError::Malformed {
                message: format!("invalid sampling region {self:?}"),
            })
        }
    }
}

impl Default for Region {
    /// Lower Franconia.
    fn default() -> Self {
        Self {
            min_lon: 8.974_65,
            min_lat: 49.478_98,
            max_lon: 10.880_51,
            max_lat: 50.567_79,
        }
    }
}

/// File locations of a [`GeoJsonSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonSourceConfig {
    /// Water areas (polygon features) for the bridge-route heuristic.
    #[serde(default = "default_water_areas")]
    pub water_areas: PathBuf,
    /// Water areas for the water-graph heuristic; defaults to `water_areas`.
    #[serde(default)]
    pub water_graph_areas: Option<PathBuf>,
    /// Bridge candidate streets (line features).
    #[serde(default = "default_bridge_candidates")]
    pub bridge_candidates: PathBuf,
    /// Road intersection points. Without it, intersection sampling falls
    /// back to uniform points in [`GeoJsonSourceConfig::region`].
    #[serde(default)]
    pub road_intersections: Option<PathBuf>,
    /// Study region for uniform sampling.
    #[serde(default)]
    pub region: Region,
}

fn default_water_areas() -> PathBuf {
    PathBuf::from("geodata/water_areas.geojson")
}

fn default_bridge_candidates() -> PathBuf {
    PathBuf::from("geodata/bridge_candidates.geojson")
}

impl Default for GeoJsonSourceConfig {
    fn default() -> Self {
        Self {
            water_areas: default_water_areas(),
            water_graph_areas: None,
            bridge_candidates: default_bridge_candidates(),
            road_intersections: None,
            region: Region::default(),
        }
    }
}

/// [`GeodataSource`] backed by local `GeoJSON` files.
pub struct GeoJsonSource {
    config: GeoJsonSourceConfig,
}

impl GeoJsonSource {
    /// Creates a source; files are read lazily on each request.
    #[must_use]
    pub const fn new(config: GeoJsonSourceConfig) -> Self {
        Self { config }
    }
}

impl GeodataSource for GeoJsonSource {
    fn water_areas_for_bridge_route(&self) -> Result<Vec<WaterArea>, SourceError> {
        parse_water_areas(&read(&self.config.water_areas)?)
    }

    fn water_areas_for_water_graph(&self) -> Result<Vec<WaterArea>, SourceError> {
        let path = self
            .config
            .water_graph_areas
            .as_ref()
            .unwrap_or(&self.config.water_areas);
        parse_water_areas(&read(path)?)
    }

    fn bridge_candidate_streets(&self) -> Result<Vec<Street>, SourceError> {
        parse_streets(&read(&self.config.bridge_candidates)?)
    }

    fn random_points(&self, n: usize, seed: u64) -> Result<Vec<GeoPoint>, SourceError> {
        uniform_points(self.config.region, n, seed)
    }

    fn random_intersection_points(
        &self,
        n: usize,
        seed: u64,
    ) -> Result<Vec<GeoPoint>, SourceError> {
        let Some(path) = &self.config.road_intersections else {
            log::warn!("No road intersection file configured, sampling uniform points instead");
            return self.random_points(n, seed);
        };

        let mut points = parse_points(&read(path)?)?;
        points.sort_unstable();
        points.dedup();
        points.shuffle(&mut StdRng::seed_from_u64(seed));
        points.truncate(n);
        Ok(points)
    }
}

fn read(path: &Path) -> Result<String, SourceError> {
    log::debug!("Reading {}", path.display());
    Ok(std::fs::read_to_string(path)?)
}

/// `n` points drawn uniformly from `region`, bounds included.
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] if `region` fails
/// [`Region::validate`].
pub fn uniform_points(region: Region, n: usize, seed: u64) -> Result<Vec<GeoPoint>, SourceError> {
    region.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..n)
        .map(|_| {
            GeoPoint::new(
                rng.random_range(region.min_lat..=region.max_lat),
                rng.random_range(region.min_lon..=region.max_lon),
            )
        })
        .collect())
}

/// Named geometries of a `FeatureCollection`.
fn named_geometries(text: &str) -> Result<Vec<(String, Geometry<f64>)>, SourceError> {
    let GeoJson::FeatureCollection(collection) = text.parse::<GeoJson>()? else {
        return Err(SourceError::Malformed {
            message: "expected a GeoJSON FeatureCollection".to_string(),
        });
    };

    let mut out = Vec::with_capacity(collection.features.len());
    for (i, feature) in collection.features.into_iter().enumerate() {
        let name = feature
            .property("name")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| format!("unnamed-{i}"), String::from);

        let Some(geometry) = feature.geometry else {
            log::warn!("Feature {name} has no geometry, skipping");
            continue;
        };

        match Geometry::<f64>::try_from(geometry) {
            Ok(g) => out.push((name, g)),
            Err(e) => log::warn!("Feature {name} has unusable geometry: {e}"),
        }
    }
    Ok(out)
}

/// Parses polygon features into water areas.
///
/// # Errors
///
/// Returns [`SourceError`] if `text` is not a `GeoJSON` `FeatureCollection`.
pub fn parse_water_areas(text: &str) -> Result<Vec<WaterArea>, SourceError> {
    Ok(named_geometries(text)?
        .into_iter()
        .filter_map(|(name, geometry)| match geometry {
            Geometry::Polygon(p) => Some(WaterArea::new(name, MultiPolygon(vec![p]))),
            Geometry::MultiPolygon(mp) => Some(WaterArea::new(name, mp)),
            _ => {
                log::debug!("Water feature {name} is not polygonal, skipping");
                None
            }
        })
        .collect())
}

/// Parses line features into bridge candidate streets.
///
/// # Errors
///
/// Returns [`SourceError`] if `text` is not a `GeoJSON` `FeatureCollection`.
pub fn parse_streets(text: &str) -> Result<Vec<Street>, SourceError> {
    Ok(named_geometries(text)?
        .into_iter()
        .filter_map(|(name, geometry)| {
            let geometry = match geometry {
                Geometry::LineString(l) => MultiLineString(vec![l]),
                Geometry::MultiLineString(ml) => ml,
                _ => {
                    log::debug!("Street feature {name} is not linear, skipping");
                    return None;
                }
            };
            Some(Street { name, geometry })
        })
        .collect())
}

/// Parses point and multi-point features.
///
/// # Errors
///
/// Returns [`SourceError`] if `text` is not a `GeoJSON` `FeatureCollection`.
pub fn parse_points(text: &str) -> Result<Vec<GeoPoint>, SourceError> {
    let mut points = Vec::new();
    for (_, geometry) in named_geometries(text)? {
        match geometry {
            Geometry::Point(p) => points.push(GeoPoint::from(p.0)),
            Geometry::MultiPoint(mp) => points.extend(mp.0.iter().map(|p| GeoPoint::from(p.0))),
            _ => {}
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Main" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[9.90, 49.790], [9.96, 49.790], [9.96, 49.792], [9.90, 49.792], [9.90, 49.790]]]
                }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [9.93, 49.79] }
            },
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[9.0, 49.0], [9.1, 49.0], [9.1, 49.1], [9.0, 49.0]]]
                }
            }
        ]
    }"#;

    const STREETS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Alte Mainbruecke" },
                "geometry": { "type": "LineString", "coordinates": [[9.93, 49.7895], [9.93, 49.7925]] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Split" },
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": [[[9.0, 49.0], [9.0, 49.1]], [[9.0, 49.2], [9.0, 49.3]]]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_polygon_features_only() {
        let areas = parse_water_areas(WATER).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].name(), "Main");
        assert_eq!(areas[1].name(), "unnamed-2");
    }

    #[test]
    fn parses_streets_keeping_all_parts() {
        let streets = parse_streets(STREETS).unwrap();
        assert_eq!(streets.len(), 2);
        assert_eq!(streets[0].name, "Alte Mainbruecke");
        assert_eq!(streets[1].geometry.0.len(), 2);
    }

    #[test]
    fn parses_points() {
        let points = parse_points(WATER).unwrap();
        assert_eq!(points, vec![GeoPoint::new(49.79, 9.93)]);
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_water_areas(r#"{ "type": "Point", "coordinates": [1.0, 2.0] }"#);
        assert!(matches!(err, Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn uniform_points_are_deterministic_and_inside_region() {
        let region = Region::default();
        let a = uniform_points(region, 50, 7).unwrap();
        let b = uniform_points(region, 50, 7).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|p| {
            (region.min_lat..=region.max_lat).contains(&p.lat)
                && (region.min_lon..=region.max_lon).contains(&p.lon)
        }));
    }

    #[test]
    fn degenerate_region_pins_the_coordinate() {
        let region = Region {
            min_lon: 9.93,
            min_lat: 49.7,
            max_lon: 9.93,
            max_lat: 49.8,
        };
        let points = uniform_points(region, 20, 3).unwrap();
        assert_eq!(points.len(), 20);
        assert!(points.iter().all(|p| (p.lon - 9.93).abs() < f64::EPSILON));
    }

    #[test]
    fn inverted_region_is_rejected() {
        let region = Region {
            min_lat: 50.0,
            max_lat: 49.0,
            ..Region::default()
        };
        assert!(matches!(
            uniform_points(region, 5, 1),
            Err(SourceError::Malformed { .. })
        ));

        let source = GeoJsonSource::new(GeoJsonSourceConfig {
            region,
            ..GeoJsonSourceConfig::default()
        });
        assert!(source.random_points(5, 1).is_err());
    }

    #[test]
    fn config_defaults_from_empty_toml() {
        let config: GeoJsonSourceConfig = toml::from_str("").unwrap();
        assert_eq!(config, GeoJsonSourceConfig::default());
    }
}
