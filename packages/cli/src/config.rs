//! `water_route.toml` loading.
//!
//! Every section and field is optional; a missing file yields the
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use water_route_estimate::service::EstimationOptions;
use water_route_preprocess::PreprocessConfig;
use water_route_source::geojson_file::GeoJsonSourceConfig;
use water_route_source::osrm::{DEFAULT_BASE_URL, DEFAULT_PROFILE};

/// Errors that can occur while loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`AppConfig`].
    #[error("Invalid configuration in {path}: {source}")]
    Toml {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub geodata: GeodataConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub preprocessing: PreprocessConfig,
    #[serde(default)]
    pub estimation: EstimationOptions,
    #[serde(default)]
    pub circuity: CircuityConfig,
}

/// `[geodata]`: input files and the sampling seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeodataConfig {
    #[serde(flatten)]
    pub files: GeoJsonSourceConfig,
    /// Seed for every random sample.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// `[oracle]`: the OSRM instance used for circuity sampling and
/// comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Requests in flight at once.
    #[serde(default = "default_concurrent")]
    pub concurrent_requests: usize,
    #[serde(default = "default_profile")]
    pub profile: String,
}

/// `[circuity]`: overhead-graph sample sizes and their cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuityConfig {
    #[serde(default = "default_sample_sizes")]
    pub sample_sizes: Vec<u32>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

const fn default_seed() -> u64 {
    42
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_concurrent() -> usize {
    8
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_sample_sizes() -> Vec<u32> {
    vec![128, 256, 512, 1024]
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("preprocessing_files")
}

impl Default for GeodataConfig {
    fn default() -> Self {
        Self {
            files: GeoJsonSourceConfig::default(),
            seed: default_seed(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            concurrent_requests: default_concurrent(),
            profile: default_profile(),
        }
    }
}

impl Default for CircuityConfig {
    fn default() -> Self {
        Self {
            sample_sizes: default_sample_sizes(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, falling back to the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.oracle.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.oracle.concurrent_requests, 8);
        assert_eq!(config.oracle.profile, "driving");
        assert_eq!(config.circuity.sample_sizes, vec![128, 256, 512, 1024]);
        assert_eq!(config.circuity.cache_dir, PathBuf::from("preprocessing_files"));
        assert_eq!(config.preprocessing, PreprocessConfig::default());
        assert!((config.estimation.min_intersection_gap_m - 5.0).abs() < f64::EPSILON);
        assert_eq!(config.geodata.seed, 42);
    }

    #[test]
    fn sections_override_single_fields() {
        let config: AppConfig = toml::from_str(
            r#"
            [geodata]
            water_areas = "data/wuerzburg_water.geojson"
            seed = 7

            [oracle]
            concurrent_requests = 2

            [preprocessing]
            min_split_vertices = 100

            [circuity]
            sample_sizes = [64]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.geodata.files.water_areas,
            PathBuf::from("data/wuerzburg_water.geojson")
        );
        assert_eq!(config.geodata.files.water_graph_areas, None);
        assert_eq!(config.geodata.seed, 7);
        assert_eq!(config.oracle.concurrent_requests, 2);
        assert_eq!(config.oracle.profile, "driving");
        assert_eq!(config.preprocessing.min_split_vertices, 100);
        assert!((config.preprocessing.simplify_tolerance - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.circuity.sample_sizes, vec![64]);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("water_route_cli_no_such_config.toml");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.circuity.sample_sizes.len(), 4);
    }

    #[test]
    fn unknown_value_types_are_rejected() {
        let err = toml::from_str::<AppConfig>("[oracle]\nconcurrent_requests = \"many\"");
        assert!(err.is_err());
    }
}
