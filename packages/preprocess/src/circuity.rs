//! Sampled circuity ratios between snapped reference points.
//!
//! A sweep routes every pair of reference points through the oracle and
//! stores `road distance / great-circle distance`. The tables are cached
//! as JSON under `<cache_dir>/ohg_<n>/` so the sweep runs once per sample
//! size.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use futures::{StreamExt as _, stream};
use geojson::GeoJson;
use water_route_models::GeoPoint;
use water_route_source::progress::ProgressCallback;
use water_route_source::{GeodataSource, RoutingOracle};
use water_route_spatial::{CIRCUITY_FACTOR_GERMANY, Metric, ReferencePointIndex};

use crate::PreprocessError;

type RatioMap = HashMap<GeoPoint, HashMap<GeoPoint, f64>>;

/// Ratio lookup between reference points plus a per-point fallback.
pub struct CircuityTable {
    ratios: RatioMap,
    minimum: HashMap<GeoPoint, f64>,
    index: ReferencePointIndex,
}

/// Where and how a table for one sample size is obtained.
#[derive(Debug, Clone)]
pub struct CircuitySettings {
    /// Root of the `ohg_<n>` cache directories.
    pub cache_dir: PathBuf,
    /// Number of raw sample points.
    pub sample_size: usize,
    /// Seed for sampling.
    pub seed: u64,
    /// Oracle requests in flight at once.
    pub concurrent_requests: usize,
}

impl CircuityTable {
    /// Builds a table from its two maps. Reference points are the keys of
    /// `minimum`.
    #[must_use]
    pub fn from_maps(ratios: RatioMap, minimum: HashMap<GeoPoint, f64>) -> Self {
        let index = ReferencePointIndex::build(minimum.keys().copied());
        Self {
            ratios,
            minimum,
            index,
        }
    }

    /// Ratio stored for the pair `a`, `b`.
    #[must_use]
    pub fn ratio(&self, a: GeoPoint, b: GeoPoint) -> Option<f64> {
        self.ratios.get(&a).and_then(|m| m.get(&b)).copied()
    }

    /// Smallest ratio over all pairs of `point`.
    #[must_use]
    pub fn minimum_ratio(&self, point: GeoPoint) -> Option<f64> {
        self.minimum.get(&point).copied()
    }

    /// Reference point closest to `point`.
    #[must_use]
    pub fn nearest(&self, point: GeoPoint) -> Option<GeoPoint> {
        self.index.nearest(point)
    }

    /// Number of reference points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Snaps `samples` onto the road network and routes every pair of the
    /// distinct snapped points.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::NoReferencePoints`] if no sample could be
    /// snapped.
    pub async fn compute(
        oracle: &dyn RoutingOracle,
        samples: &[GeoPoint],
        concurrent_requests: usize,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, PreprocessError> {
        let concurrent_requests = concurrent_requests.max(1);

        progress.set_message("Snapping reference points".to_string());
        progress.set_total(samples.len() as u64);
        let snapped: Vec<GeoPoint> = stream::iter(samples.iter().copied())
            .map(|point| async move { (point, oracle.nearest(point).await) })
            .buffer_unordered(concurrent_requests)
            .filter_map(|(point, result)| async move {
                progress.inc(1);
                match result {
                    Ok(Some(snapped)) => Some(snapped.point),
                    Ok(None) => {
                        log::debug!("No road near {point}");
                        None
                    }
                    Err(e) => {
                        log::warn!("Snapping {point} failed: {e}");
                        None
                    }
                }
            })
            .collect()
            .await;

        let points = ReferencePointIndex::build(snapped).points().to_vec();
        if points.is_empty() {
            return Err(PreprocessError::NoReferencePoints {
                sample_size: samples.len(),
            });
        }
        log::info!(
            "{} distinct reference points from {} samples",
            points.len(),
            samples.len()
        );

        let mut pairs = Vec::with_capacity(points.len() * points.len().saturating_sub(1) / 2);
        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                pairs.push(GeoPoint::canonical_pair(a, b));
            }
        }

        progress.set_message(format!("Routing {} reference pairs", pairs.len()));
        progress.set_total(pairs.len() as u64);

        let mut ratios = RatioMap::new();
        let mut routes = stream::iter(pairs)
            .map(|(a, b)| async move { (a, b, oracle.route(a, b).await) })
            .buffer_unordered(concurrent_requests);

        while let Some((a, b, result)) = routes.next().await {
            progress.inc(1);
            let road = match result {
                Ok(Some(route)) => route.distance.meters(),
                Ok(None) => f64::NAN,
                Err(e) => {
                    log::debug!("Routing {a} -> {b} failed: {e}");
                    f64::NAN
                }
            };
            let ratio = road / Metric::GreatCircle.distance(a, b).meters();
            if !ratio.is_finite() {
                log::debug!("Skipping non-finite ratio between {a} and {b}");
                continue;
            }
            ratios.entry(a).or_default().entry(b).or_insert(ratio);
            ratios.entry(b).or_default().entry(a).or_insert(ratio);
        }

        let minimum = points
            .iter()
            .map(|p| {
                let min = ratios
                    .get(p)
                    .and_then(|m| m.values().copied().reduce(f64::min))
                    .filter(|r| r.is_finite())
                    .unwrap_or(CIRCUITY_FACTOR_GERMANY);
                (*p, min)
            })
            .collect();

        progress.finish(format!("Circuity table for {} points", points.len()));
        Ok(Self::from_maps(ratios, minimum))
    }

    /// Writes both tables for sample size `n` below `cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError`] if a file cannot be written.
    pub fn save(&self, cache_dir: &Path, n: usize) -> Result<(), PreprocessError> {
        let dir = table_dir(cache_dir, n);
        std::fs::create_dir_all(&dir)?;

        let ratios: BTreeMap<String, BTreeMap<String, f64>> = self
            .ratios
            .iter()
            .map(|(a, m)| {
                (
                    a.to_string(),
                    m.iter().map(|(b, r)| (b.to_string(), *r)).collect(),
                )
            })
            .collect();
        let minimum: BTreeMap<String, f64> = self
            .minimum
            .iter()
            .map(|(p, r)| (p.to_string(), *r))
            .collect();

        std::fs::write(lookup_path(cache_dir, n), serde_json::to_string(&ratios)?)?;
        std::fs::write(minimum_path(cache_dir, n), serde_json::to_string(&minimum)?)?;
        log::info!("Saved circuity table to {}", dir.display());
        Ok(())
    }

    /// Reads the tables for sample size `n`. `Ok(None)` if either file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError`] if a file exists but cannot be read or
    /// parsed.
    pub fn load(cache_dir: &Path, n: usize) -> Result<Option<Self>, PreprocessError> {
        let lookup = lookup_path(cache_dir, n);
        let min = minimum_path(cache_dir, n);
        if !lookup.is_file() || !min.is_file() {
            return Ok(None);
        }

        let raw: HashMap<String, HashMap<String, f64>> =
            serde_json::from_str(&std::fs::read_to_string(&lookup)?)?;
        let mut ratios = RatioMap::with_capacity(raw.len());
        for (a, inner) in raw {
            let a = parse_key(&a)?;
            let entry: &mut HashMap<GeoPoint, f64> = ratios.entry(a).or_default();
            for (b, r) in inner {
                entry.insert(parse_key(&b)?, r);
            }
        }

        let raw: HashMap<String, f64> = serde_json::from_str(&std::fs::read_to_string(&min)?)?;
        let minimum = raw
            .into_iter()
            .map(|(p, r)| Ok((parse_key(&p)?, r)))
            .collect::<Result<HashMap<_, _>, PreprocessError>>()?;

        log::info!(
            "Loaded circuity table with {} reference points from {}",
            minimum.len(),
            lookup.display()
        );
        Ok(Some(Self::from_maps(ratios, minimum)))
    }

    /// Loads the cached table, or samples, computes and caches it.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError`] if the cache is malformed, sampling
    /// fails, or the new table cannot be written.
    pub async fn load_or_compute(
        source: &dyn GeodataSource,
        oracle: &dyn RoutingOracle,
        settings: &CircuitySettings,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, PreprocessError> {
        let n = settings.sample_size;
        if let Some(table) = Self::load(&settings.cache_dir, n)? {
            return Ok(table);
        }

        log::info!("No cached circuity table for {n} samples, computing");
        let samples = source.random_intersection_points(n, settings.seed)?;
        save_sample_locations(&settings.cache_dir, n, &samples)?;

        let table =
            Self::compute(oracle, &samples, settings.concurrent_requests, progress).await?;
        table.save(&settings.cache_dir, n)?;
        Ok(table)
    }
}

/// Writes the raw sample points as a `GeoJSON` `MultiPoint`.
///
/// # Errors
///
/// Returns [`PreprocessError::Io`] if the file cannot be written.
pub fn save_sample_locations(
    cache_dir: &Path,
    n: usize,
    samples: &[GeoPoint],
) -> Result<(), PreprocessError> {
    let dir = table_dir(cache_dir, n);
    std::fs::create_dir_all(&dir)?;
    let points: geo::MultiPoint<f64> = samples
        .iter()
        .map(|p| geo::Point::<f64>::from(*p))
        .collect();
    let geometry = geojson::Geometry::new(geojson::Value::from(&points));
    std::fs::write(
        dir.join(format!("randomLocations_{n}.geojson")),
        GeoJson::Geometry(geometry).to_string(),
    )?;
    Ok(())
}

fn table_dir(cache_dir: &Path, n: usize) -> PathBuf {
    cache_dir.join(format!("ohg_{n}"))
}

fn lookup_path(cache_dir: &Path, n: usize) -> PathBuf {
    table_dir(cache_dir, n).join(format!("ohg_circuityLookupMap_{n}.json"))
}

fn minimum_path(cache_dir: &Path, n: usize) -> PathBuf {
    table_dir(cache_dir, n).join(format!("ohg_circuityMinimumLookupMap_{n}.json"))
}

fn parse_key(key: &str) -> Result<GeoPoint, PreprocessError> {
    key.parse().map_err(|source| PreprocessError::InvalidKey {
        key: key.to_string(),
        source,
    })
}
