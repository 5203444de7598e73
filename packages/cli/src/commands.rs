//! Subcommand implementations.

use water_route_cli_utils::{IndicatifProgress, MultiProgress};
use water_route_estimate::service::EstimationService;
use water_route_models::{GeoPoint, Heuristic};
use water_route_preprocess::circuity::{CircuitySettings, CircuityTable};
use water_route_preprocess::{bridge_route, water_graph};
use water_route_source::geojson_file::GeoJsonSource;
use water_route_source::osrm::OsrmClient;
use water_route_source::progress::ProgressCallback as _;
use water_route_source::{GeodataSource, RoutingOracle};

use crate::config::AppConfig;

type BoxError = Box<dyn std::error::Error>;

/// Which artifact families a command needs.
#[derive(Debug, Clone, Copy)]
struct Needs {
    bridge_routes: bool,
    water_graphs: bool,
    circuity: bool,
}

impl Needs {
    const ALL: Self = Self {
        bridge_routes: true,
        water_graphs: true,
        circuity: true,
    };

    const fn of(heuristic: Heuristic) -> Self {
        Self {
            bridge_routes: matches!(heuristic, Heuristic::BridgeRoute { .. }),
            water_graphs: matches!(heuristic, Heuristic::WaterGraph { .. }),
            circuity: matches!(heuristic, Heuristic::Overhead { .. }),
        }
    }
}

fn source(config: &AppConfig) -> GeoJsonSource {
    GeoJsonSource::new(config.geodata.files.clone())
}

fn oracle(config: &AppConfig) -> OsrmClient {
    OsrmClient::new(config.oracle.base_url.clone(), config.oracle.profile.clone())
}

fn circuity_settings(config: &AppConfig, sample_size: u32) -> Result<CircuitySettings, BoxError> {
    Ok(CircuitySettings {
        cache_dir: config.circuity.cache_dir.clone(),
        sample_size: usize::try_from(sample_size)?,
        seed: config.geodata.seed,
        concurrent_requests: config.oracle.concurrent_requests,
    })
}

/// Builds the in-memory artifacts and loads cached circuity tables.
fn load_service(config: &AppConfig, needs: Needs) -> Result<EstimationService, BoxError> {
    let source = source(config);
    let mut service = EstimationService::new(config.estimation.clone());

    if needs.bridge_routes {
        let pre = bridge_route::preprocess(
            source.water_areas_for_bridge_route()?,
            source.bridge_candidate_streets()?,
            &config.preprocessing,
        );
        log::info!(
            "Bridge routes: {} whole areas, {} split sub-areas",
            pre.whole.layer().len(),
            pre.split.layer().len()
        );
        service = service.with_bridge_routes(pre);
    }

    if needs.water_graphs {
        let artifacts = water_graph::preprocess(
            source.water_areas_for_water_graph()?,
            source.bridge_candidate_streets()?,
            &config.preprocessing,
        );
        log::info!("Water graphs: {} sub-areas", artifacts.len());
        service = service.with_water_graphs(artifacts);
    }

    if needs.circuity {
        for &n in &config.circuity.sample_sizes {
            let settings = circuity_settings(config, n)?;
            if let Some(table) = CircuityTable::load(&settings.cache_dir, settings.sample_size)? {
                service = service.with_circuity_table(n, table);
            } else {
                log::warn!("No cached circuity table for {n} samples; run `preprocess` first");
            }
        }
    }

    Ok(service)
}

/// Runs both geometry pipelines and fills the circuity cache.
///
/// # Errors
///
/// Returns an error if geodata cannot be read or a circuity sweep fails.
pub async fn preprocess(config: &AppConfig, multi: &MultiProgress) -> Result<(), BoxError> {
    let service = load_service(
        config,
        Needs {
            circuity: false,
            ..Needs::ALL
        },
    )?;
    log::info!("Geometry heuristics ready: {:?}", service.available_heuristics());

    let source = source(config);
    let oracle = oracle(config);
    let sizes = &config.circuity.sample_sizes;
    let steps = IndicatifProgress::steps_bar(multi, "Circuity tables", sizes.len() as u64);

    for &n in sizes {
        let settings = circuity_settings(config, n)?;
        let sweep = IndicatifProgress::sweep_bar(multi, &format!("{n} samples"));
        let table = CircuityTable::load_or_compute(&source, &oracle, &settings, &sweep).await?;
        log::info!("Circuity table for {n} samples has {} reference points", table.len());
        steps.inc(1);
    }
    steps.finish("Circuity tables ready".to_string());

    Ok(())
}

/// Prints one [`water_route_models::EstimationResult`] as JSON.
///
/// # Errors
///
/// Returns an error if the needed artifacts cannot be built.
pub fn estimate(
    config: &AppConfig,
    heuristic: Heuristic,
    from: GeoPoint,
    to: GeoPoint,
    path: bool,
) -> Result<(), BoxError> {
    let service = load_service(config, Needs::of(heuristic))?;
    let result = service.estimate(heuristic, from, to, path);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Prints both water-crossing flags as JSON.
///
/// # Errors
///
/// Returns an error if the geometry artifacts cannot be built.
pub fn crosses_water(config: &AppConfig, from: GeoPoint, to: GeoPoint) -> Result<(), BoxError> {
    let service = load_service(
        config,
        Needs {
            bridge_routes: true,
            water_graphs: true,
            circuity: false,
        },
    )?;
    let report = serde_json::json!({
        "start": from,
        "destination": to,
        "crossesWater": service.crosses_water(from, to)?,
        "crossesRiver": service.crosses_river(from, to)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Runs every available heuristic and reports its deviation from the
/// oracle's driving distance.
///
/// # Errors
///
/// Returns an error if the artifacts cannot be built or the oracle is
/// unreachable.
pub async fn compare(config: &AppConfig, from: GeoPoint, to: GeoPoint) -> Result<(), BoxError> {
    let service = load_service(config, Needs::ALL)?;
    let truth = oracle(config).route(from, to).await?;
    if truth.is_none() {
        log::warn!("Oracle has no route between {from} and {to}");
    }
    let truth_m = truth.as_ref().map(|r| r.distance.meters());

    let rows: Vec<serde_json::Value> = service
        .available_heuristics()
        .into_iter()
        .map(|h| {
            let result = service.estimate(h, from, to, false);
            let distance_m = result.distance.map(|d| d.meters());
            let deviation = distance_m
                .zip(truth_m)
                .filter(|&(_, t)| t > 0.0)
                .map(|(d, t)| (d - t) / t);
            serde_json::json!({
                "heuristic": h,
                "distanceM": distance_m,
                "circuityDistanceM": result.circuity_distance.map(|d| d.meters()),
                "relativeDeviation": deviation,
                "elapsedNs": result.elapsed_ns,
                "errorMessage": result.error_message,
            })
        })
        .collect();

    let report = serde_json::json!({
        "start": from,
        "destination": to,
        "oracleDistanceM": truth_m,
        "estimates": rows,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
