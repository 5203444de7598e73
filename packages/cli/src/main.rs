#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for water-route preprocessing and estimation.
//!
//! Uses `indicatif-log-bridge` (via [`water_route_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use water_route_models::GeoPoint;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "water_route_cli",
    about = "Water-aware driving distance estimation"
)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "water_route.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build bridge-route and water-graph artifacts and sample every
    /// configured circuity table (needs the oracle)
    Preprocess,
    /// Estimate the distance between two points and print the result as JSON
    Estimate {
        /// Heuristic name (e.g. `BRIDGE_REC`, `WATER_GRAPH`, `OVERHEAD_GRAPH_512`)
        #[arg(long)]
        heuristic: String,
        /// Start as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        from: GeoPoint,
        /// Destination as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        to: GeoPoint,
        /// Include the estimated path
        #[arg(long)]
        path: bool,
    },
    /// Report whether the straight line crosses water
    CrossesWater {
        /// Start as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        from: GeoPoint,
        /// Destination as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        to: GeoPoint,
    },
    /// Run every available heuristic and compare against the oracle
    Compare {
        /// Start as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        from: GeoPoint,
        /// Destination as `lat,lon`
        #[arg(long, value_parser = parse_lat_lon)]
        to: GeoPoint,
    },
}

fn parse_lat_lon(s: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `lat,lon`, got `{s}`"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(format!("`{s}` is out of range"));
    }
    Ok(GeoPoint::new(lat, lon))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = water_route_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Preprocess => commands::preprocess(&config, &multi).await?,
        Commands::Estimate {
            heuristic,
            from,
            to,
            path,
        } => commands::estimate(&config, heuristic.parse()?, from, to, path)?,
        Commands::CrossesWater { from, to } => commands::crosses_water(&config, from, to)?,
        Commands::Compare { from, to } => commands::compare(&config, from, to).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lon_pairs() {
        assert_eq!(
            parse_lat_lon("49.79, 9.93").unwrap(),
            GeoPoint::new(49.79, 9.93)
        );
        assert!(parse_lat_lon("49.79").is_err());
        assert!(parse_lat_lon("north,9.93").is_err());
        assert!(parse_lat_lon("95.0,9.93").is_err());
    }

    #[test]
    fn estimate_arguments_parse() {
        let cli = Cli::try_parse_from([
            "water_route_cli",
            "estimate",
            "--heuristic",
            "BRIDGE_SPLIT_NO_REC",
            "--from",
            "49.785,9.925",
            "--to",
            "49.797,9.928",
            "--path",
        ])
        .unwrap();

        let Commands::Estimate {
            heuristic, path, ..
        } = cli.command
        else {
            panic!("expected estimate");
        };
        assert_eq!(heuristic, "BRIDGE_SPLIT_NO_REC");
        assert!(path);
        assert_eq!(cli.config, PathBuf::from("water_route.toml"));
    }
}
