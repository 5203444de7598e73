//! Query points and preprocessed artifacts over the synthetic geodata of
//! [`water_route_preprocess::fixtures`].

use water_route_models::{GeoPoint, WaterArea};
use water_route_preprocess::PreprocessConfig;
use water_route_preprocess::bridge_route::{self, BridgeRoutePreprocessing};
use water_route_preprocess::fixtures::{bridge_street, river, river_between, street, u_lake};
use water_route_preprocess::water_graph::{self, WaterGraphArtifacts};

/// South of the river, west of the bridge.
pub const S: GeoPoint = GeoPoint {
    lat: 49.785,
    lon: 9.925,
};

/// North of the river, west of the bridge.
pub const D: GeoPoint = GeoPoint {
    lat: 49.797,
    lon: 9.928,
};

/// North of [`second_river`].
pub const BEYOND_SECOND: GeoPoint = GeoPoint {
    lat: 49.807,
    lon: 9.928,
};

/// South of [`u_lake`], on a line to [`D`] that crosses the lake's east
/// arm before the river.
pub const BELOW_LAKE: GeoPoint = GeoPoint {
    lat: 49.695,
    lon: 9.815,
};

/// A second river 800 m north of the Main.
pub fn second_river() -> WaterArea {
    river_between("Pleichach", 49.800, 49.802)
}

pub fn bridge_routes() -> BridgeRoutePreprocessing {
    bridge_route::preprocess(
        vec![river()],
        vec![bridge_street()],
        &PreprocessConfig::default(),
    )
}

/// Both rivers, each with one bridge at lon 9.93. The northern bridge is
/// digitized north to south.
pub fn two_river_bridge_routes() -> BridgeRoutePreprocessing {
    bridge_route::preprocess(
        vec![river(), second_river()],
        vec![
            bridge_street(),
            street("Friedensbruecke", (9.93, 49.8025), (9.93, 49.7995)),
        ],
        &PreprocessConfig::default(),
    )
}

pub fn water_graphs() -> WaterGraphArtifacts {
    water_graphs_over(vec![river(), u_lake()])
}

/// Water graphs of `areas` with the river's bridge as the only street.
pub fn water_graphs_over(areas: Vec<WaterArea>) -> WaterGraphArtifacts {
    water_graph::preprocess(areas, vec![bridge_street()], &PreprocessConfig::default())
}
