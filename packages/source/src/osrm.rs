//! OSRM routing-oracle client.
//!
//! Talks to the `route` and `nearest` services of an OSRM HTTP server.
//! Ferries are excluded so that a route never "crosses" water without a
//! bridge.
//!
//! See <https://project-osrm.org/docs/v5.24.0/api/>

use async_trait::async_trait;
use geo::LineString;
use water_route_models::{DistanceEstimate, GeoPoint};

use crate::{RoutingOracle, Route, Snapped, SourceError, retry};

/// Base URL of a locally running OSRM server.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Profile requested when none is configured.
pub const DEFAULT_PROFILE: &str = "driving";

/// HTTP client for one OSRM server and profile.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
    with_geometry: bool,
}

impl OsrmClient {
    /// Creates a client for `base_url` (without trailing slash) and
    /// `profile`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
            with_geometry: false,
        }
    }

    /// Also request the full route geometry.
    #[must_use]
    pub const fn with_geometry(mut self, with_geometry: bool) -> Self {
        self.with_geometry = with_geometry;
        self
    }

    fn route_url(&self, from: GeoPoint, to: GeoPoint) -> String {
        let overview = if self.with_geometry {
            "overview=full&geometries=geojson"
        } else {
            "overview=false"
        };
        format!(
            "{}/route/v1/{}/{},{};{},{}?steps=false&alternatives=false&{overview}&exclude=ferry",
            self.base_url, self.profile, from.lon, from.lat, to.lon, to.lat,
        )
    }

    fn nearest_url(&self, point: GeoPoint) -> String {
        format!(
            "{}/nearest/v1/{}/{},{}?number=1",
            self.base_url, self.profile, point.lon, point.lat,
        )
    }
}

impl Default for OsrmClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_PROFILE)
    }
}

#[async_trait]
impl RoutingOracle for OsrmClient {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Option<Route>, SourceError> {
        let url = self.route_url(from, to);
        let body = retry::send_json(|| self.client.get(&url)).await?;
        body.as_ref().map_or(Ok(None), parse_route)
    }

    async fn nearest(&self, point: GeoPoint) -> Result<Option<Snapped>, SourceError> {
        let url = self.nearest_url(point);
        let body = retry::send_json(|| self.client.get(&url)).await?;
        body.as_ref().map_or(Ok(None), parse_nearest)
    }
}

fn check_code(body: &serde_json::Value) -> Result<bool, SourceError> {
    let code = body["code"].as_str().ok_or_else(|| SourceError::Malformed {
        message: "OSRM response has no code".to_string(),
    })?;
    if code != "Ok" {
        log::debug!("OSRM answered {code}");
    }
    Ok(code == "Ok")
}

/// Parses an OSRM `route` response.
fn parse_route(body: &serde_json::Value) -> Result<Option<Route>, SourceError> {
    if !check_code(body)? {
        return Ok(None);
    }

    let Some(first) = body["routes"].as_array().and_then(|r| r.first()) else {
        return Ok(None);
    };

    let distance = first["distance"]
        .as_f64()
        .ok_or_else(|| SourceError::Malformed {
            message: "Missing distance in OSRM route".to_string(),
        })?;

    let geometry = first["geometry"]["coordinates"].as_array().map(|coords| {
        coords
            .iter()
            .filter_map(|c| Some((c[0].as_f64()?, c[1].as_f64()?)))
            .collect::<LineString<f64>>()
    });

    Ok(Some(Route {
        distance: DistanceEstimate::from_meters(distance),
        geometry,
    }))
}

/// Parses an OSRM `nearest` response.
fn parse_nearest(body: &serde_json::Value) -> Result<Option<Snapped>, SourceError> {
    if !check_code(body)? {
        return Ok(None);
    }

    let Some(first) = body["waypoints"].as_array().and_then(|w| w.first()) else {
        return Ok(None);
    };

    let location = &first["location"];
    let (Some(lon), Some(lat)) = (location[0].as_f64(), location[1].as_f64()) else {
        return Err(SourceError::Malformed {
            message: "Missing location in OSRM waypoint".to_string(),
        });
    };

    Ok(Some(Snapped {
        point: GeoPoint::new(lat, lon),
        distance: DistanceEstimate::from_meters(first["distance"].as_f64().unwrap_or(0.0)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_route_url_in_lon_lat_order() {
        let client = OsrmClient::new("http://osrm:5000/", "driving");
        let url = client.route_url(GeoPoint::new(49.785, 9.925), GeoPoint::new(49.797, 9.928));
        assert_eq!(
            url,
            "http://osrm:5000/route/v1/driving/9.925,49.785;9.928,49.797\
             ?steps=false&alternatives=false&overview=false&exclude=ferry"
        );
    }

    #[test]
    fn builds_nearest_url() {
        let client = OsrmClient::default();
        assert_eq!(
            client.nearest_url(GeoPoint::new(49.79, 9.93)),
            "http://127.0.0.1:5000/nearest/v1/driving/9.93,49.79?number=1"
        );
    }

    #[test]
    fn parses_route() {
        let body = serde_json::json!({
            "code": "Ok",
            "routes": [{
                "distance": 1873.4,
                "duration": 210.0,
                "geometry": { "type": "LineString", "coordinates": [[9.925, 49.785], [9.93, 49.79]] }
            }]
        });
        let route = parse_route(&body).unwrap().unwrap();
        assert!((route.distance.meters() - 1873.4).abs() < 1e-9);
        assert_eq!(route.geometry.unwrap().0.len(), 2);
    }

    #[test]
    fn no_route_is_none() {
        let body = serde_json::json!({ "code": "NoRoute", "routes": [] });
        assert!(parse_route(&body).unwrap().is_none());
    }

    #[test]
    fn parses_nearest() {
        let body = serde_json::json!({
            "code": "Ok",
            "waypoints": [{ "location": [9.9301, 49.7899], "distance": 12.5, "name": "Main" }]
        });
        let snapped = parse_nearest(&body).unwrap().unwrap();
        assert_eq!(snapped.point, GeoPoint::new(49.7899, 9.9301));
        assert!((snapped.distance.meters() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn missing_code_is_malformed() {
        assert!(matches!(
            parse_nearest(&serde_json::json!({})),
            Err(SourceError::Malformed { .. })
        ));
    }
}
