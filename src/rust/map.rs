//! Geocoding of the free-text address and the risk heatmap grid.
//!
//! Nothing here can fail from the caller's point of view: any lookup
//! problem resolves to [`DEFAULT_LOCATION`] and is reported as a fallback.

use std::time::Duration;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::formatter::Probabilities;

/// Butte County, California.
pub const DEFAULT_LOCATION: Coordinates = Coordinates { lat: 39.7233, lon: -121.9026 };

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const USER_AGENT: &str = concat!("firerisk/", env!("CARGO_PKG_VERSION"));

/// Grid half-width in steps; the grid is `(2 * HALF_WIDTH + 1)` points square.
const HALF_WIDTH: i32 = 5;

/// Default spacing between grid points, roughly 5 km at these latitudes.
pub const DEFAULT_GRID_SPACING: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Where a lookup landed and whether it had to fall back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub query: String,
    pub coordinates: Coordinates,
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<String>,
    lon: Option<String>,
}

/// Builds the search string sent to the geocoder.
pub fn address_query(city: &str, county: &str, community: &str) -> String {
    format!("{}, {}, {}, California, USA", city, county, community)
}

/// Extracts the first place from a Nominatim `jsonv2` search response.
///
/// A place with a missing coordinate uses the default for that coordinate;
/// an empty result list or an unparsable body yields `None`.
pub fn parse_search_response(body: &str) -> Option<Coordinates> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body).ok()?;
    let place = places.into_iter().next()?;
    let lat = match place.lat {
        Some(lat) => lat.parse().ok()?,
        None => DEFAULT_LOCATION.lat,
    };
    let lon = match place.lon {
        Some(lon) => lon.parse().ok()?,
        None => DEFAULT_LOCATION.lon,
    };
    Some(Coordinates { lat, lon })
}

/// Address lookup against a Nominatim-compatible endpoint.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new(NOMINATIM_URL)
    }
}

impl Geocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    async fn search(&self, query: &str) -> Result<String, reqwest::Error> {
        let url = format!("{}/search", self.base_url);
        info!("Geocoding location: {}", query);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;
        response.text().await
    }

    /// Resolves an address, falling back to [`DEFAULT_LOCATION`] on any
    /// network, status or parse failure and on an empty result.
    pub async fn locate(&self, city: &str, county: &str, community: &str) -> GeocodeResult {
        let query = address_query(city, county, community);
        let found = match self.search(&query).await {
            Ok(body) => parse_search_response(&body),
            Err(e) => {
                error!("Error in geocoding request: {}", e);
                None
            }
        };

        match found {
            Some(coordinates) => GeocodeResult { query, coordinates, fallback: false },
            None => {
                warn!("Falling back to default coordinates for '{}'", query);
                GeocodeResult { query, coordinates: DEFAULT_LOCATION, fallback: true }
            }
        }
    }
}

/// One heatmap sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// Lays out the risk heatmap around a location.
///
/// Intensity peaks at the centre with the highest class probability and
/// falls off linearly with grid distance: half of the peak at the edge
/// midpoints, zero at the corners.
pub fn heatmap_grid(
    center: Coordinates,
    probabilities: &Probabilities,
    spacing: f64,
) -> Vec<HeatPoint> {
    let peak = probabilities.max();
    let half = f64::from(HALF_WIDTH);
    let mut points = Vec::with_capacity(((2 * HALF_WIDTH + 1) * (2 * HALF_WIDTH + 1)) as usize);
    for i in -HALF_WIDTH..=HALF_WIDTH {
        for j in -HALF_WIDTH..=HALF_WIDTH {
            let falloff = (f64::from(i.abs()) / half + f64::from(j.abs()) / half) / 2.0;
            points.push(HeatPoint {
                lat: center.lat + f64::from(i) * spacing,
                lon: center.lon + f64::from(j) * spacing,
                intensity: peak * (1.0 - falloff),
            });
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::format;
    use crate::labels::LabelMapping;

    #[test]
    fn test_parse_search_response() {
        let body = r#"[{"place_id": 1, "lat": "39.7596", "lon": "-121.6219",
            "display_name": "Paradise"}]"#;
        assert_eq!(parse_search_response(body), Some(Coordinates { lat: 39.7596, lon: -121.6219 }));
        assert_eq!(parse_search_response("[]"), None);
        assert_eq!(parse_search_response("<html>busy</html>"), None);
        assert_eq!(parse_search_response(r#"[{"lat": "north", "lon": "1"}]"#), None);
        assert_eq!(
            parse_search_response(r#"[{"lon": "-120.5"}]"#),
            Some(Coordinates { lat: DEFAULT_LOCATION.lat, lon: -120.5 })
        );
    }

    #[test]
    fn test_address_query() {
        assert_eq!(
            address_query("Paradise", "Butte", "Magalia"),
            "Paradise, Butte, Magalia, California, USA"
        );
    }

    #[test]
    fn test_heatmap_grid() {
        let labels = LabelMapping::new(vec!["low".into(), "high".into()]).unwrap();
        let probabilities = format(1, &[0.2, 0.8], &labels).unwrap().probabilities;
        let center = Coordinates { lat: 39.0, lon: -121.0 };
        let grid = heatmap_grid(center, &probabilities, 0.1);

        assert_eq!(grid.len(), 121);
        let middle = grid[60];
        assert_eq!((middle.lat, middle.lon), (39.0, -121.0));
        assert!((middle.intensity - 0.8).abs() < 1e-12);

        let corner = grid[0];
        assert!((corner.lat - 38.5).abs() < 1e-9);
        assert!((corner.lon + 121.5).abs() < 1e-9);
        assert!(corner.intensity.abs() < 1e-12);

        let edge = grid[5];
        assert!((edge.intensity - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_locate_falls_back_on_bad_endpoint() {
        let geocoder = Geocoder::new("not a url");
        let result = tokio_test::block_on(geocoder.locate("Paradise", "Butte", "Magalia"));
        assert!(result.fallback);
        assert_eq!(result.coordinates, DEFAULT_LOCATION);
    }

    #[tokio::test]
    async fn test_locate_falls_back_when_unreachable() {
        let geocoder = Geocoder::new("http://127.0.0.1:9");
        let result = geocoder.locate("Paradise", "Butte", "").await;
        assert!(result.fallback);
        assert_eq!(result.coordinates, DEFAULT_LOCATION);
        assert_eq!(result.query, "Paradise, Butte, , California, USA");
    }
}
