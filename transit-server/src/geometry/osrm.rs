//! OSRM-compatible routing client.
//!
//! Calls `GET {base}/route/v1/{profile}/{lon},{lat};{lon},{lat}` with GeoJSON
//! geometry and turns the first route into a [`RouteGeometry`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::GeoPoint;

use super::error::GeometryError;
use super::provider::{GeometryProvider, Profile, RouteGeometry};

/// Default base URL of the public OSRM demo server.
const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// `[lon, lat]` pairs.
    coordinates: Vec<[f64; 2]>,
}

/// Configuration for the routing client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_ms: 3000,
        }
    }
}

impl OsrmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// HTTP client for an OSRM-compatible router.
///
/// Uses a semaphore to limit concurrent requests.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, GeometryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    fn route_url(&self, from: GeoPoint, to: GeoPoint, profile: Profile) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url,
            profile.as_str(),
            from.lon(),
            from.lat(),
            to.lon(),
            to.lat()
        )
    }

    async fn fetch(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        profile: Profile,
    ) -> Result<RouteGeometry, GeometryError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| GeometryError::Unavailable)?;

        let url = self.route_url(from, to, profile);
        let response = self
            .http
            .get(&url)
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // OSRM reports "no route" as 400 with a JSON body
        let parsed: Result<OsrmResponse, _> = serde_json::from_str(&body);
        if !status.is_success() && parsed.is_err() {
            return Err(GeometryError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        let parsed = parsed.map_err(|e| GeometryError::Json {
            message: e.to_string(),
        })?;

        let geometry = into_geometry(parsed)?;
        debug!(
            %profile,
            distance_m = geometry.distance_m,
            points = geometry.path.len(),
            "Routed"
        );
        Ok(geometry)
    }
}

fn into_geometry(response: OsrmResponse) -> Result<RouteGeometry, GeometryError> {
    if response.code != "Ok" {
        let code = match response.message {
            Some(message) => format!("{} ({})", response.code, message),
            None => response.code,
        };
        return Err(GeometryError::NoRoute { code });
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| GeometryError::NoRoute {
            code: "empty route list".to_string(),
        })?;

    let path = route
        .geometry
        .coordinates
        .iter()
        .filter_map(|[lon, lat]| GeoPoint::new(*lat, *lon).ok())
        .collect();

    Ok(RouteGeometry {
        distance_m: route.distance,
        duration_s: route.duration,
        path,
        estimated: false,
    })
}

impl GeometryProvider for OsrmClient {
    async fn route(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        profile: Profile,
    ) -> Result<RouteGeometry, GeometryError> {
        self.fetch(from, to, profile).await
    }
}
