//! Straight-line estimates and the timeout/fallback wrapper.

use std::time::Duration;

use tracing::warn;

use crate::domain::{GeoPoint, haversine_m};

use super::error::GeometryError;
use super::provider::{GeometryProvider, Profile, RouteGeometry};

/// Street distance over straight-line distance in an urban grid.
pub const URBAN_DETOUR_FACTOR: f64 = 1.4;

/// Walking speed for estimates, km/h.
pub const WALKING_SPEED_KMH: f64 = 5.0;

/// Bus speed for estimates, km/h.
pub const DRIVING_SPEED_KMH: f64 = 30.0;

/// Estimates routes from great-circle distance. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLine;

impl StraightLine {
    pub fn estimate(&self, from: GeoPoint, to: GeoPoint, profile: Profile) -> RouteGeometry {
        let distance_m = haversine_m(from, to) * URBAN_DETOUR_FACTOR;
        let speed_kmh = match profile {
            Profile::Foot => WALKING_SPEED_KMH,
            Profile::Driving => DRIVING_SPEED_KMH,
        };
        let duration_s = distance_m / (speed_kmh * 1000.0 / 3600.0);

        RouteGeometry {
            distance_m,
            duration_s,
            path: vec![from, to],
            estimated: true,
        }
    }
}

impl GeometryProvider for StraightLine {
    async fn route(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        profile: Profile,
    ) -> Result<RouteGeometry, GeometryError> {
        Ok(self.estimate(from, to, profile))
    }
}

/// Wraps a live provider with a per-call timeout and a straight-line
/// fallback.
///
/// With no live provider every lookup is an estimate.
#[derive(Debug, Clone)]
pub struct GuardedGeometry<P> {
    live: Option<P>,
    fallback: StraightLine,
    timeout: Duration,
}

impl<P: GeometryProvider> GuardedGeometry<P> {
    pub fn new(live: Option<P>, timeout: Duration) -> Self {
        Self {
            live,
            fallback: StraightLine,
            timeout,
        }
    }

    /// Estimates only.
    pub fn offline() -> Self {
        Self::new(None, Duration::ZERO)
    }

    pub fn has_live_provider(&self) -> bool {
        self.live.is_some()
    }

    pub fn live(&self) -> Option<&P> {
        self.live.as_ref()
    }

    /// Route between two points, falling back to an estimate when the live
    /// provider fails or is slow.
    pub async fn resolve(&self, from: GeoPoint, to: GeoPoint, profile: Profile) -> RouteGeometry {
        let Some(live) = &self.live else {
            return self.fallback.estimate(from, to, profile);
        };

        let result = match tokio::time::timeout(self.timeout, live.route(from, to, profile)).await {
            Ok(result) => result,
            Err(_) => Err(GeometryError::Timeout {
                ms: self.timeout.as_millis() as u64,
            }),
        };

        match result {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!(%profile, error = %e, "Routing provider failed, using straight-line estimate");
                self.fallback.estimate(from, to, profile)
            }
        }
    }
}

impl<P: GeometryProvider> GeometryProvider for GuardedGeometry<P> {
    async fn route(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        profile: Profile,
    ) -> Result<RouteGeometry, GeometryError> {
        Ok(self.resolve(from, to, profile).await)
    }
}
