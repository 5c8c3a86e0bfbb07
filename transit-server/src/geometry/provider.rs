//! The geometry capability used by itinerary assembly.

use std::fmt;
use std::future::Future;

use crate::domain::GeoPoint;

use super::error::GeometryError;

/// Travel mode for a geometry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Foot,
    Driving,
}

impl Profile {
    /// Path segment used by OSRM-style services.
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Foot => "foot",
            Profile::Driving => "driving",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-to-point route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Polyline from origin to destination.
    pub path: Vec<GeoPoint>,
    /// True when derived from straight-line distance rather than a router.
    pub estimated: bool,
}

impl RouteGeometry {
    /// Duration in whole minutes, never less than one.
    pub fn duration_min(&self) -> u32 {
        ((self.duration_s / 60.0).round() as u32).max(1)
    }
}

/// Something that can route between two points.
///
/// This abstraction allows assembly to be tested without a live router.
pub trait GeometryProvider: Send + Sync {
    fn route(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        profile: Profile,
    ) -> impl Future<Output = Result<RouteGeometry, GeometryError>> + Send;
}
