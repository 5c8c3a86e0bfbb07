//! Street geometry for walk and bus legs.
//!
//! Assembly asks a [`GeometryProvider`] for distance, duration and a polyline
//! between two points. The live provider is an OSRM-compatible HTTP router;
//! [`GuardedGeometry`] bounds each call with a timeout and substitutes a
//! straight-line estimate on failure, so geometry never fails a request.

mod error;
mod fallback;
mod osrm;
mod provider;

pub use error::GeometryError;
pub use fallback::{
    DRIVING_SPEED_KMH, GuardedGeometry, StraightLine, URBAN_DETOUR_FACTOR, WALKING_SPEED_KMH,
};
pub use osrm::{OsrmClient, OsrmConfig};
pub use provider::{GeometryProvider, Profile, RouteGeometry};

#[cfg(test)]
pub(crate) use fallback::test_support;
