//! Domain types for the bus journey planner.
//!
//! This module contains the core domain model types that represent
//! validated schedule data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod color;
mod error;
mod geo;
mod ids;
mod itinerary;
mod line;
mod stop;
mod time;

pub use color::line_color;
pub use error::DomainError;
pub use geo::{EARTH_RADIUS_M, GeoPoint, InvalidCoordinates, haversine_m};
pub use ids::{InvalidId, LineId, StopId};
pub use itinerary::{
    BusStep, Itinerary, Place, RideSignature, Step, StopPlace, WalkStep, score,
};
pub use line::{INWARD_VIRTUAL, LineRecord, LineStop, LineSummary, OUTWARD, OUTWARD_VIRTUAL};
pub use stop::{NearbyStop, PassingLine, StopDetails, StopSummary};
pub use time::{ClockTime, MINUTES_PER_DAY, TimeError, parse_time_column};
