//! Stop read models derived from the schedule corpus.

use super::{ClockTime, GeoPoint, LineId, StopId};

/// A stop as listed across the whole corpus, deduplicated by id.
#[derive(Debug, Clone, PartialEq)]
pub struct StopSummary {
    pub id: StopId,
    pub name: String,
    pub city: String,
    pub location: Option<GeoPoint>,
}

/// A line calling at a stop, with its departures there.
#[derive(Debug, Clone, PartialEq)]
pub struct PassingLine {
    pub line_id: LineId,
    pub line_name: String,
    pub direction: Option<String>,
    pub times: Vec<Option<ClockTime>>,
}

/// A stop together with every line that calls at it.
#[derive(Debug, Clone, PartialEq)]
pub struct StopDetails {
    pub id: StopId,
    pub name: String,
    pub city: String,
    pub location: Option<GeoPoint>,
    pub accessible: bool,
    pub passing_lines: Vec<PassingLine>,
}

/// A stop found by a proximity search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStop {
    pub stop: StopSummary,
    pub location: GeoPoint,
    pub distance_m: f64,
}
