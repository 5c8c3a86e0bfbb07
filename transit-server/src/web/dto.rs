//! Data transfer objects for web requests and responses.
//!
//! Field names are camelCase on the wire. Clock times are "HH:MM" strings and
//! geometry is a list of `[lat, lon]` pairs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cache::GraphStats;
use crate::domain::{
    BusStep, ClockTime, GeoPoint, InvalidCoordinates, Itinerary, LineId, LineRecord, LineStop,
    LineSummary, NearbyStop, PassingLine, Place, Step, StopDetails, StopId, StopPlace,
    StopSummary, TimeError, WalkStep,
};
use crate::planner::{Endpoint, RouteRequest, RouteResponse};
use crate::schedule::CorpusStats;

/// Query for the search endpoints.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring to match
    #[serde(default)]
    pub q: String,
}

/// Query for nearby stops.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,

    /// Radius in meters (defaults to the walking distance limit)
    pub radius: Option<f64>,
}

/// A stop in listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResult {
    pub id: String,
    pub name: String,
    pub city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl StopResult {
    pub fn from_summary(stop: &StopSummary) -> Self {
        Self {
            id: stop.id.to_string(),
            name: stop.name.clone(),
            city: stop.city.clone(),
            lat: stop.location.map(|p| p.lat()),
            lon: stop.location.map(|p| p.lon()),
        }
    }
}

/// A stop found near a point.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStopResult {
    #[serde(flatten)]
    pub stop: StopResult,

    /// Great-circle distance in meters
    pub distance: f64,
}

impl NearbyStopResult {
    pub fn from_nearby(nearby: &NearbyStop) -> Self {
        Self {
            stop: StopResult::from_summary(&nearby.stop),
            distance: round_m(nearby.distance_m),
        }
    }
}

/// A line calling at a stop.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassingLineResult {
    pub line_id: String,
    pub line_name: String,
    pub direction: Option<String>,
    pub times: Vec<Option<String>>,
}

impl PassingLineResult {
    fn from_passing(line: &PassingLine) -> Self {
        Self {
            line_id: line.line_id.to_string(),
            line_name: line.line_name.clone(),
            direction: line.direction.clone(),
            times: format_times(&line.times),
        }
    }
}

/// A stop with every line that calls at it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDetailsResponse {
    pub id: String,
    pub name: String,
    pub city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accessible: bool,
    pub lines: Vec<PassingLineResult>,
}

impl StopDetailsResponse {
    pub fn from_details(details: &StopDetails) -> Self {
        Self {
            id: details.id.to_string(),
            name: details.name.clone(),
            city: details.city.clone(),
            lat: details.location.map(|p| p.lat()),
            lon: details.location.map(|p| p.lon()),
            accessible: details.accessible,
            lines: details
                .passing_lines
                .iter()
                .map(PassingLineResult::from_passing)
                .collect(),
        }
    }
}

/// A line in listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResult {
    pub id: String,
    pub name: String,
    pub direction: Option<String>,
}

impl LineResult {
    pub fn from_summary(line: &LineSummary) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            direction: line.direction.clone(),
        }
    }
}

/// One stop of a full line timetable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStopResult {
    pub stop_id: Option<String>,
    pub name: String,
    pub city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accessible: bool,
    pub times: Vec<Option<String>>,
}

impl LineStopResult {
    fn from_stop(stop: &LineStop) -> Self {
        Self {
            stop_id: stop.stop_id.as_ref().map(StopId::to_string),
            name: stop.name.clone(),
            city: stop.city.clone(),
            lat: stop.location.map(|p| p.lat()),
            lon: stop.location.map(|p| p.lon()),
            accessible: stop.accessible,
            times: format_times(&stop.times),
        }
    }
}

/// A full line record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDetailsResponse {
    pub id: String,
    pub name: String,
    pub direction: Option<String>,
    pub line_ref: Option<String>,
    pub color: String,
    pub stops: Vec<LineStopResult>,
    pub notes: Vec<String>,
}

impl LineDetailsResponse {
    pub fn from_line(line: &LineRecord) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.name.clone(),
            direction: line.direction.clone(),
            line_ref: line.line_ref.clone(),
            color: crate::domain::line_color(&line.id),
            stops: line.stops.iter().map(LineStopResult::from_stop).collect(),
            notes: line.notes.clone(),
        }
    }
}

/// A route request that cannot be turned into a planner request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestError {
    /// Neither a stop id nor both coordinates were given
    #[error("{side}: either stopId or lat and lon are required")]
    MissingEndpoint { side: &'static str },

    /// Coordinates out of range
    #[error("{side}: {source}")]
    InvalidCoordinates {
        side: &'static str,
        source: InvalidCoordinates,
    },

    /// A time that is not "HH:MM"
    #[error("{field}: {source}")]
    InvalidTime {
        field: &'static str,
        source: TimeError,
    },
}

/// An endpoint as sent by clients: a stop id or a coordinate.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub stop_id: Option<String>,
}

impl EndpointRequest {
    /// A stop id wins over coordinates when both are given.
    fn to_endpoint(&self, side: &'static str) -> Result<Endpoint, RequestError> {
        // Blank ids parse to an error and fall through to coordinates
        if let Some(id) = self.stop_id.as_deref().and_then(|id| StopId::parse(id).ok()) {
            return Ok(Endpoint::Stop(id));
        }

        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon)
                .map(Endpoint::Point)
                .map_err(|source| RequestError::InvalidCoordinates { side, source }),
            _ => Err(RequestError::MissingEndpoint { side }),
        }
    }
}

/// Request to calculate routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRoutesRequest {
    pub from: EndpointRequest,
    pub to: EndpointRequest,

    /// Meters (defaults to the configured limit)
    pub max_walking_distance: Option<f64>,

    pub max_transfers: Option<u32>,

    /// "HH:MM" (defaults to now)
    pub departure_time: Option<String>,

    /// "HH:MM"; routes arriving later are dropped
    pub arrival_time: Option<String>,

    #[serde(default)]
    pub excluded_lines: Vec<String>,
}

impl CalculateRoutesRequest {
    /// Validate and convert into a planner request.
    pub fn into_route_request(self) -> Result<RouteRequest, RequestError> {
        let from = self.from.to_endpoint("from")?;
        let to = self.to.to_endpoint("to")?;

        let departure = parse_optional_time(self.departure_time.as_deref(), "departureTime")?;
        let arrival_by = parse_optional_time(self.arrival_time.as_deref(), "arrivalTime")?;

        // Blank entries are ignored
        let excluded_lines = self
            .excluded_lines
            .iter()
            .filter_map(|id| LineId::parse(id).ok())
            .collect::<HashSet<_>>();

        let mut request = RouteRequest::new(from, to);
        request.max_walking_distance_m = self.max_walking_distance;
        request.max_transfers = self.max_transfers;
        request.departure = departure;
        request.arrival_by = arrival_by;
        request.excluded_lines = excluded_lines;
        Ok(request)
    }
}

fn parse_optional_time(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<ClockTime>, RequestError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            ClockTime::parse_hhmm(v).map_err(|source| RequestError::InvalidTime { field, source })
        })
        .transpose()
}

/// A resolved point in a route response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointResult {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
}

impl PointResult {
    pub fn from_place(place: &Place) -> Self {
        Self {
            lat: place.location.lat(),
            lon: place.location.lon(),
            name: place.name.clone(),
            stop_id: place.stop_id.as_ref().map(StopId::to_string),
        }
    }

    fn from_stop(stop: &StopPlace) -> Self {
        Self {
            lat: stop.location.lat(),
            lon: stop.location.lon(),
            name: Some(stop.name.clone()),
            stop_id: Some(stop.stop_id.to_string()),
        }
    }
}

/// A walk in an itinerary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkResult {
    pub from: PointResult,
    pub to: PointResult,
    /// Minutes
    pub duration: u32,
    /// Meters
    pub distance: f64,
    pub geometry: Option<Vec<[f64; 2]>>,
}

impl WalkResult {
    fn from_walk(walk: &WalkStep) -> Self {
        Self {
            from: PointResult::from_place(&walk.from),
            to: PointResult::from_place(&walk.to),
            duration: walk.duration_min,
            distance: round_m(walk.distance_m),
            geometry: walk.geometry.as_deref().map(polyline),
        }
    }
}

/// A bus ride in an itinerary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusResult {
    pub line_id: String,
    pub line_name: String,
    pub color: String,
    pub from: PointResult,
    pub to: PointResult,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub stop_count: u32,
    /// Minutes
    pub duration: u32,
    /// Meters
    pub distance: f64,
    pub geometry: Option<Vec<[f64; 2]>>,
}

impl BusResult {
    fn from_bus(bus: &BusStep) -> Self {
        Self {
            line_id: bus.line_id.to_string(),
            line_name: bus.line_name.clone(),
            color: bus.color.clone(),
            from: PointResult::from_stop(&bus.from),
            to: PointResult::from_stop(&bus.to),
            departure_time: bus.departure.map(|t| t.to_string()),
            arrival_time: bus.arrival.map(|t| t.to_string()),
            stop_count: bus.stop_count,
            duration: bus.duration_min,
            distance: round_m(bus.distance_m),
            geometry: bus.geometry.as_deref().map(polyline),
        }
    }
}

/// A step of an itinerary.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepResult {
    Walk(WalkResult),
    Bus(BusResult),
}

impl StepResult {
    pub fn from_step(step: &Step) -> Self {
        match step {
            Step::Walk(walk) => StepResult::Walk(WalkResult::from_walk(walk)),
            Step::Bus(bus) => StepResult::Bus(BusResult::from_bus(bus)),
        }
    }
}

/// One itinerary option.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryResult {
    /// Minutes
    pub duration: u32,
    pub transfers: u32,
    /// Meters
    pub walking_distance: f64,
    pub score: f64,
    pub departure_time: String,
    pub arrival_time: String,
    pub steps: Vec<StepResult>,
}

impl ItineraryResult {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            duration: itinerary.duration_min(),
            transfers: itinerary.transfers(),
            walking_distance: round_m(itinerary.walking_distance_m()),
            score: itinerary.score(),
            departure_time: itinerary.departure().to_string(),
            arrival_time: itinerary.arrival().to_string(),
            steps: itinerary.steps().iter().map(StepResult::from_step).collect(),
        }
    }
}

/// Response for route calculation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRoutesResponse {
    pub from: PointResult,
    pub to: PointResult,
    pub routes: Vec<ItineraryResult>,
    /// Milliseconds
    pub calculation_time: u64,
}

impl CalculateRoutesResponse {
    pub fn from_response(response: &RouteResponse) -> Self {
        Self {
            from: PointResult::from_place(&response.from),
            to: PointResult::from_place(&response.to),
            routes: response
                .routes
                .iter()
                .map(ItineraryResult::from_itinerary)
                .collect(),
            calculation_time: response.calculation_ms,
        }
    }
}

/// Size of the routing graph.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GraphStatsResponse {
    pub stops: usize,
    pub edges: usize,
    pub lines: usize,
}

impl From<GraphStats> for GraphStatsResponse {
    fn from(stats: GraphStats) -> Self {
        Self {
            stops: stats.stops,
            edges: stats.edges,
            lines: stats.lines,
        }
    }
}

/// Cache and corpus status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub files: Vec<String>,
    pub lines_cached: bool,
    pub stops_cached: bool,
    /// Absent until the graph is first built
    pub graph: Option<GraphStatsResponse>,
}

impl CacheStatsResponse {
    pub fn new(corpus: CorpusStats, graph: Option<GraphStats>) -> Self {
        Self {
            files: corpus.files,
            lines_cached: corpus.lines_cached,
            stops_cached: corpus.stops_cached,
            graph: graph.map(GraphStatsResponse::from),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

fn format_times(times: &[Option<ClockTime>]) -> Vec<Option<String>> {
    times.iter().map(|t| t.map(|t| t.to_string())).collect()
}

fn polyline(points: &[GeoPoint]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.lat(), p.lon()]).collect()
}

/// Round to a tenth of a meter.
fn round_m(meters: f64) -> f64 {
    (meters * 10.0).round() / 10.0
}
