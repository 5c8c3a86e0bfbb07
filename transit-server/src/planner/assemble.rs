//! Turning an edge path into an itinerary.
//!
//! Each merged edge becomes a bus step with schedule-matched times where a
//! trip fits, and the averaged edge duration otherwise. Walks are added
//! between the requested endpoints and the first and last stops of the path.

use futures::future::join_all;

use crate::domain::{
    BusStep, ClockTime, DomainError, GeoPoint, Itinerary, LineId, Place, Step, StopPlace,
    WalkStep, haversine_m, line_color,
};
use crate::geometry::{GeometryProvider, GuardedGeometry, Profile, RouteGeometry};
use crate::graph::Edge;

use super::timetable::match_trip;

/// Walks shorter than this are dropped.
const MIN_WALK_M: f64 = 1.0;

/// Error from itinerary assembly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssembleError {
    #[error("path has no edges")]
    EmptyPath,

    #[error("stop {index} of line {line} has no usable coordinates")]
    MissingStopLocation { line: LineId, index: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Builds itineraries, resolving street geometry through a guarded provider.
#[derive(Debug, Clone)]
pub struct Assembler<P> {
    geometry: GuardedGeometry<P>,
}

impl<P: GeometryProvider> Assembler<P> {
    pub fn new(geometry: GuardedGeometry<P>) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &GuardedGeometry<P> {
        &self.geometry
    }

    /// Assemble an itinerary for `path`, leaving `start` at `departure` and
    /// ending at `end`.
    pub async fn assemble(
        &self,
        path: &[Edge],
        start: &Place,
        end: &Place,
        departure: ClockTime,
    ) -> Result<Itinerary, AssembleError> {
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return Err(AssembleError::EmptyPath);
        };

        let mut steps = Vec::with_capacity(path.len() + 2);
        let mut clock = departure;

        let boarding: Place = stop_place(first, first.from_index)?.into();
        let leading_walk = self.walk(start, &boarding).await;
        let leading_min = leading_walk.as_ref().map_or(0, |w| w.duration_min);
        if let Some(walk) = leading_walk {
            clock = clock.add_minutes(walk.duration_min);
            steps.push(Step::Walk(walk));
        }

        let mut first_departure = None;
        for edge in path {
            let ride = self.ride(edge, clock).await?;
            clock = match ride.arrival {
                Some(arrival) => arrival,
                None => clock.add_minutes(ride.duration_min),
            };
            if first_departure.is_none() {
                first_departure = Some(ride.departure);
            }
            steps.push(Step::Bus(ride));
        }

        let alighting: Place = stop_place(last, last.to_index)?.into();
        if let Some(walk) = self.walk(&alighting, end).await {
            clock = clock.add_minutes(walk.duration_min);
            steps.push(Step::Walk(walk));
        }

        // Leave just in time for the first scheduled bus
        let leave_at = match first_departure.flatten() {
            Some(bus) => ClockTime::from_minutes(
                bus.as_minutes()
                    .saturating_sub(leading_min)
                    .max(departure.as_minutes()),
            ),
            None => departure,
        };

        Ok(Itinerary::new(steps, leave_at, clock)?)
    }

    /// A walk between two places, or `None` when they coincide.
    async fn walk(&self, from: &Place, to: &Place) -> Option<WalkStep> {
        if from.stop_id.is_some() && from.stop_id == to.stop_id {
            return None;
        }
        if haversine_m(from.location, to.location) < MIN_WALK_M {
            return None;
        }

        let route = self
            .geometry
            .resolve(from.location, to.location, Profile::Foot)
            .await;
        Some(WalkStep {
            from: from.clone(),
            to: to.clone(),
            duration_min: route.duration_min(),
            distance_m: route.distance_m,
            geometry: Some(route.path),
        })
    }

    /// A bus step for one merged edge, boarding no earlier than `ready`.
    async fn ride(&self, edge: &Edge, ready: ClockTime) -> Result<BusStep, AssembleError> {
        let points = stop_points(edge)?;
        let hops = join_all(
            points
                .windows(2)
                .map(|pair| self.geometry.resolve(pair[0], pair[1], Profile::Driving)),
        )
        .await;
        let distance_m = hops.iter().map(|h| h.distance_m).sum();

        let trip = match_trip(&edge.line, edge.from_index, edge.to_index, ready);
        let (departure, arrival, duration_min) = match trip {
            Some(m) => (Some(m.departure), Some(m.arrival), m.duration_min),
            None => (None, None, edge.duration_min),
        };

        Ok(BusStep {
            line_id: edge.line_id().clone(),
            line_name: edge.line_name().to_string(),
            color: line_color(edge.line_id()),
            from: stop_place(edge, edge.from_index)?,
            to: stop_place(edge, edge.to_index)?,
            departure,
            arrival,
            stop_count: edge.stop_count,
            duration_min,
            distance_m,
            geometry: Some(concat_paths(hops)),
        })
    }
}

/// The stop at `index` on the edge's line.
fn stop_place(edge: &Edge, index: usize) -> Result<StopPlace, AssembleError> {
    let missing = || AssembleError::MissingStopLocation {
        line: edge.line_id().clone(),
        index,
    };
    let stop = edge.line.stops.get(index).ok_or_else(missing)?;
    let (Some(stop_id), Some(location)) = (&stop.stop_id, stop.location) else {
        return Err(missing());
    };

    Ok(StopPlace {
        stop_id: stop_id.clone(),
        name: stop.name.clone(),
        location,
    })
}

/// Coordinates of every stop the edge passes, in travel order.
fn stop_points(edge: &Edge) -> Result<Vec<GeoPoint>, AssembleError> {
    let indices: Vec<usize> = if edge.from_index <= edge.to_index {
        (edge.from_index..=edge.to_index).collect()
    } else {
        (edge.to_index..=edge.from_index).rev().collect()
    };

    indices
        .into_iter()
        .map(|index| {
            edge.line
                .stops
                .get(index)
                .and_then(|s| s.location)
                .ok_or_else(|| AssembleError::MissingStopLocation {
                    line: edge.line_id().clone(),
                    index,
                })
        })
        .collect()
}

/// Join hop polylines, dropping the point shared by consecutive hops.
fn concat_paths(hops: Vec<RouteGeometry>) -> Vec<GeoPoint> {
    let mut path: Vec<GeoPoint> = Vec::new();
    for hop in hops {
        let mut points = hop.path.into_iter().peekable();
        if path.last().is_some() && path.last() == points.peek() {
            points.next();
        }
        path.extend(points);
    }
    path
}
