//! Itinerary types.
//!
//! An [`Itinerary`] is one complete option from origin to destination: an
//! ordered list of walk and bus [`Step`]s plus the aggregates used to rank it.

use super::{ClockTime, DomainError, GeoPoint, LineId, StopId};

/// Score added per transfer. One transfer outweighs half an hour of travel.
pub const TRANSFER_SCORE: f64 = 1800.0;

/// Walking meters per score point.
pub const WALKING_METERS_PER_POINT: f64 = 100.0;

/// An endpoint of a walk: a coordinate, optionally naming a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub location: GeoPoint,
    pub name: Option<String>,
    pub stop_id: Option<StopId>,
}

impl Place {
    /// A bare coordinate with no name.
    pub fn point(location: GeoPoint) -> Self {
        Self {
            location,
            name: None,
            stop_id: None,
        }
    }
}

/// A stop where a bus ride begins or ends.
#[derive(Debug, Clone, PartialEq)]
pub struct StopPlace {
    pub stop_id: StopId,
    pub name: String,
    pub location: GeoPoint,
}

impl From<StopPlace> for Place {
    fn from(stop: StopPlace) -> Self {
        Place {
            location: stop.location,
            name: Some(stop.name),
            stop_id: Some(stop.stop_id),
        }
    }
}

/// A walk between two coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkStep {
    pub from: Place,
    pub to: Place,
    pub duration_min: u32,
    pub distance_m: f64,
    pub geometry: Option<Vec<GeoPoint>>,
}

/// One ride on one line, from boarding to alighting.
#[derive(Debug, Clone, PartialEq)]
pub struct BusStep {
    pub line_id: LineId,
    pub line_name: String,
    pub color: String,
    pub from: StopPlace,
    pub to: StopPlace,
    /// Scheduled times, when a matching trip was found.
    pub departure: Option<ClockTime>,
    pub arrival: Option<ClockTime>,
    pub stop_count: u32,
    pub duration_min: u32,
    pub distance_m: f64,
    pub geometry: Option<Vec<GeoPoint>>,
}

/// A segment of an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Walk(WalkStep),
    Bus(BusStep),
}

impl Step {
    pub fn duration_min(&self) -> u32 {
        match self {
            Step::Walk(walk) => walk.duration_min,
            Step::Bus(bus) => bus.duration_min,
        }
    }

    pub fn distance_m(&self) -> f64 {
        match self {
            Step::Walk(walk) => walk.distance_m,
            Step::Bus(bus) => bus.distance_m,
        }
    }

    /// Returns the ride if this is a bus step.
    pub fn as_bus(&self) -> Option<&BusStep> {
        match self {
            Step::Bus(bus) => Some(bus),
            Step::Walk(_) => None,
        }
    }

    /// Returns the walk if this is a walk step.
    pub fn as_walk(&self) -> Option<&WalkStep> {
        match self {
            Step::Walk(walk) => Some(walk),
            Step::Bus(_) => None,
        }
    }
}

/// The rides of an itinerary as (line, boarding stop, alighting stop).
///
/// Two itineraries with the same signature differ only in walking.
pub type RideSignature = Vec<(LineId, StopId, StopId)>;

/// A complete option from origin to destination.
///
/// # Invariants
///
/// - At least one step
/// - `duration_min` is the sum of step durations
/// - `transfers` counts adjacent rides on different lines
#[derive(Debug, Clone, PartialEq)]
pub struct Itinerary {
    steps: Vec<Step>,
    duration_min: u32,
    transfers: u32,
    walking_distance_m: f64,
    score: f64,
    departure: ClockTime,
    arrival: ClockTime,
}

impl Itinerary {
    /// Build an itinerary and compute its aggregates.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyItinerary` when `steps` is empty and
    /// `DomainError::ArrivalBeforeDeparture` when the clock runs backwards.
    pub fn new(
        steps: Vec<Step>,
        departure: ClockTime,
        arrival: ClockTime,
    ) -> Result<Self, DomainError> {
        if steps.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }
        if arrival < departure {
            return Err(DomainError::ArrivalBeforeDeparture {
                departure,
                arrival,
            });
        }

        let duration_min = steps.iter().map(Step::duration_min).sum();
        let transfers = count_transfers(&steps);
        let walking_distance_m = steps
            .iter()
            .filter_map(Step::as_walk)
            .map(|w| w.distance_m)
            .sum();
        let score = score(transfers, duration_min, walking_distance_m);

        Ok(Self {
            steps,
            duration_min,
            transfers,
            walking_distance_m,
            score,
            departure,
            arrival,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Total travel time in minutes, excluding waits at stops.
    pub fn duration_min(&self) -> u32 {
        self.duration_min
    }

    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    pub fn walking_distance_m(&self) -> f64 {
        self.walking_distance_m
    }

    /// Ranking score; lower is better.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// When the traveller leaves the origin.
    pub fn departure(&self) -> ClockTime {
        self.departure
    }

    /// When the traveller reaches the destination, waits included.
    pub fn arrival(&self) -> ClockTime {
        self.arrival
    }

    pub fn bus_steps(&self) -> impl Iterator<Item = &BusStep> {
        self.steps.iter().filter_map(Step::as_bus)
    }

    pub fn ride_signature(&self) -> RideSignature {
        self.bus_steps()
            .map(|b| {
                (
                    b.line_id.clone(),
                    b.from.stop_id.clone(),
                    b.to.stop_id.clone(),
                )
            })
            .collect()
    }
}

/// Composite ranking score.
///
/// ```
/// use transit_server::domain::score;
///
/// // One transfer costs more than 29 minutes saved
/// assert!(score(1, 30, 0.0) > score(0, 59, 0.0));
/// assert_eq!(score(0, 20, 350.0), 23.5);
/// ```
pub fn score(transfers: u32, duration_min: u32, walking_distance_m: f64) -> f64 {
    f64::from(transfers) * TRANSFER_SCORE
        + f64::from(duration_min)
        + walking_distance_m / WALKING_METERS_PER_POINT
}

fn count_transfers(steps: &[Step]) -> u32 {
    let rides: Vec<&BusStep> = steps.iter().filter_map(Step::as_bus).collect();
    rides
        .windows(2)
        .filter(|pair| pair[0].line_id != pair[1].line_id)
        .count() as u32
}
