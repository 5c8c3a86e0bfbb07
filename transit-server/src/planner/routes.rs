//! Route calculation between two endpoints.
//!
//! An endpoint is a stop id or a coordinate. The nearest stops around each
//! endpoint are paired up, each pair is searched and assembled concurrently,
//! and the resulting itineraries are filtered, ranked and trimmed.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::cache::{GraphCache, GraphStats};
use crate::domain::{ClockTime, GeoPoint, Itinerary, LineId, NearbyStop, Place, StopId};
use crate::geometry::{GeometryProvider, GuardedGeometry, OsrmClient};
use crate::graph::Graph;
use crate::schedule::{ScheduleError, ScheduleStore};

use super::assemble::{AssembleError, Assembler};
use super::config::PlannerConfig;
use super::rank::{arriving_by, select_best, within_transfers};
use super::search::{SearchError, SearchParams, find_path};

/// Error from route calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// The request is malformed or cannot be resolved to coordinates
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An endpoint names an unknown stop
    #[error("stop not found: {0}")]
    StopNotFound(StopId),

    /// A lookup names an unknown line
    #[error("line not found: {0}")]
    LineNotFound(LineId),

    /// The schedule corpus could not be read
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ScheduleError> for PlanError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::StopNotFound(id) => PlanError::StopNotFound(id),
            ScheduleError::LineNotFound(id) => PlanError::LineNotFound(id),
            other @ (ScheduleError::Io { .. } | ScheduleError::Parse { .. }) => {
                PlanError::Internal(other.to_string())
            }
        }
    }
}

/// One end of a journey.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    Stop(StopId),
    Point(GeoPoint),
}

/// Request for route calculation.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub from: Endpoint,
    pub to: Endpoint,

    /// Overrides the configured walking radius.
    pub max_walking_distance_m: Option<f64>,

    /// Overrides the configured transfer limit.
    pub max_transfers: Option<u32>,

    /// Defaults to the current local time.
    pub departure: Option<ClockTime>,

    /// Itineraries arriving later are dropped.
    pub arrival_by: Option<ClockTime>,

    pub excluded_lines: HashSet<LineId>,
}

impl RouteRequest {
    /// Create a request with no overrides.
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self {
            from,
            to,
            max_walking_distance_m: None,
            max_transfers: None,
            departure: None,
            arrival_by: None,
            excluded_lines: HashSet::new(),
        }
    }

    pub fn with_departure(mut self, departure: ClockTime) -> Self {
        self.departure = Some(departure);
        self
    }

    pub fn with_excluded_line(mut self, line: LineId) -> Self {
        self.excluded_lines.insert(line);
        self
    }

    /// Validate the request.
    pub fn validate(&self) -> Result<(), PlanError> {
        match self.max_walking_distance_m {
            Some(radius) if !(radius.is_finite() && radius >= 0.0) => Err(
                PlanError::InvalidRequest("maxWalkingDistance must be a non-negative number".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Result of route calculation.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub from: Place,
    pub to: Place,

    /// Itineraries ranked best-first. Empty when nothing connects.
    pub routes: Vec<Itinerary>,

    /// Wall-clock time spent on the calculation, in milliseconds.
    pub calculation_ms: u64,
}

/// Why one candidate pair produced no itinerary.
#[derive(Debug, thiserror::Error)]
enum CandidateError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Route planner over the shared schedule store and graph cache.
pub struct RoutePlanner<P> {
    store: Arc<ScheduleStore>,
    graph: Arc<GraphCache>,
    assembler: Assembler<P>,
    config: PlannerConfig,
}

/// Planner backed by an OSRM-compatible router.
pub type LivePlanner = RoutePlanner<OsrmClient>;

impl<P: GeometryProvider> RoutePlanner<P> {
    pub fn new(
        store: Arc<ScheduleStore>,
        graph: Arc<GraphCache>,
        geometry: GuardedGeometry<P>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            store,
            graph,
            assembler: Assembler::new(geometry),
            config,
        }
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Calculate ranked itineraries for a request.
    ///
    /// Failures of individual candidate pairs are skipped. Pairs still
    /// running at the request deadline are dropped and whatever finished is
    /// returned.
    pub async fn calculate_routes(&self, request: &RouteRequest) -> Result<RouteResponse, PlanError> {
        request.validate()?;
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.request_deadline();

        let from = self.resolve(&request.from).await?;
        let to = self.resolve(&request.to).await?;

        let radius = request
            .max_walking_distance_m
            .unwrap_or(self.config.max_walking_distance_m);
        let starts = self.candidates(from.location, radius).await?;
        let ends = self.candidates(to.location, radius).await?;

        if starts.is_empty() || ends.is_empty() {
            info!(
                starts = starts.len(),
                ends = ends.len(),
                radius, "No stops within walking distance"
            );
            return Ok(RouteResponse {
                from,
                to,
                routes: Vec::new(),
                calculation_ms: elapsed_ms(started),
            });
        }

        let graph = self.graph.get_or_build(&self.store).await?;
        let departure = request
            .departure
            .unwrap_or_else(|| ClockTime::from_naive_time(chrono::Local::now().time()));

        let pairs: Vec<(StopId, StopId)> = starts
            .iter()
            .flat_map(|a| ends.iter().map(move |b| (a.stop.id.clone(), b.stop.id.clone())))
            .filter(|(a, b)| a != b)
            .collect();
        let pair_count = pairs.len();

        let itineraries = {
            let evaluations = stream::iter(pairs)
                .map(|(a, b)| {
                    let (graph, from, to) = (&graph, &from, &to);
                    async move {
                        let result = self
                            .evaluate_pair(graph, &a, &b, from, to, departure, &request.excluded_lines)
                            .await;
                        (a, b, result)
                    }
                })
                .buffer_unordered(self.config.max_concurrent_pairs.max(1));
            let mut evaluations = std::pin::pin!(evaluations);

            let mut itineraries = Vec::new();
            loop {
                match tokio::time::timeout_at(deadline, evaluations.next()).await {
                    Ok(Some((_, _, Ok(itinerary)))) => itineraries.push(itinerary),
                    Ok(Some((a, b, Err(e)))) => {
                        debug!(from = %a, to = %b, error = %e, "Candidate pair skipped");
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            completed = itineraries.len(),
                            pairs = pair_count,
                            "Route calculation deadline reached"
                        );
                        break;
                    }
                }
            }
            itineraries
        };

        let max_transfers = request.max_transfers.unwrap_or(self.config.max_transfers);
        let mut itineraries = within_transfers(itineraries, max_transfers);
        if let Some(arrival_by) = request.arrival_by {
            itineraries = arriving_by(itineraries, arrival_by);
        }
        let routes = select_best(itineraries, self.config.max_results);

        let calculation_ms = elapsed_ms(started);
        info!(
            pairs = pair_count,
            routes = routes.len(),
            calculation_ms,
            "Routes calculated"
        );

        Ok(RouteResponse {
            from,
            to,
            routes,
            calculation_ms,
        })
    }

    /// Resolve an endpoint to a place with coordinates.
    async fn resolve(&self, endpoint: &Endpoint) -> Result<Place, PlanError> {
        match endpoint {
            Endpoint::Point(location) => Ok(Place::point(*location)),
            Endpoint::Stop(id) => {
                let details = self.store.stop_details(id).await?;
                let location = details.location.ok_or_else(|| {
                    PlanError::InvalidRequest(format!("stop {id} has no coordinates"))
                })?;
                Ok(Place {
                    location,
                    name: Some(details.name),
                    stop_id: Some(details.id),
                })
            }
        }
    }

    /// The nearest stops around a point, closest first.
    async fn candidates(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<NearbyStop>, PlanError> {
        let mut nearby = self.store.find_nearby(point, radius_m).await?;
        nearby.truncate(self.config.candidates_per_side);
        Ok(nearby)
    }

    #[allow(clippy::too_many_arguments)]
    async fn evaluate_pair(
        &self,
        graph: &Graph,
        start_stop: &StopId,
        end_stop: &StopId,
        from: &Place,
        to: &Place,
        departure: ClockTime,
        excluded_lines: &HashSet<LineId>,
    ) -> Result<Itinerary, CandidateError> {
        let params = SearchParams::from_config(&self.config, excluded_lines);
        let path = find_path(graph, start_stop, end_stop, &params)?;
        Ok(self.assembler.assemble(&path, from, to, departure).await?)
    }

    /// Drop cached schedule data and the graph.
    pub async fn invalidate(&self) {
        self.store.invalidate();
        self.graph.invalidate().await;
    }

    /// Reload the corpus and swap in a freshly built graph.
    pub async fn rebuild_graph(&self) -> Result<GraphStats, PlanError> {
        self.store.invalidate();
        Ok(self.graph.rebuild(&self.store).await?)
    }

    /// Size of the graph currently held, if built.
    pub async fn graph_stats(&self) -> Option<GraphStats> {
        self.graph.stats().await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
