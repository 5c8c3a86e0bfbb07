//! Journey planner.
//!
//! Answers "how do I get from here to there by bus": the nearest stops
//! around both endpoints are paired up, a penalised Dijkstra search finds a
//! path through the routing graph for each pair, and each path is assembled
//! into an itinerary with scheduled times and street geometry before ranking.

mod assemble;
mod config;
mod rank;
mod routes;
mod search;
mod timetable;

pub use assemble::{AssembleError, Assembler};
pub use config::PlannerConfig;
pub use rank::{arriving_by, deduplicate, rank_itineraries, select_best, within_transfers};
pub use routes::{
    Endpoint, LivePlanner, PlanError, RoutePlanner, RouteRequest, RouteResponse,
};
pub use search::{SearchError, SearchParams, find_path, merge_consecutive, shortest_path};
pub use timetable::{MAX_RIDE_MIN, TripMatch, match_trip};
