//! Configuration for the journey planner.

use std::time::Duration;

/// Tunables for path search and route calculation.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Radius around each endpoint searched for stops, in meters.
    /// Requests may override it.
    pub max_walking_distance_m: f64,

    /// Transfers allowed when the request does not say.
    pub max_transfers: u32,

    /// Nearest stops tried on each side of the journey.
    pub candidates_per_side: usize,

    /// Maximum number of itineraries to return.
    pub max_results: usize,

    /// Frontier pops before a search gives up.
    pub max_iterations: usize,

    /// Cost added for riding a line against its timetable direction.
    pub reverse_penalty: u32,

    /// Cost added when the next edge is on a different line.
    pub transfer_penalty: u32,

    /// Candidate stop pairs evaluated at once.
    pub max_concurrent_pairs: usize,

    /// Wall-clock budget for one request, in milliseconds. Pairs still
    /// running at the deadline are dropped.
    pub request_deadline_ms: u64,
}

impl PlannerConfig {
    /// Returns the request deadline as a Duration.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }

    pub fn with_max_walking_distance(mut self, meters: f64) -> Self {
        self.max_walking_distance_m = meters;
        self
    }

    pub fn with_max_concurrent_pairs(mut self, n: usize) -> Self {
        self.max_concurrent_pairs = n.max(1);
        self
    }

    pub fn with_request_deadline_ms(mut self, ms: u64) -> Self {
        self.request_deadline_ms = ms;
        self
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_walking_distance_m: 800.0,
            max_transfers: 2,
            candidates_per_side: 3,
            max_results: 5,
            max_iterations: 10_000,
            reverse_penalty: 100,
            transfer_penalty: 5,
            max_concurrent_pairs: 4,
            request_deadline_ms: 10_000,
        }
    }
}
