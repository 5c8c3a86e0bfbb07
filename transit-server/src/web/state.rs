//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::LivePlanner;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Route planner, which also owns the schedule store and graph cache
    pub planner: Arc<LivePlanner>,
}

impl AppState {
    pub fn new(planner: LivePlanner) -> Self {
        Self {
            planner: Arc::new(planner),
        }
    }
}
