//! Web layer for the bus journey planner.
//!
//! Provides HTTP endpoints for browsing stops and lines and for calculating
//! routes.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
