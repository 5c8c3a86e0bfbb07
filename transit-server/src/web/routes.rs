//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{error, info, warn};

use crate::domain::{GeoPoint, LineId, StopId};
use crate::planner::PlanError;
use crate::schedule::ScheduleError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stops", get(list_stops))
        .route("/api/stops/search", get(search_stops))
        .route("/api/stops/nearby", get(nearby_stops))
        .route("/api/stops/:id", get(stop_details))
        .route("/api/lines", get(list_lines))
        .route("/api/lines/search", get(search_lines))
        .route("/api/lines/:id", get(line_details))
        .route("/api/routes/calculate", post(calculate_routes))
        .route("/cache/invalidate", post(invalidate_cache))
        .route("/cache/stats", get(cache_stats))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Every known stop.
async fn list_stops(State(state): State<AppState>) -> Result<Json<Vec<StopResult>>, AppError> {
    let stops = state.planner.store().all_stops().await?;
    Ok(Json(stops.iter().map(StopResult::from_summary).collect()))
}

/// Stops whose name contains the query.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<SearchQuery>,
) -> Result<Json<Vec<StopResult>>, AppError> {
    let stops = state.planner.store().search_stops(&req.q).await?;
    Ok(Json(stops.iter().map(StopResult::from_summary).collect()))
}

/// Stops within a radius of a point, nearest first.
async fn nearby_stops(
    State(state): State<AppState>,
    Query(req): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyStopResult>>, AppError> {
    let point = GeoPoint::new(req.lat, req.lon).map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;

    let radius = req
        .radius
        .unwrap_or(state.planner.config().max_walking_distance_m);
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(AppError::BadRequest {
            message: format!("Invalid radius: {radius}"),
        });
    }

    let nearby = state.planner.store().find_nearby(point, radius).await?;
    Ok(Json(nearby.iter().map(NearbyStopResult::from_nearby).collect()))
}

/// A stop and every line calling at it.
async fn stop_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StopDetailsResponse>, AppError> {
    let id = StopId::parse(&id).map_err(|e| AppError::BadRequest {
        message: format!("Invalid stop id: {e}"),
    })?;
    let details = state.planner.store().stop_details(&id).await?;
    Ok(Json(StopDetailsResponse::from_details(&details)))
}

/// Every line.
async fn list_lines(State(state): State<AppState>) -> Result<Json<Vec<LineResult>>, AppError> {
    let lines = state.planner.store().all_lines().await?;
    Ok(Json(lines.iter().map(LineResult::from_summary).collect()))
}

/// Lines whose id or name contains the query.
async fn search_lines(
    State(state): State<AppState>,
    Query(req): Query<SearchQuery>,
) -> Result<Json<Vec<LineResult>>, AppError> {
    let lines = state.planner.store().search_lines(&req.q).await?;
    Ok(Json(lines.iter().map(LineResult::from_summary).collect()))
}

/// A full line timetable.
async fn line_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LineDetailsResponse>, AppError> {
    let id = LineId::parse(&id).map_err(|e| AppError::BadRequest {
        message: format!("Invalid line id: {e}"),
    })?;
    let line = state.planner.store().line_by_id(&id).await?;
    Ok(Json(LineDetailsResponse::from_line(&line)))
}

/// Calculate ranked itineraries between two endpoints.
async fn calculate_routes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CalculateRoutesResponse>, AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: CalculateRoutesRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "Rejected route request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    let request = req.into_route_request()?;

    let response = state.planner.calculate_routes(&request).await?;
    Ok(Json(CalculateRoutesResponse::from_response(&response)))
}

/// Reload the corpus and rebuild the routing graph.
async fn invalidate_cache(
    State(state): State<AppState>,
) -> Result<Json<GraphStatsResponse>, AppError> {
    let stats = state.planner.rebuild_graph().await?;
    info!(
        stops = stats.stops,
        edges = stats.edges,
        lines = stats.lines,
        "Graph rebuilt on request"
    );
    Ok(Json(stats.into()))
}

/// Corpus files and cache state.
async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStatsResponse>, AppError> {
    let corpus = state.planner.store().stats().await?;
    let graph = state.planner.graph_stats().await;
    Ok(Json(CacheStatsResponse::new(corpus, graph)))
}

/// Body of every 500 response.
const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::InvalidRequest(message) => AppError::BadRequest { message },
            PlanError::StopNotFound(_) | PlanError::LineNotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
            PlanError::Internal(message) => AppError::Internal { message },
        }
    }
}

impl From<RequestError> for AppError {
    fn from(e: RequestError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(e: ScheduleError) -> Self {
        PlanError::from(e).into()
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Internal { message } => message,
        };

        // Internal details stay in the log
        let error = if status.is_server_error() {
            error!(%status, %message, "Request failed");
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            warn!(%status, %message, "Request rejected");
            message
        };

        let body = Json(ErrorResponse { error });
        (status, body).into_response()
    }
}
