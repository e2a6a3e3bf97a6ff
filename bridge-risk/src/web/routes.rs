//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::domain::NodeId;
use crate::metrics::MetricsSnapshot;
use crate::planner::PlannerError;
use crate::scoring::{AnalysisError, JourneyRequest};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/paths", post(enumerate_paths))
        .route("/journey/analyze", post(analyze_journey))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Pipeline counters and stage timings.
async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics().snapshot())
}

/// Parse a JSON body, logging it on failure.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "Invalid JSON body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Enumerate candidate paths without scoring them.
async fn enumerate_paths(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PathsResponse>, AppError> {
    let req: PathsRequest = parse_body(&body)?;

    let result = state.analyzer.enumerate(
        &state.graph,
        &NodeId::new(req.source),
        &NodeId::new(req.destination),
    )?;

    Ok(Json(PathsResponse::from_result(&result)))
}

/// Score every candidate path between two nodes.
async fn analyze_journey(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AnalyzeJourneyResponse>, AppError> {
    let req: AnalyzeJourneyRequest = parse_body(&body)?;

    let departure = req.departure.unwrap_or_else(|| Local::now().naive_local());
    let mut request = JourneyRequest::new(
        NodeId::new(req.source),
        NodeId::new(req.destination),
        departure,
    );
    if let Some(now) = req.now {
        request = request.with_now(now);
    }

    let analysis = state
        .analyzer
        .analyze_with_timeout(&state.graph, &request, state.request_timeout)
        .await?;

    Ok(Json(AnalyzeJourneyResponse::from_analysis(&analysis)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
}

impl From<PlannerError> for AppError {
    fn from(e: PlannerError) -> Self {
        match e {
            PlannerError::UnknownNode(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Planner(e) => e.into(),
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "Request failed");
        } else {
            warn!(%status, %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
