//! HTTP request handlers
//!
//! REST endpoints for session loading and playback control.

use std::path::PathBuf;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;
use veriwave_common::events::ProgressInfo;

use crate::analysis::types::AnalysisSegment;
use crate::api::server::AppContext;
use crate::error::Error;
use crate::playback::session::SessionStatus;
use crate::playback::waveform::{WaveformView, DEFAULT_PEAK_BUCKETS};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct LoadSessionRequest {
    /// Path to the recording on disk
    pub media_path: PathBuf,
    /// Path to the analysis report JSON produced by the upstream analyzer
    pub analysis_path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct LoadSessionResponse {
    pub session_id: Uuid,
    pub duration_secs: f64,
    pub segment_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SegmentsResponse {
    pub segments: Vec<AnalysisSegment>,
}

#[derive(Debug, Deserialize)]
pub struct WaveformQuery {
    pub buckets: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// Active unit after the request (None = toggled off)
    pub active_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct SeekResponse {
    /// Position actually applied after window clamping
    pub position_secs: f64,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    pub active_key: Option<String>,
    pub progress: Option<ProgressInfo>,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn error_response(err: Error) -> ApiError {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::Report(_) | Error::UnknownDuration(_) | Error::Decode(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("request failed: {}", err);
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "veriwave_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Session Endpoints
// ============================================================================

/// POST /session - Load a recording plus its analysis report
pub async fn load_session(
    State(ctx): State<AppContext>,
    Json(request): Json<LoadSessionRequest>,
) -> Result<Json<LoadSessionResponse>, ApiError> {
    let session = super::server::load_session(&ctx, &request.media_path, &request.analysis_path)
        .await
        .map_err(error_response)?;

    Ok(Json(LoadSessionResponse {
        session_id: session.id(),
        duration_secs: session.duration_secs(),
        segment_count: session.segments().len(),
    }))
}

/// GET /session - Current session status snapshot
pub async fn get_session(
    State(ctx): State<AppContext>,
) -> Result<Json<SessionStatus>, ApiError> {
    let session = ctx.require_session().await.map_err(error_response)?;
    Ok(Json(session.status().await))
}

/// GET /segments - Resolved analysis segments
pub async fn get_segments(
    State(ctx): State<AppContext>,
) -> Result<Json<SegmentsResponse>, ApiError> {
    let session = ctx.require_session().await.map_err(error_response)?;
    Ok(Json(SegmentsResponse {
        segments: session.segments().to_vec(),
    }))
}

/// GET /waveform - Peaks, overlay regions and grid lines
pub async fn get_waveform(
    State(ctx): State<AppContext>,
    Query(query): Query<WaveformQuery>,
) -> Result<Json<WaveformView>, ApiError> {
    let session = ctx.require_session().await.map_err(error_response)?;
    let buckets = query.buckets.unwrap_or(DEFAULT_PEAK_BUCKETS);
    Ok(Json(session.waveform_view(buckets)))
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// POST /units/:key/toggle - Play request for one unit (toggle semantics)
pub async fn toggle_unit(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let session = ctx.require_session().await.map_err(error_response)?;
    session
        .handle_play_request(&key)
        .await
        .map_err(error_response)?;

    Ok(Json(ToggleResponse {
        active_key: ctx.coordinator.active_key().await,
    }))
}

/// POST /units/:key/seek - Seek a unit, clamped into its window
pub async fn seek_unit(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
    Json(request): Json<SeekRequest>,
) -> Result<Json<SeekResponse>, ApiError> {
    if !request.position_secs.is_finite() {
        return Err(error_response(Error::BadRequest(
            "position_secs must be finite".to_string(),
        )));
    }

    let session = ctx.require_session().await.map_err(error_response)?;
    let position_secs = session
        .seek(&key, request.position_secs)
        .await
        .map_err(error_response)?;

    Ok(Json(SeekResponse { position_secs }))
}

/// POST /playback/stop - Stop whatever is playing
pub async fn stop_playback(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = ctx.require_session().await.map_err(error_response)?;
    session.stop().await;
    Ok(Json(StatusResponse {
        status: "stopped".to_string(),
    }))
}

/// GET /playback/position - Last progress sample from the active unit
pub async fn get_position(State(ctx): State<AppContext>) -> Json<PositionResponse> {
    Json(PositionResponse {
        active_key: ctx.coordinator.active_key().await,
        progress: ctx.coordinator.last_progress().await,
    })
}
