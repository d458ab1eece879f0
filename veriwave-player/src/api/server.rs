//! HTTP server setup and routing
//!
//! The HTTP surface is how host views drive the coordination core: play
//! requests and seeks come in as POSTs, progress and active-unit changes go
//! out over the SSE stream.

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use veriwave_common::events::PlayerEvent;
use veriwave_common::{time, PlaybackTuning};

use crate::analysis::types::AnalysisReport;
use crate::audio::AudioTransport;
use crate::error::{Error, Result};
use crate::playback::{PlaybackCoordinator, PlayerSession};

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    /// Current session, replaced wholesale when a new source is loaded
    pub session: Arc<RwLock<Option<Arc<PlayerSession>>>>,
    pub coordinator: Arc<PlaybackCoordinator>,
    pub tuning: PlaybackTuning,
}

impl AppContext {
    pub fn new(tuning: PlaybackTuning) -> Self {
        Self {
            session: Arc::new(RwLock::new(None)),
            coordinator: Arc::new(PlaybackCoordinator::new()),
            tuning,
        }
    }

    /// Current session or a NotFound error for the handlers
    pub async fn require_session(&self) -> Result<Arc<PlayerSession>> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::NotFound("no session loaded".to_string()))
    }
}

/// Load a recording and its analysis report, replacing any current session.
///
/// The report envelope is checked first: an upstream `error` or
/// `analysis_error` fails the load rather than producing a half-usable
/// session. Decoding runs on the blocking pool.
pub async fn load_session(
    ctx: &AppContext,
    media_path: &Path,
    analysis_path: &Path,
) -> Result<Arc<PlayerSession>> {
    let raw = tokio::fs::read_to_string(analysis_path).await.map_err(|e| {
        Error::Report(format!(
            "failed to read analysis report {}: {}",
            analysis_path.display(),
            e
        ))
    })?;
    let report: AnalysisReport = serde_json::from_str(&raw)
        .map_err(|e| Error::Report(format!("failed to parse analysis report: {}", e)))?;

    if let Some(err) = report.error.as_deref().or(report.analysis_error.as_deref()) {
        return Err(Error::Report(err.to_string()));
    }

    let media = media_path.to_path_buf();
    let opened = tokio::task::spawn_blocking(move || AudioTransport::open(&media))
        .await
        .map_err(|e| Error::Internal(format!("decode task failed: {}", e)))??;

    let session = Arc::new(PlayerSession::new(
        media_path,
        opened.transport,
        opened.samples,
        opened.channels,
        &report.analysis_results,
        ctx.coordinator.clone(),
        ctx.tuning.clone(),
    )?);

    let mut guard = ctx.session.write().await;
    if let Some(old) = guard.take() {
        old.shutdown().await;
    }
    *guard = Some(session.clone());

    ctx.coordinator.broadcast(PlayerEvent::SessionLoaded {
        session_id: session.id(),
        media_path: media_path.display().to_string(),
        duration_secs: session.duration_secs(),
        segment_count: session.segments().len(),
        timestamp: time::now(),
    });

    Ok(session)
}

/// Build the application router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Session management
        .route("/session", post(super::handlers::load_session))
        .route("/session", get(super::handlers::get_session))
        .route("/segments", get(super::handlers::get_segments))
        .route("/waveform", get(super::handlers::get_waveform))
        // Playback control
        .route("/units/:key/toggle", post(super::handlers::toggle_unit))
        .route("/units/:key/seek", post(super::handlers::seek_unit))
        .route("/playback/stop", post(super::handlers::stop_playback))
        .route("/playback/position", get(super::handlers::get_position))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local host views
        .layer(CorsLayer::permissive())
}
