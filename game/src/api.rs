//! HTTP front for one traversal session, for browser renderers.
//!
//! Accepted moves schedule their own lock-window timeout on the tokio runtime;
//! an explicit `POST /api/session/lock/complete` (animation finished) or a
//! restart aborts the pending timer, and the ticket check covers any timer that
//! was already past its sleep when the abort landed.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use engine::{Dimensions, Error, IllegalMoveReason, NodeId};
use serde::Deserialize;
use tokio::task::AbortHandle;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::controller::{SessionSnapshot, TraversalController};
use crate::host::{SessionCommand, SessionHost, SessionResponse};
use crate::leaderboard::{DEFAULT_LIMIT, Leaderboard, ScoreEntry};
use crate::lock_window::LockTicket;

#[derive(Debug)]
struct ApiSession {
    host: SessionHost,
    leaderboard: Leaderboard,
    pending_unlock: Option<(LockTicket, AbortHandle)>,
}

impl ApiSession {
    fn cancel_pending_unlock(&mut self) {
        if let Some((_, handle)) = self.pending_unlock.take() {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    session: Arc<Mutex<ApiSession>>,
}

impl AppState {
    pub fn new(controller: TraversalController) -> Self {
        Self {
            session: Arc::new(Mutex::new(ApiSession {
                host: SessionHost::new(controller),
                leaderboard: Leaderboard::new(),
                pending_unlock: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ApiSession> {
        self.session
            .lock()
            .expect("session api lock should be available")
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/session", get(session_snapshot))
        .route("/api/session/start", post(session_start))
        .route("/api/session/move", post(session_move))
        .route("/api/session/lock/complete", post(session_complete_lock))
        .route("/api/session/restart", post(session_restart))
        .route("/api/leaderboard", get(leaderboard_top).post(leaderboard_submit))
        .with_state(state)
        .layer(cors)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub width: i64,
    pub depth: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub node: NodeId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub width: u32,
    pub depth: u32,
    pub limit: Option<usize>,
}

#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidConfiguration { .. } => StatusCode::BAD_REQUEST,
            Error::UnknownNode { .. } => StatusCode::NOT_FOUND,
            Error::IllegalMove { .. } | Error::AlreadyInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn session_snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let snapshot = state.lock().host.controller().snapshot();
    Json(snapshot)
}

async fn session_start(
    State(state): State<AppState>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let response = state.lock().host.handle(SessionCommand::Start {
        width: payload.width,
        depth: payload.depth,
    })?;
    Ok(Json(response))
}

async fn session_move(
    State(state): State<AppState>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    // The timer is registered under the same guard that applied the move.
    let mut session = state.lock();
    let response = session
        .host
        .handle(SessionCommand::Move { node: payload.node })?;

    if let SessionResponse::Moved { event, .. } = &response {
        let window = session.host.controller().lock_window();
        let task = spawn_unlock(&state, event.ticket, window);
        session.cancel_pending_unlock();
        session.pending_unlock = Some((event.ticket, task));
    }
    Ok(Json(response))
}

/// Sleeps out the lock window, then closes it if `ticket` is still in flight.
/// Only takes the session lock after the sleep.
fn spawn_unlock(state: &AppState, ticket: LockTicket, window: Duration) -> AbortHandle {
    let timer_state = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(window).await;
        let mut session = timer_state.lock();
        if matches!(session.pending_unlock, Some((pending, _)) if pending == ticket) {
            session.pending_unlock = None;
        }
        match session
            .host
            .handle(SessionCommand::CompleteLockFor { ticket })
        {
            Ok(SessionResponse::Released { release, .. }) => debug!(
                session = ticket.session,
                move_number = ticket.move_number,
                ?release,
                "lock window timed out"
            ),
            Ok(_) => {}
            Err(err) => warn!(%err, "lock window timeout failed"),
        }
    })
    .abort_handle()
}

async fn session_complete_lock(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut session = state.lock();
    session.cancel_pending_unlock();
    let response = session.host.handle(SessionCommand::CompleteLock)?;
    Ok(Json(response))
}

async fn session_restart(State(state): State<AppState>) -> Result<Json<SessionResponse>, ApiError> {
    let mut session = state.lock();
    session.cancel_pending_unlock();
    let response = session.host.handle(SessionCommand::Restart)?;
    Ok(Json(response))
}

async fn leaderboard_top(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<ScoreEntry>>, ApiError> {
    let dims = Dimensions::new(query.width, query.depth)?;
    let session = state.lock();
    let entries = session
        .leaderboard
        .top(dims, query.limit.unwrap_or(DEFAULT_LIMIT))
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(entries))
}

async fn leaderboard_submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<(StatusCode, Json<ScoreEntry>), ApiError> {
    let mut session = state.lock();
    let controller = session.host.controller();
    let Some(report) = controller.report() else {
        return Err(Error::illegal_move(IllegalMoveReason::NoActiveGame).into());
    };
    let fingerprint = controller.state().map(|tree| tree.fingerprint());

    let entry = session
        .leaderboard
        .submit(&report, &payload.username, fingerprint)?
        .clone();
    Ok((StatusCode::CREATED, Json(entry)))
}
