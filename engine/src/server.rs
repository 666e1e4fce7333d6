//! Axum HTTP server: presentation adapter for a browser frontend.
//!
//! Holds at most one active [`Session`]. Every request locks it, applies one
//! event, and releases it, so events are processed one at a time and run to
//! completion. Response timestamps are read when the request reaches its
//! handler, never at render time.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/session` | Start a new session, discarding any previous one |
//! | GET | `/session` | Present the current trial (records onset) and return the snapshot |
//! | POST | `/response` | Submit `{side}` or `{key}`, optionally guarded by `{trial}` |
//! | POST | `/advance` | Leave a completed block |
//! | GET | `/results` | Outcomes recorded in the current block |
//! | GET | `/results/log` | Every row of the durable result log |
//!
//! A client renders the snapshot from `GET /session`, waits for input, posts
//! it to `/response`, and fetches `/session` again for the next trial.
//!
//! `/response` persists the outcome, which appends to a file and waits on
//! `fsync`, so it runs on tokio's blocking pool. If a handler panics while
//! holding the session, the next request clears the slot and the client has
//! to start a new session.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::Catalog;
use crate::presentation::{KeyBindings, Snapshot};
use crate::recorder::{read_outcomes, SharedRecorder};
use crate::session::{IgnoreReason, Session, SessionEvent, Transition};
use crate::types::{Block, Side, TrialOutcome};

/// Shared server state.
pub struct AppContext {
    catalog: Arc<Catalog>,
    keys: KeyBindings,
    seed: Option<u64>,
    recorder: SharedRecorder,
    results_log: Option<PathBuf>,
    slot: Mutex<SessionSlot>,
}

#[derive(Default)]
struct SessionSlot {
    session: Option<Session>,
    started: u64,
}

impl AppContext {
    pub fn new(
        catalog: Catalog,
        keys: KeyBindings,
        seed: Option<u64>,
        recorder: SharedRecorder,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            keys,
            seed,
            recorder,
            results_log: None,
            slot: Mutex::new(SessionSlot::default()),
        }
    }

    /// Serve the CSV log at `path` from `GET /results/log`.
    pub fn with_results_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_log = Some(path.into());
        self
    }
}

pub type AppState = Arc<AppContext>;

pub fn create_router(ctx: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/session", get(handle_present).post(handle_start_session))
        .route("/response", post(handle_response))
        .route("/advance", post(handle_advance))
        .route("/results", get(handle_results))
        .route("/results/log", get(handle_results_log))
        .layer(cors)
        .with_state(ctx)
}

// ── Request/Response types ──────────────────────────────────────────

#[derive(Deserialize, Default)]
struct StartRequest {
    start_block: Option<i64>,
}

#[derive(Deserialize)]
struct ResponseRequest {
    side: Option<String>,
    key: Option<String>,
    trial: Option<usize>,
}

#[derive(Serialize)]
struct EventResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<TrialOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block: Option<Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<IgnoreReason>,
}

impl From<Transition> for EventResponse {
    fn from(t: Transition) -> Self {
        let empty = |status| EventResponse {
            status,
            outcome: None,
            block: None,
            reason: None,
        };
        match t {
            Transition::Recorded(outcome) => EventResponse {
                outcome: Some(outcome),
                ..empty("recorded")
            },
            Transition::EnteredBlock(block) => EventResponse {
                block: Some(block),
                ..empty("entered_block")
            },
            Transition::Completed => empty("completed"),
            Transition::Ignored(reason) => EventResponse {
                reason: Some(reason),
                ..empty("ignored")
            },
        }
    }
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, msg: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg })))
}

/// Lock the session slot. A poisoned lock means an event panicked halfway, so
/// the session it guarded is dropped.
fn lock_slot(ctx: &AppContext) -> MutexGuard<'_, SessionSlot> {
    match ctx.slot.lock() {
        Ok(slot) => slot,
        Err(poisoned) => {
            tracing::error!("session lock poisoned, discarding active session");
            let mut slot = poisoned.into_inner();
            slot.session = None;
            ctx.slot.clear_poison();
            slot
        }
    }
}

fn task_failed(e: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %e, "request task failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "request failed")
}

fn no_session() -> ApiError {
    error_response(StatusCode::NOT_FOUND, "No active session. POST /session first.")
}

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_present(State(ctx): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let now = Instant::now();
    let mut slot = lock_slot(&ctx);
    let session = slot.session.as_mut().ok_or_else(no_session)?;
    session.present(now);
    Ok(Json(Snapshot::capture(session, &ctx.keys)))
}

async fn handle_results(State(ctx): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let slot = lock_slot(&ctx);
    let session = slot.session.as_ref().ok_or_else(no_session)?;
    Ok(Json(serde_json::json!({
        "block": session.block(),
        "results": session.results(),
        "persistence_failures": session.persistence_failures(),
    })))
}

async fn handle_results_log(State(ctx): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let Some(path) = ctx.results_log.clone() else {
        return Err(error_response(StatusCode::NOT_FOUND, "No result log configured"));
    };
    let rows = tokio::task::spawn_blocking(move || read_outcomes(&path))
        .await
        .map_err(task_failed)?
        .map_err(|e| {
            tracing::error!(error = %e, "cannot read result log");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Cannot read result log")
        })?;
    Ok(Json(serde_json::json!({ "results": rows })))
}

// ── POST handlers ───────────────────────────────────────────────────

async fn handle_start_session(
    State(ctx): State<AppState>,
    body: Bytes,
) -> Result<Json<Snapshot>, ApiError> {
    let req: StartRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid session request"))?
    };

    let mut slot = lock_slot(&ctx);
    let seed = ctx.seed.map(|s| s.wrapping_add(slot.started));
    let mut builder =
        Session::builder(ctx.catalog.clone(), Box::new(ctx.recorder.clone())).seed(seed);
    if let Some(block) = req.start_block {
        builder = builder.start_block(block);
    }
    let session = builder
        .build()
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()))?;

    if slot.session.is_some() {
        tracing::info!("discarding previous session");
    }
    slot.started += 1;
    tracing::info!(session = slot.started, block = %session.block(), "session started");
    let snapshot = Snapshot::capture(&session, &ctx.keys);
    slot.session = Some(session);
    Ok(Json(snapshot))
}

async fn handle_response(
    State(ctx): State<AppState>,
    Json(req): Json<ResponseRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let at = Instant::now();
    let side: Option<Side> = match (&req.side, &req.key) {
        (Some(side), _) => Side::parse(side),
        (None, Some(key)) => ctx.keys.side_for(key),
        (None, None) => None,
    };

    let event = match (side, req.trial) {
        (None, _) => None,
        (Some(side), Some(trial)) => Some(SessionEvent::ResponseFor { trial, side }),
        (Some(side), None) => Some(SessionEvent::Response(side)),
    };

    let transition = tokio::task::spawn_blocking(move || {
        let mut slot = lock_slot(&ctx);
        let session = slot.session.as_mut().ok_or_else(no_session)?;
        Ok::<_, ApiError>(match event {
            Some(event) => session.handle(event, at),
            None => Transition::Ignored(IgnoreReason::UnrecognizedInput),
        })
    })
    .await
    .map_err(task_failed)??;

    if let Transition::Ignored(reason) = &transition {
        tracing::debug!(?reason, "response ignored");
    }
    Ok(Json(transition.into()))
}

async fn handle_advance(State(ctx): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let mut slot = lock_slot(&ctx);
    let session = slot.session.as_mut().ok_or_else(no_session)?;
    let transition = session.handle(SessionEvent::Advance, Instant::now());
    let snapshot = Snapshot::capture(session, &ctx.keys);
    Ok(Json(serde_json::json!({
        "event": EventResponse::from(transition),
        "snapshot": snapshot,
    })))
}
