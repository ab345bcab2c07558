//! Axum handlers for `/api/*` routes.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, Request, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{API_PATHS, ApiState};
use crate::store::VerifyOutcome;

const COMPUTE_DEFAULT_N: u64 = 1_000;
const COMPUTE_MAX_N: u64 = 1_000_000;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct ComputeParams {
    n: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

fn invalid_request() -> Response {
    json_error(StatusCode::BAD_REQUEST, "Invalid request")
}

fn verify_response(outcome: VerifyOutcome) -> Response {
    match outcome {
        VerifyOutcome::Match => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        VerifyOutcome::Mismatch => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Invalid credentials" })),
        )
            .into_response(),
        VerifyOutcome::MalformedRequest => invalid_request(),
        VerifyOutcome::MethodNotAllowed => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "POST")],
            Json(json!({ "error": "Method not allowed" })),
        )
            .into_response(),
        VerifyOutcome::ServerError => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not read credentials.json")
        }
    }
}

fn sum_of_squares(n: u64) -> u64 {
    (0..n).map(|i| i * i).sum()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api
pub(super) async fn root() -> Response {
    Json(json!({ "message": "Demo API root", "endpoints": API_PATHS })).into_response()
}

/// GET /api/hello
pub(super) async fn hello() -> Response {
    Json(json!({ "message": "Hello from the API!" })).into_response()
}

/// GET /api/data
pub(super) async fn data() -> Response {
    Json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "values": [1, 2, 3, 4, 5],
    }))
    .into_response()
}

/// GET /api/compute?n=N: `n` defaults to 1000 and is capped at 1 000 000.
pub(super) async fn compute(Query(params): Query<ComputeParams>) -> Response {
    let n = match params.n.as_deref().map(str::parse::<u64>) {
        None => COMPUTE_DEFAULT_N,
        Some(Ok(n)) => n.min(COMPUTE_MAX_N),
        Some(Err(e)) => {
            debug!("compute rejected n: {e}");
            return invalid_request();
        }
    };
    Json(json!({ "n": n, "result": sum_of_squares(n) })).into_response()
}

/// GET /api/items
pub(super) async fn items(State(state): State<ApiState>) -> Response {
    let store = state.items.clone();
    match tokio::task::spawn_blocking(move || store.fetch_items()).await {
        Ok(Ok(items)) => Json(json!({ "items": items })).into_response(),
        Ok(Err(e)) => {
            warn!("items request failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not read items.json")
        }
        Err(e) => {
            warn!("items task failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Could not read items.json")
        }
    }
}

/// ANY /api/login: the body is buffered in full (bounded) before parsing,
/// and only for POST.
pub(super) async fn login(State(state): State<ApiState>, request: Request) -> Response {
    let method = request.method().clone();

    let body = if method == Method::POST {
        match axum::body::to_bytes(request.into_body(), state.max_body_bytes).await {
            Ok(body) => body,
            Err(e) => {
                warn!("login body read failed: {e}");
                return invalid_request();
            }
        }
    } else {
        Bytes::new()
    };

    // The record is read from disk, off the async workers.
    let verifier = state.verifier.clone();
    let verify_method = method.clone();
    let task = tokio::task::spawn_blocking(move || verifier.verify(verify_method.as_str(), &body));
    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("login task failed: {e}");
            VerifyOutcome::ServerError
        }
    };
    debug!(%method, ?outcome, "login verified");
    verify_response(outcome)
}

/// Anything not routed.
pub(super) async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not found")
}
