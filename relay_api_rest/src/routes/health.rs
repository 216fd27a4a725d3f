use axum::{routing, Json, Router};
use serde::Serialize;

pub fn router() -> Router<()> {
    Router::new().route("/health", routing::get(health))
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
}

/// Process liveness only; no dependency checks.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
