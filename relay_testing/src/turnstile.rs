use std::{net::IpAddr, sync::Arc};

use anyhow::Context;
use axum::{extract::State, routing, Form, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

pub const SITEVERIFY_ROUTE: &str = "/turnstile/v0/siteverify";

pub async fn start_server(host: IpAddr, port: u16, secret: String) -> anyhow::Result<()> {
    info!("Starting turnstile testing server on {host}:{port}");
    info!("Turnstile siteverify endpoint: http://{host}:{port}{SITEVERIFY_ROUTE}");
    info!("Secret: {secret:?}");
    info!(
        "Valid turnstile responses are \"success:HOSTNAME:ACTION\"; anything else fails \
         verification"
    );

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(secret))
        .await
        .context("Failed to start HTTP server")
}

pub fn router(secret: String) -> Router<()> {
    Router::new()
        .route(SITEVERIFY_ROUTE, routing::post(siteverify))
        .with_state(secret.into())
}

#[derive(Deserialize)]
struct SiteverifyRequest {
    secret: String,
    response: String,
}

#[derive(Serialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(rename = "error-codes", skip_serializing_if = "Vec::is_empty")]
    error_codes: Vec<String>,
}

async fn siteverify(
    state: State<Arc<str>>,
    Form(SiteverifyRequest { secret, response }): Form<SiteverifyRequest>,
) -> Json<SiteverifyResponse> {
    if *secret != **state {
        return Json(failure("invalid-input-secret"));
    }

    let mut parts = response.split(':');
    if parts.next() != Some("success") {
        return Json(failure("invalid-input-response"));
    }

    Json(SiteverifyResponse {
        success: true,
        hostname: parts.next().map(Into::into),
        action: parts.next().map(Into::into),
        error_codes: Vec::new(),
    })
}

fn failure(code: &str) -> SiteverifyResponse {
    SiteverifyResponse {
        success: false,
        hostname: None,
        action: None,
        error_codes: vec![code.into()],
    }
}
