use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Extension, Json, Router,
};
use relay_core_contact_contracts::{ContactFeatureService, ContactSubmitError, RejectReason};
use relay_models::contact::ContactRequest;
use relay_shared_contracts::rate_limit::RateLimitExceeded;
use tracing::warn;

use super::{error, internal_server_error};
use crate::{
    middlewares::client_ip::ClientIp,
    models::{ApiError, ApiMessage},
};

/// Contact form bodies are small; anything larger is junk.
const BODY_LIMIT: usize = 16 * 1024;

pub fn router(service: Arc<impl ContactFeatureService>) -> Router<()> {
    Router::new()
        .route("/contact", routing::post(submit))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(service)
}

async fn submit(
    service: State<Arc<impl ContactFeatureService>>,
    Extension(client_ip): Extension<ClientIp>,
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("malformed contact request body: {rejection}");
            return error(StatusCode::BAD_REQUEST, "Invalid submission.");
        }
    };

    match service.submit(request, client_ip.0).await {
        Ok(()) => Json(ApiMessage {
            ok: true,
            message: "Message sent.",
        })
        .into_response(),
        Err(ContactSubmitError::Rejected(RejectReason::Honeypot)) => {
            error(StatusCode::BAD_REQUEST, "Invalid submission.")
        }
        Err(ContactSubmitError::Rejected(RejectReason::TooFast)) => error(
            StatusCode::BAD_REQUEST,
            "Please wait a moment and try again.",
        ),
        Err(ContactSubmitError::Rejected(RejectReason::Invalid)) => error(
            StatusCode::BAD_REQUEST,
            "Please review your form entries and try again.",
        ),
        Err(ContactSubmitError::RateLimited(quota)) => rate_limited(quota),
        Err(ContactSubmitError::VerificationFailed) => error(
            StatusCode::FORBIDDEN,
            "Human verification failed. Please try again.",
        ),
        Err(ContactSubmitError::VerificationUnavailable(_)) => error(
            StatusCode::BAD_GATEWAY,
            "Unable to verify your request right now.",
        ),
        Err(ContactSubmitError::Send) => error(
            StatusCode::BAD_GATEWAY,
            "Unable to send message. Please try again soon.",
        ),
        Err(ContactSubmitError::Other(err)) => internal_server_error(err),
    }
}

fn rate_limited(quota: RateLimitExceeded) -> Response {
    let reset = quota.reset.as_secs().max(1).to_string();
    (
        StatusCode::TOO_MANY_REQUESTS,
        [
            ("Retry-After", reset.clone()),
            ("RateLimit-Limit", quota.limit.to_string()),
            ("RateLimit-Remaining", "0".into()),
            ("RateLimit-Reset", reset),
        ],
        Json(ApiError {
            ok: false,
            error: "Too many requests. Please try again later.",
        }),
    )
        .into_response()
}
