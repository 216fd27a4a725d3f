use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, Next},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::routes::error;

/// Rejects browser requests from origins outside the allow-list and attaches
/// CORS headers for the allowed ones. Requests without an `Origin` header
/// (curl, server-to-server) pass through.
pub fn add<S: Clone + Send + Sync + 'static>(
    allowed_origins: &str,
) -> impl FnOnce(Router<S>) -> Router<S> + '_ {
    move |router| {
        let allowed = parse_allow_list(allowed_origins);

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(AllowOrigin::predicate({
                let allowed = Arc::clone(&allowed);
                move |origin, _| header_allowed(origin, &allowed)
            }));

        router
            .layer(from_fn(move |request: Request, next: Next| {
                let allowed = Arc::clone(&allowed);
                async move {
                    if let Some(origin) = request.headers().get(header::ORIGIN) {
                        if !header_allowed(origin, &allowed) {
                            warn!(?origin, "request from origin outside the allow-list");
                            return error(StatusCode::FORBIDDEN, "Origin not allowed.");
                        }
                    }
                    next.run(request).await
                }
            }))
            .layer(cors)
    }
}

fn header_allowed(origin: &HeaderValue, allowed: &[String]) -> bool {
    origin
        .to_str()
        .is_ok_and(|origin| allowed.contains(&normalize_origin(origin)))
}

pub fn parse_allow_list(allowed_origins: &str) -> Arc<[String]> {
    let mut allowed = Vec::new();
    for origin in allowed_origins.split(',').map(normalize_origin) {
        if !origin.is_empty() && !allowed.contains(&origin) {
            allowed.push(origin);
        }
    }
    allowed.into()
}

/// Some clients emit explicit default ports or trailing slashes; parsing as a
/// URL collapses them to a canonical origin.
fn normalize_origin(value: &str) -> String {
    let cleaned = value
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim_end_matches('/');

    match url::Url::parse(cleaned) {
        Ok(url) => url.origin().ascii_serialization().to_lowercase(),
        Err(_) => cleaned.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        for (input, expected) in [
            ("https://JodyHolt.com", "https://jodyholt.com"),
            ("https://jodyholt.com/", "https://jodyholt.com"),
            ("  'https://jodyholt.com'  ", "https://jodyholt.com"),
            ("https://jodyholt.com:443", "https://jodyholt.com"),
            ("http://localhost:5173", "http://localhost:5173"),
            ("not a url", "not a url"),
        ] {
            assert_eq!(normalize_origin(input), expected, "input: {input}");
        }
    }

    #[test]
    fn allow_list_dedupes_and_drops_empty_entries() {
        let allowed = parse_allow_list("https://a.com, https://a.com/, ,https://b.com");
        assert_eq!(&*allowed, ["https://a.com", "https://b.com"]);
    }

    #[test]
    fn header_matching() {
        let allowed = parse_allow_list("https://jodyholt.com,https://www.jodyholt.com");
        let ok = HeaderValue::from_static("https://jodyholt.com");
        let nope = HeaderValue::from_static("https://evil.example");
        assert!(header_allowed(&ok, &allowed));
        assert!(!header_allowed(&nope, &allowed));
    }
}
