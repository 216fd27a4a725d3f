//! Resolve the address the rate limiter and captcha checks key on.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::{from_fn, Next},
    Router,
};
use tracing::{debug, error, warn};

use crate::RealIpConfig;

pub fn add<S: Clone + Send + Sync + 'static>(
    real_ip_config: Option<Arc<RealIpConfig>>,
) -> impl FnOnce(Router<S>) -> Router<S> {
    |router| {
        router.layer(from_fn(move |mut request: Request, next: Next| {
            let client_ip = resolve(&request, real_ip_config.as_deref());
            request.extensions_mut().insert(client_ip);
            next.run(request)
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientIp(pub IpAddr);

/// Defaults to the TCP peer address. When a real-ip header is configured, it
/// is honored only on connections from the trusted proxy; a submission cannot
/// dodge the rate limiter by spoofing the header directly.
fn resolve(request: &Request, real_ip_config: Option<&RealIpConfig>) -> ClientIp {
    let peer_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .unwrap()
        .ip();

    let Some(RealIpConfig { header, set_from }) = real_ip_config else {
        return ClientIp(peer_ip);
    };

    let header_value = request.headers().get(header);

    if *set_from != peer_ip {
        if header_value.is_some() {
            debug!(%peer_ip, "ignoring real ip header on a connection not from the trusted proxy");
        }
        return ClientIp(peer_ip);
    }

    let Some(header_value) = header_value else {
        warn!(%peer_ip, "trusted proxy sent no real ip header");
        return ClientIp(peer_ip);
    };

    match header_value.to_str().ok().and_then(|ip| ip.parse().ok()) {
        Some(real_ip) => ClientIp(real_ip),
        None => {
            error!(%peer_ip, ?header_value, "real ip header value is not an address");
            ClientIp(peer_ip)
        }
    }
}
