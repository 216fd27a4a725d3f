use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::Router;
use relay_core_contact_contracts::ContactFeatureService;
use tokio::net::TcpListener;

mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone)]
pub struct RestServer<Contact> {
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Comma-separated allow-list of browser origins.
    pub allowed_origins: String,
    pub real_ip: Option<Arc<RealIpConfig>>,
}

/// Replace the client ip with a header value, but only when the connection
/// comes from the trusted proxy.
#[derive(Debug, Clone)]
pub struct RealIpConfig {
    pub header: String,
    pub set_from: IpAddr,
}

impl<Contact> RestServer<Contact>
where
    Contact: ContactFeatureService,
{
    pub fn new(contact: Contact, config: RestServerConfig) -> Self {
        Self { contact, config }
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let address = SocketAddr::new(self.config.host, self.config.port);
        let router = self.router();
        let listener = TcpListener::bind(address).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(Into::into)
    }

    pub fn router(self) -> Router<()> {
        let router = Router::new()
            .merge(routes::health::router())
            .merge(routes::contact::router(self.contact.into()));

        // Layer order matters: request id and client ip are attached outside
        // the trace layer so the span can read them.
        let router = middlewares::origin::add(&self.config.allowed_origins)(router);
        let router = middlewares::trace::add(router);
        let router = middlewares::client_ip::add(self.config.real_ip.clone())(router);
        let router = middlewares::request_id::add(router);
        middlewares::panic_handler::add(router)
    }
}
