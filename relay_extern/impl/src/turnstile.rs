use std::{net::IpAddr, sync::Arc};

use relay_extern_contracts::turnstile::{TurnstileApiService, TurnstileSiteverifyResponse};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::HttpClient;

const SITEVERIFY_ENDPOINT: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Debug, Clone)]
pub struct TurnstileApiServiceImpl {
    config: TurnstileApiServiceConfig,
    client: HttpClient,
}

impl TurnstileApiServiceImpl {
    pub fn new(config: TurnstileApiServiceConfig, client: HttpClient) -> Self {
        Self { config, client }
    }
}

#[derive(Debug, Clone)]
pub struct TurnstileApiServiceConfig {
    siteverify_endpoint: Arc<Url>,
    secret: Arc<str>,
}

impl TurnstileApiServiceConfig {
    pub fn new(secret: impl Into<Arc<str>>, siteverify_endpoint_override: Option<Url>) -> Self {
        Self {
            siteverify_endpoint: siteverify_endpoint_override
                .unwrap_or_else(|| SITEVERIFY_ENDPOINT.parse().unwrap())
                .into(),
            secret: secret.into(),
        }
    }
}

impl TurnstileApiService for TurnstileApiServiceImpl {
    async fn siteverify(
        &self,
        response: &str,
        remote_ip: Option<IpAddr>,
    ) -> anyhow::Result<TurnstileSiteverifyResponse> {
        self.client
            .post((*self.config.siteverify_endpoint).clone())
            .form(&SiteverifyRequest {
                secret: &self.config.secret,
                response,
                remoteip: remote_ip,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<SiteverifyResponse>()
            .await
            .map(Into::into)
            .map_err(Into::into)
    }
}

#[derive(Serialize)]
struct SiteverifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<IpAddr>,
}

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
    hostname: Option<String>,
    action: Option<String>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl From<SiteverifyResponse> for TurnstileSiteverifyResponse {
    fn from(value: SiteverifyResponse) -> Self {
        Self {
            success: value.success,
            hostname: value.hostname,
            action: value.action,
            error_codes: value.error_codes,
        }
    }
}
