use std::sync::Arc;

use relay_api_rest::{RealIpConfig, RestServer, RestServerConfig};
use relay_config::Config;
use relay_core_contact_impl::{ContactFeatureConfig, ContactFeatureServiceImpl};
use relay_email_contracts::EmailService;
use relay_extern_impl::{
    http::HttpClient,
    turnstile::{TurnstileApiServiceConfig, TurnstileApiServiceImpl},
};
use relay_shared_impl::{
    captcha::{CaptchaServiceConfig, CaptchaServiceImpl},
    rate_limit::{RateLimitServiceConfig, RateLimitServiceImpl},
    time::TimeServiceImpl,
};
use tracing::info;

use crate::email;

pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Connecting to smtp server");
    let email = email::connect(&config.email)?;
    email.ping().await?;

    let time = TimeServiceImpl;

    let rate_limit = RateLimitServiceImpl::new(
        time,
        RateLimitServiceConfig {
            window: config.rate_limit.window.into(),
            max: config.rate_limit.max,
        },
    );

    let turnstile_api = TurnstileApiServiceImpl::new(
        TurnstileApiServiceConfig::new(
            config.turnstile.secret.as_str(),
            config.turnstile.siteverify_endpoint_override.clone(),
        ),
        HttpClient::default(),
    );
    let captcha = CaptchaServiceImpl::new(
        turnstile_api,
        CaptchaServiceConfig::new(
            &config.turnstile.allowed_hostnames,
            config.turnstile.expected_action.clone(),
        ),
    );

    let contact = ContactFeatureServiceImpl::new(
        time,
        rate_limit,
        captcha,
        email,
        ContactFeatureConfig {
            recipient: Arc::new(config.email.to.clone()),
            subject_prefix: config.email.subject_prefix.as_str().into(),
            honeypot_field: config.contact.honeypot_field.as_str().into(),
            min_dwell: config.contact.min_dwell.into(),
        },
    );

    info!(
        "Starting http server on {}:{}",
        config.http.host, config.http.port
    );
    RestServer::new(
        contact,
        RestServerConfig {
            host: config.http.host,
            port: config.http.port,
            allowed_origins: config.http.allowed_origins.clone(),
            real_ip: config.http.real_ip.as_ref().map(|real_ip| {
                Arc::new(RealIpConfig {
                    header: real_ip.header.clone(),
                    set_from: real_ip.set_from,
                })
            }),
        },
    )
    .serve()
    .await
}
