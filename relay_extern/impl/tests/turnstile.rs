use std::net::Ipv4Addr;

use relay_extern_contracts::turnstile::{TurnstileApiService, TurnstileSiteverifyResponse};
use relay_extern_impl::{
    http::HttpClient,
    turnstile::{TurnstileApiServiceConfig, TurnstileApiServiceImpl},
};
use relay_testing::turnstile::SITEVERIFY_ROUTE;
use tokio::net::TcpListener;

const SECRET: &str = "test-secret";

#[tokio::test]
async fn success() {
    let sut = make_sut(SECRET).await;
    let result = sut
        .siteverify("success:example.com:contact_form", None)
        .await
        .unwrap();
    assert_eq!(
        result,
        TurnstileSiteverifyResponse {
            success: true,
            hostname: Some("example.com".into()),
            action: Some("contact_form".into()),
            error_codes: vec![],
        }
    );
}

#[tokio::test]
async fn success_with_remote_ip() {
    let sut = make_sut(SECRET).await;
    let result = sut
        .siteverify(
            "success:example.com:contact_form",
            Some(Ipv4Addr::new(203, 0, 113, 7).into()),
        )
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn failure() {
    let sut = make_sut(SECRET).await;
    let result = sut.siteverify("definitely-not-valid", None).await.unwrap();
    assert_eq!(
        result,
        TurnstileSiteverifyResponse {
            success: false,
            hostname: None,
            action: None,
            error_codes: vec!["invalid-input-response".into()],
        }
    );
}

#[tokio::test]
async fn wrong_secret() {
    let sut = make_sut("other-secret").await;
    let result = sut
        .siteverify("success:example.com:contact_form", None)
        .await
        .unwrap();
    assert_eq!(result.error_codes, ["invalid-input-secret"]);
}

async fn make_sut(secret: &str) -> TurnstileApiServiceImpl {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = relay_testing::turnstile::router(SECRET.into());
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

    let endpoint = format!("http://{addr}{SITEVERIFY_ROUTE}").parse().unwrap();
    let config = TurnstileApiServiceConfig::new(secret, Some(endpoint));
    TurnstileApiServiceImpl::new(config, HttpClient::default())
}
