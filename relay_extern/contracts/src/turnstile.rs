use std::{future::Future, net::IpAddr};

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait TurnstileApiService: Send + Sync + 'static {
    /// Redeems a challenge token against the siteverify endpoint.
    fn siteverify(
        &self,
        response: &str,
        remote_ip: Option<IpAddr>,
    ) -> impl Future<Output = anyhow::Result<TurnstileSiteverifyResponse>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TurnstileSiteverifyResponse {
    pub success: bool,
    pub hostname: Option<String>,
    pub action: Option<String>,
    pub error_codes: Vec<String>,
}

#[cfg(feature = "mock")]
impl MockTurnstileApiService {
    pub fn with_siteverify(
        mut self,
        response: String,
        remote_ip: Option<IpAddr>,
        result: anyhow::Result<TurnstileSiteverifyResponse>,
    ) -> Self {
        self.expect_siteverify()
            .once()
            .with(
                mockall::predicate::eq(response),
                mockall::predicate::eq(remote_ip),
            )
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }
}
