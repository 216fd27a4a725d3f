use std::{future::Future, net::IpAddr};

use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait CaptchaService: Send + Sync + 'static {
    /// Checks that the token asserts a real human interaction on one of the
    /// expected hostnames for the expected action.
    fn check(
        &self,
        response: &str,
        remote_ip: Option<IpAddr>,
    ) -> impl Future<Output = Result<(), CaptchaCheckError>> + Send;
}

#[derive(Debug, Error)]
pub enum CaptchaCheckError {
    #[error("The response is invalid or the user is probably not human.")]
    Failed,
    #[error("The verification service could not be reached.")]
    Unavailable(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockCaptchaService {
    pub fn with_check(
        mut self,
        response: &'static str,
        remote_ip: Option<IpAddr>,
        result: Result<(), CaptchaCheckError>,
    ) -> Self {
        self.expect_check()
            .once()
            .withf(move |x, ip| *x == *response && *ip == remote_ip)
            .return_once(|_, _| Box::pin(std::future::ready(result)));
        self
    }
}
