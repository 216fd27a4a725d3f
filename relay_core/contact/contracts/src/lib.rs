use std::{future::Future, net::IpAddr};

use relay_models::contact::ContactRequest;
use relay_shared_contracts::rate_limit::RateLimitExceeded;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Runs the submission pipeline, terminal at the first failing check, and
    /// relays the message to the configured mailbox.
    fn submit(
        &self,
        request: ContactRequest,
        client_ip: IpAddr,
    ) -> impl Future<Output = Result<(), ContactSubmitError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactSubmitError {
    #[error("Submission rejected ({0}).")]
    Rejected(RejectReason),
    #[error(transparent)]
    RateLimited(#[from] RateLimitExceeded),
    #[error("Human verification failed.")]
    VerificationFailed,
    #[error("Human verification is currently unavailable.")]
    VerificationUnavailable(#[source] anyhow::Error),
    #[error("Failed to send message.")]
    Send,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a submission was rejected before any external call was made. Logged
/// server-side only; clients get a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Honeypot,
    TooFast,
    Invalid,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Honeypot => "honeypot field filled",
            Self::TooFast => "submitted before minimum dwell time",
            Self::Invalid => "payload failed validation",
        })
    }
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_submit(
        mut self,
        request: ContactRequest,
        client_ip: IpAddr,
        result: Result<(), ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(
                mockall::predicate::eq(request),
                mockall::predicate::eq(client_ip),
            )
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }
}
