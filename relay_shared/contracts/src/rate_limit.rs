use std::{net::IpAddr, time::Duration};

use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RateLimitService: Send + Sync + 'static {
    /// Records an attempt for `key` and fails if the quota for the current
    /// window is already exhausted.
    fn check(&self, key: IpAddr) -> Result<(), RateLimitExceeded>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Rate limit of {limit} requests per window exceeded.")]
pub struct RateLimitExceeded {
    pub limit: u64,
    /// Time until the current window rolls over.
    pub reset: Duration,
}

#[cfg(feature = "mock")]
impl MockRateLimitService {
    pub fn with_check(mut self, key: IpAddr, result: Result<(), RateLimitExceeded>) -> Self {
        self.expect_check()
            .once()
            .with(mockall::predicate::eq(key))
            .return_once(move |_| result);
        self
    }
}
