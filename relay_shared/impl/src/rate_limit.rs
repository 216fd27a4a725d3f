use std::{
    collections::HashMap,
    net::IpAddr,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};
use relay_shared_contracts::{
    rate_limit::{RateLimitExceeded, RateLimitService},
    time::TimeService,
};

/// Expired windows are swept once the table grows past this.
const PRUNE_THRESHOLD: usize = 1024;

/// In-memory fixed-window counter per client address. Sufficient for a single
/// instance; a multi-instance deployment would need a shared counter store
/// behind the same contract.
pub struct RateLimitServiceImpl<Time> {
    time: Time,
    config: RateLimitServiceConfig,
    window: TimeDelta,
    state: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitServiceConfig {
    pub window: std::time::Duration,
    pub max: u64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<Utc>,
    count: u64,
}

impl<Time> RateLimitServiceImpl<Time> {
    pub fn new(time: Time, config: RateLimitServiceConfig) -> Self {
        let window = TimeDelta::from_std(config.window).unwrap_or(TimeDelta::MAX);
        Self {
            time,
            config,
            window,
            state: Default::default(),
        }
    }
}

impl<Time> RateLimitService for RateLimitServiceImpl<Time>
where
    Time: TimeService,
{
    fn check(&self, key: IpAddr) -> Result<(), RateLimitExceeded> {
        let now = self.time.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.len() > PRUNE_THRESHOLD {
            state.retain(|_, window| now - window.start < self.window);
        }

        let window = state.entry(key).or_insert(Window { start: now, count: 0 });
        if now - window.start >= self.window {
            *window = Window {
                start: now,
                count: 0,
            };
        }
        window.count += 1;

        if window.count > self.config.max {
            let reset = (window.start + self.window - now).to_std().unwrap_or_default();
            return Err(RateLimitExceeded {
                limit: self.config.max,
                reset,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use chrono::TimeZone;
    use relay_shared_contracts::time::MockTimeService;
    use relay_utils::assert_matches;

    use super::*;

    const CONFIG: RateLimitServiceConfig = RateLimitServiceConfig {
        window: std::time::Duration::from_secs(600),
        max: 3,
    };

    fn ip(last: u8) -> IpAddr {
        Ipv4Addr::new(203, 0, 113, last).into()
    }

    fn timestamp(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + offset_secs, 0).unwrap()
    }

    #[test]
    fn allows_up_to_max_within_window() {
        // Arrange
        let time = MockTimeService::new().with_now(timestamp(0));
        let sut = RateLimitServiceImpl::new(time, CONFIG);

        // Act + Assert
        for _ in 0..3 {
            sut.check(ip(1)).unwrap();
        }
        assert_matches!(sut.check(ip(1)), Err(RateLimitExceeded { limit: 3, .. }));
    }

    #[test]
    fn keys_are_independent() {
        // Arrange
        let time = MockTimeService::new().with_now(timestamp(0));
        let sut = RateLimitServiceImpl::new(time, CONFIG);

        // Act
        for _ in 0..3 {
            sut.check(ip(1)).unwrap();
        }

        // Assert
        sut.check(ip(2)).unwrap();
    }

    #[test]
    fn exceeded_reports_time_until_rollover() {
        // Arrange
        let mut time = MockTimeService::new();
        time.expect_now().times(3).return_const(timestamp(0));
        time.expect_now().return_const(timestamp(200));
        let sut = RateLimitServiceImpl::new(time, CONFIG);

        // Act
        for _ in 0..3 {
            sut.check(ip(1)).unwrap();
        }
        let result = sut.check(ip(1));

        // Assert
        assert_eq!(
            result,
            Err(RateLimitExceeded {
                limit: 3,
                reset: std::time::Duration::from_secs(400),
            })
        );
    }

    #[test]
    fn window_rollover_resets_the_counter() {
        // Arrange
        let mut time = MockTimeService::new();
        time.expect_now().times(4).return_const(timestamp(0));
        time.expect_now().return_const(timestamp(600));
        let sut = RateLimitServiceImpl::new(time, CONFIG);

        // Act
        for _ in 0..3 {
            sut.check(ip(1)).unwrap();
        }
        assert_matches!(sut.check(ip(1)), Err(_));

        // Assert
        sut.check(ip(1)).unwrap();
    }
}
