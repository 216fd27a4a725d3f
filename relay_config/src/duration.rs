use std::ops::Deref;

use serde::Deserialize;

/// A duration given as whitespace-separated parts with a unit suffix, e.g.
/// `"10m"` or `"1h 30m"`. Supported units are `ms`, `s` (default), `m`, `h`
/// and `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let invalid = || serde::de::Error::custom("Invalid duration");

        let s = String::deserialize(deserializer)?;
        let mut out = std::time::Duration::default();
        for part in s.split_whitespace() {
            let digits = part.len() - part.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            let (value, unit) = part.split_at(digits);
            let value = value.parse::<u64>().map_err(|_| invalid())?;
            let secs = |factor| value.checked_mul(factor).map(std::time::Duration::from_secs);
            let part = match unit {
                "ms" => Some(std::time::Duration::from_millis(value)),
                "" | "s" => secs(1),
                "m" => secs(60),
                "h" => secs(3600),
                "d" => secs(24 * 3600),
                _ => None,
            };
            out = part
                .and_then(|part| out.checked_add(part))
                .ok_or_else(invalid)?;
        }
        Ok(Self(out))
    }
}
