use std::collections::HashMap;

use nutype::nutype;
use serde::{Deserialize, Serialize};

use crate::email_address::EmailAddress;

/// Contact form payload exactly as received from the browser.
///
/// All fields are optional at the wire layer so that the submission pipeline
/// controls the order in which missing or malformed fields are rejected. The
/// honeypot field has a configurable name and therefore lives in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "startedAt")]
    pub started_at: Option<serde_json::Value>,
    #[serde(default, rename = "turnstileToken")]
    pub turnstile_token: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ContactRequest {
    /// Returns the value of an extra field if it was sent as a string.
    pub fn extra_str(&self, field: &str) -> Option<&str> {
        self.extra.get(field).and_then(serde_json::Value::as_str)
    }

    /// Coerces `startedAt` to epoch milliseconds, accepting numbers and
    /// numeric strings.
    pub fn started_at_ms(&self) -> Option<i64> {
        match self.started_at.as_ref()? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            serde_json::Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
            }
            _ => None,
        }
    }
}

/// A submission that has passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub author: SubmissionAuthor,
    pub message: SubmissionMessage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAuthor {
    pub name: SubmissionName,
    pub email: EmailAddress,
}

#[nutype(
    sanitize(trim),
    validate(len_char_min = 2, len_char_max = 80),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct SubmissionName(String);

#[nutype(
    sanitize(trim),
    validate(len_char_min = 20, len_char_max = 2000),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct SubmissionMessage(String);

#[nutype(
    sanitize(trim),
    validate(len_char_min = 1),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct TurnstileToken(String);
