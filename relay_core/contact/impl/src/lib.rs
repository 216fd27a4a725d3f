use std::{net::IpAddr, sync::Arc};

use chrono::{DateTime, SecondsFormat, Utc};
use relay_core_contact_contracts::{ContactFeatureService, ContactSubmitError, RejectReason};
use relay_email_contracts::{Email, EmailService};
use relay_models::{
    contact::{
        ContactRequest, ContactSubmission, SubmissionAuthor, SubmissionMessage, SubmissionName,
        TurnstileToken,
    },
    email_address::{EmailAddressWithName, EMAIL_ADDRESS_MAX_CHARS},
};
use relay_shared_contracts::{
    captcha::{CaptchaCheckError, CaptchaService},
    rate_limit::RateLimitService,
    time::TimeService,
};
use tracing::{error, info, warn};

pub struct ContactFeatureServiceImpl<Time, RateLimit, Captcha, EmailS> {
    time: Time,
    rate_limit: RateLimit,
    captcha: Captcha,
    email: EmailS,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    pub recipient: Arc<EmailAddressWithName>,
    pub subject_prefix: Arc<str>,
    pub honeypot_field: Arc<str>,
    pub min_dwell: std::time::Duration,
}

impl<Time, RateLimit, Captcha, EmailS> ContactFeatureServiceImpl<Time, RateLimit, Captcha, EmailS> {
    pub fn new(
        time: Time,
        rate_limit: RateLimit,
        captcha: Captcha,
        email: EmailS,
        config: ContactFeatureConfig,
    ) -> Self {
        Self {
            time,
            rate_limit,
            captcha,
            email,
            config,
        }
    }
}

impl<Time, RateLimit, Captcha, EmailS> ContactFeatureService
    for ContactFeatureServiceImpl<Time, RateLimit, Captcha, EmailS>
where
    Time: TimeService,
    RateLimit: RateLimitService,
    Captcha: CaptchaService,
    EmailS: EmailService,
{
    async fn submit(
        &self,
        request: ContactRequest,
        client_ip: IpAddr,
    ) -> Result<(), ContactSubmitError> {
        // Cheap heuristics run before anything that costs CPU or network.
        if request
            .extra_str(&self.config.honeypot_field)
            .is_some_and(|value| !value.trim().is_empty())
        {
            warn!("contact submission blocked by honeypot field");
            return Err(ContactSubmitError::Rejected(RejectReason::Honeypot));
        }

        let now = self.time.now();
        let dwell_ok = request.started_at_ms().is_some_and(|started_at| {
            now.timestamp_millis().saturating_sub(started_at)
                >= self.config.min_dwell.as_millis() as i64
        });
        if !dwell_ok {
            warn!("contact submission rejected by minimum dwell time");
            return Err(ContactSubmitError::Rejected(RejectReason::TooFast));
        }

        let Some((submission, token)) = validate(&request) else {
            warn!("invalid contact payload");
            return Err(ContactSubmitError::Rejected(RejectReason::Invalid));
        };

        self.rate_limit.check(client_ip)?;

        match self.captcha.check(&token, Some(client_ip)).await {
            Ok(()) => {}
            Err(CaptchaCheckError::Failed) => {
                warn!("turnstile verification failed");
                return Err(ContactSubmitError::VerificationFailed);
            }
            Err(CaptchaCheckError::Unavailable(err)) => {
                error!("turnstile verification request failed: {err:#}");
                return Err(ContactSubmitError::VerificationUnavailable(err));
            }
        }

        let email = compose(&self.config, &submission, client_ip, now);
        match self.email.send(email).await {
            Ok(true) => {
                info!("contact email sent");
                Ok(())
            }
            Ok(false) => Err(ContactSubmitError::Send),
            Err(err) => {
                error!("failed to send contact email: {err:#}");
                Err(ContactSubmitError::Send)
            }
        }
    }
}

/// Structural validation, strictest checks last. `None` means the payload
/// violates the schema; the caller decides how much of that to reveal.
fn validate(request: &ContactRequest) -> Option<(ContactSubmission, TurnstileToken)> {
    let name = SubmissionName::try_new(request.name.clone()?).ok()?;

    let email = request.email.as_deref()?.trim();
    if email.chars().count() > EMAIL_ADDRESS_MAX_CHARS {
        return None;
    }
    let email = email.parse().ok()?;

    let message = SubmissionMessage::try_new(request.message.clone()?).ok()?;
    let token = TurnstileToken::try_new(request.turnstile_token.clone()?).ok()?;

    if request.started_at_ms()? <= 0 {
        return None;
    }

    Some((
        ContactSubmission {
            author: SubmissionAuthor { name, email },
            message,
        },
        token,
    ))
}

fn compose(
    config: &ContactFeatureConfig,
    submission: &ContactSubmission,
    client_ip: IpAddr,
    now: DateTime<Utc>,
) -> Email {
    let name = &**submission.author.name;
    let address = submission.author.email.as_str();
    let received_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    let text = format!(
        "Name: {name}\n\
         Email: {address}\n\
         Source IP: {client_ip}\n\
         Received At: {received_at}\n\
         \n\
         Message:\n\
         {message}",
        message = &**submission.message,
    );

    let html = format!(
        "<h2>Contact Form Submission</h2>\n\
         <p><strong>Name:</strong> {name}</p>\n\
         <p><strong>Email:</strong> {address}</p>\n\
         <p><strong>Source IP:</strong> {client_ip}</p>\n\
         <p><strong>Received At:</strong> {received_at}</p>\n\
         <p><strong>Message:</strong><br>{message}</p>",
        name = escape_html(name),
        address = escape_html(address),
        received_at = escape_html(&received_at),
        message = newline_to_breaks(&submission.message),
    );

    Email {
        recipient: (*config.recipient).clone(),
        subject: format!("{} {}", config.subject_prefix, name),
        text,
        html: Some(html),
        reply_to: Some(
            submission
                .author
                .email
                .clone()
                .with_name(name.to_owned()),
        ),
    }
}

/// Entity-escapes the five HTML-significant characters. Mandatory for the
/// HTML part so a submission cannot inject markup into the mail client.
fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn newline_to_breaks(value: &str) -> String {
    escape_html(value).replace('\n', "<br>")
}
