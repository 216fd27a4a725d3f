use anyhow::Context;
use relay_config::EmailConfig;
use relay_email_impl::EmailServiceImpl;

/// Connect to the SMTP server
pub fn connect(config: &EmailConfig) -> anyhow::Result<EmailServiceImpl> {
    EmailServiceImpl::new(&config.smtp_url, config.from.clone())
        .context("Failed to connect to SMTP server")
}
