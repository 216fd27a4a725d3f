use std::net::IpAddr;

use relay_extern_contracts::turnstile::TurnstileApiService;
use relay_shared_contracts::captcha::{CaptchaCheckError, CaptchaService};
use tracing::warn;

pub struct CaptchaServiceImpl<TurnstileApi> {
    turnstile_api: TurnstileApi,
    config: CaptchaServiceConfig,
}

impl<TurnstileApi> CaptchaServiceImpl<TurnstileApi> {
    pub fn new(turnstile_api: TurnstileApi, config: CaptchaServiceConfig) -> Self {
        Self {
            turnstile_api,
            config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaServiceConfig {
    allowed_hostnames: Vec<String>,
    expected_action: String,
}

impl CaptchaServiceConfig {
    /// Builds the config from a comma-separated hostname allow-list. Entries
    /// are normalized once here so tokens verify against a canonical set.
    pub fn new(allowed_hostnames: &str, expected_action: impl Into<String>) -> Self {
        let mut hostnames = Vec::new();
        for hostname in allowed_hostnames.split(',').map(normalize_hostname) {
            if !hostname.is_empty() && !hostnames.contains(&hostname) {
                hostnames.push(hostname);
            }
        }
        Self {
            allowed_hostnames: hostnames,
            expected_action: expected_action.into(),
        }
    }
}

impl<TurnstileApi> CaptchaService for CaptchaServiceImpl<TurnstileApi>
where
    TurnstileApi: TurnstileApiService,
{
    async fn check(
        &self,
        response: &str,
        remote_ip: Option<IpAddr>,
    ) -> Result<(), CaptchaCheckError> {
        let result = self.turnstile_api.siteverify(response, remote_ip).await?;

        if !result.success {
            warn!(error_codes = ?result.error_codes, "turnstile rejected the token");
            return Err(CaptchaCheckError::Failed);
        }

        // A cryptographically valid token can still have been solved on a
        // different site or for a different widget action.
        let hostname_ok = result
            .hostname
            .as_deref()
            .map(normalize_hostname)
            .is_some_and(|hostname| self.config.allowed_hostnames.contains(&hostname));
        if !hostname_ok {
            warn!(hostname = ?result.hostname, "token hostname not in allow-list");
            return Err(CaptchaCheckError::Failed);
        }

        if result.action.as_deref() != Some(&*self.config.expected_action) {
            warn!(action = ?result.action, "token action label mismatch");
            return Err(CaptchaCheckError::Failed);
        }

        Ok(())
    }
}

fn normalize_hostname(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim_end_matches('.')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use relay_extern_contracts::turnstile::{MockTurnstileApiService, TurnstileSiteverifyResponse};
    use relay_utils::assert_matches;

    use super::*;

    const REMOTE_IP: Option<IpAddr> = Some(IpAddr::V4(std::net::Ipv4Addr::new(203, 0, 113, 9)));

    fn config() -> CaptchaServiceConfig {
        CaptchaServiceConfig::new("jodyholt.com, www.jodyholt.com", "contact_form")
    }

    fn verified(hostname: &str, action: &str) -> TurnstileSiteverifyResponse {
        TurnstileSiteverifyResponse {
            success: true,
            hostname: Some(hostname.into()),
            action: Some(action.into()),
            error_codes: vec![],
        }
    }

    #[tokio::test]
    async fn ok() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            REMOTE_IP,
            Ok(verified("jodyholt.com", "contact_form")),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", REMOTE_IP).await;

        // Assert
        result.unwrap();
    }

    #[tokio::test]
    async fn ok_hostname_case_and_trailing_dot() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            None,
            Ok(verified("WWW.JodyHolt.com.", "contact_form")),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", None).await;

        // Assert
        result.unwrap();
    }

    #[tokio::test]
    async fn failed_not_successful() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            None,
            Ok(TurnstileSiteverifyResponse {
                success: false,
                error_codes: vec!["invalid-input-response".into()],
                ..Default::default()
            }),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", None).await;

        // Assert
        assert_matches!(result, Err(CaptchaCheckError::Failed));
    }

    #[tokio::test]
    async fn failed_hostname_mismatch() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            None,
            Ok(verified("evil.example", "contact_form")),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", None).await;

        // Assert
        assert_matches!(result, Err(CaptchaCheckError::Failed));
    }

    #[tokio::test]
    async fn failed_hostname_missing() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            None,
            Ok(TurnstileSiteverifyResponse {
                success: true,
                action: Some("contact_form".into()),
                ..Default::default()
            }),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", None).await;

        // Assert
        assert_matches!(result, Err(CaptchaCheckError::Failed));
    }

    #[tokio::test]
    async fn failed_action_mismatch() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            None,
            Ok(verified("jodyholt.com", "login")),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", None).await;

        // Assert
        assert_matches!(result, Err(CaptchaCheckError::Failed));
    }

    #[tokio::test]
    async fn unavailable() {
        // Arrange
        let turnstile_api = MockTurnstileApiService::new().with_siteverify(
            "token".into(),
            None,
            Err(anyhow!("connection refused")),
        );

        let sut = CaptchaServiceImpl::new(turnstile_api, config());

        // Act
        let result = sut.check("token", None).await;

        // Assert
        assert_matches!(result, Err(CaptchaCheckError::Unavailable(_)));
    }

    #[test]
    fn allow_list_normalization() {
        let config = CaptchaServiceConfig::new(" 'JodyHolt.com' , www.jodyholt.com., , b.dev ", "x");
        assert_eq!(
            config.allowed_hostnames,
            ["jodyholt.com", "www.jodyholt.com", "b.dev"]
        );
    }
}
