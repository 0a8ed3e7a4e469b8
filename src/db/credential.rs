use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_rds::auth_token::{AuthTokenGenerator, Config as AuthTokenConfig};
use tracing::debug;

use crate::config::{CloudContext, Settings};
use crate::error::StarshipError;

/// Issues short-lived database authentication tokens.
#[async_trait]
pub trait AuthTokenSource: Send + Sync {
    async fn generate(
        &self,
        host: &str,
        port: u16,
        region: &str,
        username: &str,
    ) -> Result<String, StarshipError>;
}

/// RDS IAM authentication tokens signed with the ambient AWS credentials.
pub struct RdsAuthTokenSource {
    cloud: CloudContext,
}

impl RdsAuthTokenSource {
    pub fn new(cloud: CloudContext) -> Self {
        Self { cloud }
    }
}

#[async_trait]
impl AuthTokenSource for RdsAuthTokenSource {
    async fn generate(
        &self,
        host: &str,
        port: u16,
        region: &str,
        username: &str,
    ) -> Result<String, StarshipError> {
        let sdk = self.cloud.sdk()?;
        let config = AuthTokenConfig::builder()
            .hostname(host)
            .port(u64::from(port))
            .region(Region::new(region.to_string()))
            .username(username)
            .build()
            .map_err(|e| StarshipError::AuthToken(e.to_string()))?;

        let token = AuthTokenGenerator::new(config)
            .auth_token(sdk)
            .await
            .map_err(|e| StarshipError::AuthToken(e.to_string()))?;
        Ok(token.as_str().to_string())
    }
}

/// Derives the password for a new connection string.
///
/// Nothing is cached: every call either returns the static password or
/// mints a fresh token, so rotated tokens are picked up transparently.
pub struct CredentialProvider<'a> {
    settings: &'a Settings,
    region: &'a str,
    tokens: &'a dyn AuthTokenSource,
}

impl<'a> CredentialProvider<'a> {
    pub fn new(settings: &'a Settings, region: &'a str, tokens: &'a dyn AuthTokenSource) -> Self {
        Self {
            settings,
            region,
            tokens,
        }
    }

    pub async fn effective_password(&self) -> Result<String, StarshipError> {
        if !self.settings.password.is_empty() {
            return Ok(self.settings.password.clone());
        }

        debug!(
            endpoint = %self.settings.endpoint(),
            username = %self.settings.username,
            "minting database auth token"
        );
        self.tokens
            .generate(
                &self.settings.host,
                self.settings.port,
                self.region,
                &self.settings.username,
            )
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and returns a fixed token.
    pub(crate) struct CountingTokens {
        pub calls: AtomicUsize,
        pub token: Result<String, String>,
    }

    impl CountingTokens {
        pub(crate) fn ok(token: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                token: Ok(token.to_string()),
            }
        }

        pub(crate) fn failing(reason: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                token: Err(reason.to_string()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthTokenSource for CountingTokens {
        async fn generate(
            &self,
            host: &str,
            port: u16,
            _region: &str,
            username: &str,
        ) -> Result<String, StarshipError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!((host, port, username), ("db.internal", 3306, "iam-user"));
            self.token.clone().map_err(StarshipError::AuthToken)
        }
    }

    fn settings(password: &str) -> Settings {
        Settings {
            host: "db.internal".into(),
            username: "iam-user".into(),
            password: password.into(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn static_password_skips_the_token_service() {
        let tokens = CountingTokens::ok("unused");
        let settings = settings("x");
        let provider = CredentialProvider::new(&settings, "us-west-2", &tokens);

        assert_eq!(provider.effective_password().await.unwrap(), "x");
        assert_eq!(tokens.calls(), 0);
    }

    #[tokio::test]
    async fn empty_password_mints_exactly_one_token() {
        let tokens = CountingTokens::ok("db.internal:3306/?Action=connect&X-Amz-Signature=abc");
        let settings = settings("");
        let provider = CredentialProvider::new(&settings, "us-west-2", &tokens);

        assert_eq!(
            provider.effective_password().await.unwrap(),
            "db.internal:3306/?Action=connect&X-Amz-Signature=abc"
        );
        assert_eq!(tokens.calls(), 1);
    }

    #[tokio::test]
    async fn token_failure_is_returned_not_swallowed() {
        let tokens = CountingTokens::failing("no credentials in chain");
        let settings = settings("");
        let provider = CredentialProvider::new(&settings, "us-west-2", &tokens);

        let err = provider.effective_password().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(tokens.calls(), 1);
    }

    #[tokio::test]
    async fn rds_source_without_cloud_config_fails() {
        let source = RdsAuthTokenSource::new(CloudContext::offline("us-west-2"));
        let err = source
            .generate("db.internal", 3306, "us-west-2", "iam-user")
            .await
            .unwrap_err();
        assert!(matches!(err, StarshipError::CloudConfigMissing));
    }
}
