use async_trait::async_trait;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info};

use crate::config::cloud::CloudContext;
use crate::error::StarshipError;

/// Remote key-value store holding the sensitive part of the settings.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Raw string payload of `secret_id`.
    async fn fetch(&self, secret_id: &str) -> Result<String, StarshipError>;
}

/// The three fields a secret contributes to the settings. Anything else
/// in the payload is ignored; absent fields become empty strings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretPayload {
    pub db_user: String,
    pub db_password: String,
    pub device_key: String,
}

impl SecretPayload {
    pub fn parse(raw: &str) -> Result<Self, StarshipError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPayload")
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("device_key", &"<redacted>")
            .finish()
    }
}

/// AWS Secrets Manager backed store.
#[derive(Clone)]
pub struct AwsSecretStore {
    client: SecretsManagerClient,
}

impl AwsSecretStore {
    pub fn new(cloud: &CloudContext) -> Result<Self, StarshipError> {
        Ok(Self {
            client: SecretsManagerClient::new(cloud.sdk()?),
        })
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<String, StarshipError> {
        info!(secret_id, "trying to get secret");
        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                let reason = DisplayErrorContext(&e).to_string();
                error!(secret_id, error = %reason, "error getting secret");
                StarshipError::SecretFetch {
                    secret_id: secret_id.to_string(),
                    reason,
                }
            })?;

        match output.secret_string() {
            Some(payload) => {
                info!(secret_id, "got secret");
                Ok(payload.to_string())
            }
            None => Err(StarshipError::SecretNotString {
                secret_id: secret_id.to_string(),
            }),
        }
    }
}

/// Store used in local mode, where no secret is ever fetched.
pub struct NoSecretStore;

#[async_trait]
impl SecretStore for NoSecretStore {
    async fn fetch(&self, secret_id: &str) -> Result<String, StarshipError> {
        Err(StarshipError::SecretFetch {
            secret_id: secret_id.to_string(),
            reason: "no secret store configured".to_string(),
        })
    }
}
