use figment::Figment;
use figment::providers::Serialized;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::env::EnvironmentProvider;
use crate::config::mode::DeploymentMode;
use crate::config::secrets::{SecretPayload, SecretStore};
use crate::config::settings::Settings;
use crate::error::StarshipError;

/// Resolve the settings for `mode`.
///
/// Local mode reads everything from `env`. Any other mode fetches
/// `<mode>/template` from `secrets` and lets its `db_user`,
/// `db_password` and `device_key` override the environment.
pub async fn resolve_settings(
    mode: &DeploymentMode,
    env: &impl EnvironmentProvider,
    secrets: &dyn SecretStore,
) -> Result<Settings, StarshipError> {
    let snapshot = env.snapshot();

    let secret = match mode.secret_id() {
        None => None,
        Some(secret_id) => {
            let raw = secrets.fetch(&secret_id).await?;
            Some(SecretPayload::parse(&raw)?)
        }
    };

    let settings = merge_settings(&snapshot, secret.as_ref())?;
    info!(
        mode = %mode,
        host = %settings.host,
        port = settings.port,
        database = %settings.database,
        "settings resolved"
    );
    Ok(settings)
}

/// Layer the secret over the environment snapshot and validate.
pub fn merge_settings(
    env: &BTreeMap<String, String>,
    secret: Option<&SecretPayload>,
) -> Result<Settings, StarshipError> {
    let mut figment = Figment::from(Serialized::globals(env));
    if let Some(secret) = secret {
        figment = figment.merge(Serialized::globals(secret));
    }

    let settings: Settings = figment.extract()?;
    settings.validate()?;
    Ok(settings)
}
