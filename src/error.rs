use sqlx::Error as SqlxError;
use sqlx::migrate::MigrateError;
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StarshipError {
    #[error("Required setting {name} is missing")]
    MissingSetting { name: &'static str },

    #[error("Settings error: {0}")]
    Settings(#[from] figment::Error),

    #[error("Invalid value for setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Error getting secret {secret_id}: {reason}")]
    SecretFetch { secret_id: String, reason: String },

    #[error("Secret {secret_id} has no string payload")]
    SecretNotString { secret_id: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cloud configuration was not loaded for this mode")]
    CloudConfigMissing,

    #[error("Could not create authentication token: {0}")]
    AuthToken(String),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Database ping did not complete within {0:?}")]
    PingTimeout(Duration),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),

    #[error("Invalid allowed origins: {0}")]
    InvalidCorsOrigin(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure classes used by the startup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or missing configuration. The process must not boot.
    Configuration,
    /// Pools, pings, migrations, sockets. The process must not boot.
    Infrastructure,
    /// Token generation. Returned as a value so callers may retry.
    Credential,
}

impl StarshipError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StarshipError::MissingSetting { .. }
            | StarshipError::Settings(_)
            | StarshipError::InvalidSetting { .. }
            | StarshipError::SecretFetch { .. }
            | StarshipError::SecretNotString { .. }
            | StarshipError::Json(_)
            | StarshipError::CloudConfigMissing
            | StarshipError::InvalidCorsOrigin(_) => ErrorClass::Configuration,
            StarshipError::AuthToken(_) => ErrorClass::Credential,
            StarshipError::Database(_)
            | StarshipError::PingTimeout(_)
            | StarshipError::Migration(_)
            | StarshipError::Io(_) => ErrorClass::Infrastructure,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_the_only_retryable_class() {
        assert!(StarshipError::AuthToken("expired".into()).is_retryable());
        assert!(!StarshipError::MissingSetting { name: "db_database" }.is_retryable());
        assert!(!StarshipError::PingTimeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn classes_follow_the_startup_taxonomy() {
        assert_eq!(
            StarshipError::SecretNotString { secret_id: "dev/template".into() }.class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            StarshipError::Database(SqlxError::PoolClosed).class(),
            ErrorClass::Infrastructure
        );
    }

    #[test]
    fn missing_setting_message_names_the_field() {
        let err = StarshipError::MissingSetting { name: "cors_origins" };
        assert_eq!(err.to_string(), "Required setting cors_origins is missing");
    }
}
