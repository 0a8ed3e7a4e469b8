use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::Connection;
use std::time::Duration;
use tracing::{error, info};

use crate::config::Settings;
use crate::db::connection::{CONNECT_TIMEOUT, ConnectionString, HostRole};
use crate::db::credential::{AuthTokenSource, CredentialProvider};
use crate::db::migrate::MigrationRunner;
use crate::error::StarshipError;

/// Default bound for the startup connectivity probe.
pub const PING_DEADLINE: Duration = Duration::from_secs(30);

/// Validated write and read pools.
///
/// Both pools answered a ping before this value was built.
#[derive(Clone, Debug)]
pub struct Database {
    write: MySqlPool,
    read: MySqlPool,
}

impl Database {
    pub fn write(&self) -> &MySqlPool {
        &self.write
    }

    pub fn read(&self) -> &MySqlPool {
        &self.read
    }

    pub async fn close(&self) {
        self.read.close().await;
        self.write.close().await;
    }
}

/// Pool sizing applied to every pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
}

impl PoolLimits {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_connections: settings.max_conns.max(1),
            min_connections: settings.min_conns.min(settings.max_conns.max(1)),
            max_lifetime: settings.max_conn_lifetime,
        }
    }

    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .max_lifetime(self.max_lifetime)
            .acquire_timeout(CONNECT_TIMEOUT)
    }
}

pub struct PoolBootstrapper<'a> {
    settings: &'a Settings,
    credentials: CredentialProvider<'a>,
    limits: PoolLimits,
    ping_deadline: Duration,
}

impl<'a> PoolBootstrapper<'a> {
    pub fn new(settings: &'a Settings, region: &'a str, tokens: &'a dyn AuthTokenSource) -> Self {
        Self {
            settings,
            credentials: CredentialProvider::new(settings, region, tokens),
            limits: PoolLimits::from_settings(settings),
            ping_deadline: PING_DEADLINE,
        }
    }

    pub fn with_ping_deadline(mut self, deadline: Duration) -> Self {
        self.ping_deadline = deadline;
        self
    }

    /// Build a connection string for `role` with a freshly derived password.
    pub async fn connection_string(&self, role: HostRole) -> Result<ConnectionString, StarshipError> {
        let password = self.credentials.effective_password().await.inspect_err(|e| {
            error!(role = role.as_str(), error = %e, "failed to create connection string");
        })?;
        Ok(ConnectionString::new(self.settings, role, password))
    }

    /// Open a pool for `role` and ping it. A pool that fails the ping is
    /// closed before the error is returned.
    pub async fn open(&self, role: HostRole) -> Result<MySqlPool, StarshipError> {
        let conn = self.connection_string(role).await?;
        let pool = self
            .limits
            .pool_options()
            .connect_lazy_with(conn.connect_options());

        if let Err(e) = ping(&pool, self.ping_deadline).await {
            error!(role = role.as_str(), host = conn.host(), error = %e, "failed to ping db");
            pool.close().await;
            return Err(e);
        }

        info!(
            role = role.as_str(),
            host = conn.host(),
            max_connections = self.limits.max_connections,
            "database pool ready"
        );
        Ok(pool)
    }

    pub async fn bootstrap(&self) -> Result<Database, StarshipError> {
        info!(
            host = %self.settings.host,
            port = self.settings.port,
            "creating new db connection"
        );
        let write = self.open(HostRole::Write).await?;
        let read = match self.open(HostRole::Read).await {
            Ok(pool) => pool,
            Err(e) => {
                write.close().await;
                return Err(e);
            }
        };
        Ok(Database { write, read })
    }
}

async fn ping(pool: &MySqlPool, deadline: Duration) -> Result<(), StarshipError> {
    let probe = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await?;
        Ok::<_, StarshipError>(())
    };
    tokio::time::timeout(deadline, probe)
        .await
        .map_err(|_| StarshipError::PingTimeout(deadline))?
}

/// Open both pools and migrate the write side. Any failure here means the
/// service must not start.
pub async fn setup_database(
    settings: &Settings,
    region: &str,
    tokens: &dyn AuthTokenSource,
    migrations: &MigrationRunner,
) -> Result<Database, StarshipError> {
    let database = PoolBootstrapper::new(settings, region, tokens)
        .bootstrap()
        .await?;

    let database = migrate_or_close(database, migrations).await?;
    info!("db setup successfully");
    Ok(database)
}

/// Migrate through the write pool. Both pools are closed when the run fails.
async fn migrate_or_close(
    database: Database,
    migrations: &MigrationRunner,
) -> Result<Database, StarshipError> {
    info!("migrating database");
    if let Err(e) = migrations.run(database.write()).await {
        error!(error = %e, "failed to migrate db");
        database.close().await;
        return Err(e);
    }
    Ok(database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::credential::tests::CountingTokens;

    fn unreachable_settings(password: &str) -> Settings {
        Settings {
            host: "127.0.0.1".into(),
            port: 1,
            username: "u".into(),
            password: password.into(),
            database: "d".into(),
            cors_origins: "https://app.example.com".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn limits_follow_configuration() {
        let settings = Settings {
            max_conns: 12,
            min_conns: 3,
            max_conn_lifetime: Duration::from_secs(600),
            ..Settings::default()
        };
        assert_eq!(
            PoolLimits::from_settings(&settings),
            PoolLimits {
                max_connections: 12,
                min_connections: 3,
                max_lifetime: Duration::from_secs(600),
            }
        );
    }

    #[test]
    fn limits_never_allow_an_empty_pool() {
        let settings = Settings { max_conns: 0, min_conns: 0, ..Settings::default() };
        let limits = PoolLimits::from_settings(&settings);
        assert_eq!(limits.max_connections, 1);
        assert_eq!(limits.min_connections, 0);
    }

    #[tokio::test]
    async fn failed_ping_yields_no_pool() {
        let tokens = CountingTokens::ok("unused");
        let settings = unreachable_settings("p");
        let bootstrapper = PoolBootstrapper::new(&settings, "us-west-2", &tokens)
            .with_ping_deadline(Duration::from_secs(2));

        let result = bootstrapper.bootstrap().await;
        assert!(result.is_err());
        assert_eq!(tokens.calls(), 0);
    }

    #[tokio::test]
    async fn token_failure_aborts_before_connecting() {
        let tokens = CountingTokens::failing("expired session");
        let settings = Settings {
            host: "db.internal".into(),
            port: 3306,
            username: "iam-user".into(),
            ..unreachable_settings("")
        };
        let bootstrapper = PoolBootstrapper::new(&settings, "us-west-2", &tokens);

        let err = bootstrapper.open(HostRole::Write).await.unwrap_err();
        assert!(matches!(err, StarshipError::AuthToken(_)));
        assert_eq!(tokens.calls(), 1);
    }

    #[tokio::test]
    async fn failed_migration_closes_both_pools() {
        let settings = unreachable_settings("p");
        let conn = ConnectionString::new(&settings, HostRole::Write, "p".into());
        let lazy = || {
            MySqlPoolOptions::new()
                .acquire_timeout(Duration::from_secs(1))
                .connect_lazy_with(conn.connect_options())
        };
        let database = Database {
            write: lazy(),
            read: lazy(),
        };
        let handle = database.clone();

        let result = migrate_or_close(database, &MigrationRunner::embedded()).await;
        assert!(result.is_err());
        assert!(handle.write().is_closed());
        assert!(handle.read().is_closed());
    }
}
