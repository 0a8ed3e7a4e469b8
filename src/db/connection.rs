use sqlx::mysql::MySqlConnectOptions;
use std::fmt;
use std::time::Duration;

use crate::config::Settings;

/// Fixed connect bound. The configured `db_connect_timeout` is not used.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Which instance a pool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRole {
    Write,
    Read,
}

impl HostRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostRole::Write => "write",
            HostRole::Read => "read",
        }
    }

    pub fn host<'a>(&self, settings: &'a Settings) -> &'a str {
        match self {
            HostRole::Write => &settings.host,
            // TODO: return `settings.host_read` once a read replica is provisioned
            // for every environment; until then reads go to the primary.
            HostRole::Read => &settings.host,
        }
    }
}

/// Everything needed to open a MySQL connection.
#[derive(Clone)]
pub struct ConnectionString {
    username: String,
    password: String,
    host: String,
    port: u16,
    database: String,
    timeout: Duration,
    time_zone: Option<String>,
}

impl ConnectionString {
    pub fn new(settings: &Settings, role: HostRole, password: String) -> Self {
        if settings.connect_timeout != CONNECT_TIMEOUT {
            tracing::debug!(
                configured = ?settings.connect_timeout,
                applied = ?CONNECT_TIMEOUT,
                "overriding configured connect timeout"
            );
        }

        Self {
            username: settings.username.clone(),
            password,
            host: role.host(settings).to_string(),
            port: settings.port,
            database: settings.database.clone(),
            timeout: CONNECT_TIMEOUT,
            time_zone: settings
                .time_zone
                .as_ref()
                .filter(|tz| !tz.trim().is_empty())
                .cloned(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `user:password@tcp(host:port)/database?timeout=15s&allowCleartextPasswords=true`
    pub fn dsn(&self) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}?timeout={}s&allowCleartextPasswords=true",
            self.username,
            self.password,
            self.host,
            self.port,
            self.database,
            self.timeout.as_secs()
        )
    }

    /// Driver options equivalent to [`Self::dsn`]. Cleartext auth is
    /// required to send IAM tokens.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
            .enable_cleartext_plugin(true);

        match &self.time_zone {
            Some(tz) => options.timezone(Some(tz.clone())),
            None => options,
        }
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:<redacted>@tcp({}:{})/{}?timeout={}s&allowCleartextPasswords=true",
            self.username,
            self.host,
            self.port,
            self.database,
            self.timeout.as_secs()
        )
    }
}
