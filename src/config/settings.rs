use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::StarshipError;

pub const DEFAULT_DB_PORT: u16 = 3306;

/// Fully resolved service configuration.
///
/// Field names match the environment variable / secret keys.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cors_origins: String,
    #[serde(rename = "db_host")]
    pub host: String,
    #[serde(rename = "db_host_read")]
    pub host_read: String,
    #[serde(rename = "db_port", deserialize_with = "lenient")]
    pub port: u16,
    #[serde(rename = "db_user")]
    pub username: String,
    #[serde(rename = "db_password")]
    pub password: String,
    #[serde(rename = "db_database")]
    pub database: String,
    #[serde(rename = "db_connect_timeout", deserialize_with = "duration")]
    pub connect_timeout: Duration,
    #[serde(rename = "db_max_conn_life_time", deserialize_with = "duration")]
    pub max_conn_lifetime: Duration,
    #[serde(rename = "db_max_conns", deserialize_with = "lenient")]
    pub max_conns: u32,
    #[serde(rename = "db_min_conns", deserialize_with = "lenient")]
    pub min_conns: u32,
    #[serde(rename = "db_refresh_password", deserialize_with = "flag")]
    pub refresh_password: bool,
    #[serde(rename = "db_time_zone")]
    pub time_zone: Option<String>,
    #[serde(rename = "db_restore", deserialize_with = "flag")]
    pub db_restore: bool,
    #[serde(rename = "device_key")]
    pub device_key_secret: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cors_origins: String::new(),
            host: String::new(),
            host_read: String::new(),
            port: DEFAULT_DB_PORT,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            connect_timeout: Duration::from_secs(2),
            max_conn_lifetime: Duration::from_secs(60 * 60),
            max_conns: 5,
            min_conns: 5,
            refresh_password: false,
            time_zone: None,
            db_restore: false,
            device_key_secret: String::new(),
        }
    }
}

impl Settings {
    /// Reject settings missing a required field. Empty counts as missing.
    pub fn validate(&self) -> Result<(), StarshipError> {
        let required: [(&'static str, &str); 2] = [
            ("db_database", &self.database),
            ("cors_origins", &self.cors_origins),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(StarshipError::MissingSetting { name });
            }
        }
        if self.min_conns > self.max_conns {
            return Err(StarshipError::InvalidSetting {
                name: "db_min_conns",
                reason: format!(
                    "{} exceeds db_max_conns ({})",
                    self.min_conns, self.max_conns
                ),
            });
        }
        Ok(())
    }

    /// `host:port` endpoint of the primary instance.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("cors_origins", &self.cors_origins)
            .field("host", &self.host)
            .field("host_read", &self.host_read)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_conn_lifetime", &self.max_conn_lifetime)
            .field("max_conns", &self.max_conns)
            .field("min_conns", &self.min_conns)
            .field("refresh_password", &self.refresh_password)
            .field("time_zone", &self.time_zone)
            .field("db_restore", &self.db_restore)
            .field("device_key_secret", &redacted(&self.device_key_secret))
            .finish()
    }
}

fn redacted(value: &str) -> &'static str {
    if value.is_empty() { "<empty>" } else { "<redacted>" }
}

/// Environment values arrive as strings; secrets and tests may carry
/// native JSON values. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum Raw<T> {
    Native(T),
    Text(String),
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    match Raw::<T>::deserialize(deserializer)? {
        Raw::Native(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Raw::<bool>::deserialize(deserializer)? {
        Raw::Native(v) => Ok(v),
        Raw::Text(s) => parse_bool(&s).map_err(serde::de::Error::custom),
    }
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    match Raw::<u64>::deserialize(deserializer)? {
        Raw::Native(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(s) => parse_duration(&s).map_err(serde::de::Error::custom),
    }
}

pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

/// Parse `500ms`, `2s`, `15m`, `1h`, `1d`. A bare number is seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim().to_ascii_lowercase();
    let (number, unit) = match value.find(|c: char| c.is_alphabetic()) {
        Some(pos) => (value[..pos].trim(), &value[pos..]),
        None => (value.as_str(), "s"),
    };

    let number: u64 = number
        .parse()
        .map_err(|e| format!("expected number in duration '{value}': {e}"))?;

    let scale: u64 = match unit {
        "ms" => return Ok(Duration::from_millis(number)),
        "s" | "sec" | "secs" | "seconds" => 1,
        "m" | "min" | "mins" | "minutes" => 60,
        "h" | "hr" | "hours" => 60 * 60,
        "d" | "days" => 24 * 60 * 60,
        _ => {
            return Err(format!(
                "unknown duration unit '{unit}' in '{value}', supported: ms, s, m, h, d"
            ));
        }
    };
    let secs = number
        .checked_mul(scale)
        .ok_or_else(|| format!("duration out of range: '{value}'"))?;
    Ok(Duration::from_secs(secs))
}
