use std::fmt;

use crate::config::env::EnvironmentProvider;

pub const MODE_ENV: &str = "mode";
pub const AWS_REGION_ENV: &str = "aws_region";
pub const LOCAL_MODE: &str = "local";
pub const AWS_REGION_DEFAULT: &str = "us-west-2";

/// Where settings are sourced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Everything comes from the process environment.
    Local,
    /// Sensitive fields come from the `<name>/template` secret.
    Remote(String),
}

impl DeploymentMode {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "" | LOCAL_MODE => DeploymentMode::Local,
            other => DeploymentMode::Remote(other.to_string()),
        }
    }

    pub fn from_env(env: &impl EnvironmentProvider) -> Self {
        Self::parse(&env.get_or(MODE_ENV, LOCAL_MODE))
    }

    pub fn name(&self) -> &str {
        match self {
            DeploymentMode::Local => LOCAL_MODE,
            DeploymentMode::Remote(name) => name,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, DeploymentMode::Local)
    }

    /// Secret holding the sensitive settings for this mode.
    pub fn secret_id(&self) -> Option<String> {
        match self {
            DeploymentMode::Local => None,
            DeploymentMode::Remote(name) => Some(format!("{name}/template")),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn region_from_env(env: &impl EnvironmentProvider) -> String {
    env.get_or(AWS_REGION_ENV, AWS_REGION_DEFAULT)
}
