//! Settings resolution: environment snapshot, optional secret overlay,
//! typed validation.

pub mod cloud;
pub mod env;
pub mod mode;
pub mod resolver;
pub mod secrets;
pub mod settings;

pub use cloud::CloudContext;
pub use env::{EnvironmentProvider, StaticEnvironment, SystemEnvironment};
pub use mode::DeploymentMode;
pub use resolver::{merge_settings, resolve_settings};
pub use secrets::{AwsSecretStore, NoSecretStore, SecretPayload, SecretStore};
pub use settings::Settings;
