//! Database bootstrap: credentials, connection strings, pools, migrations.
//!
//! Layout:
//! - `credential.rs`: static password or IAM auth token
//! - `connection.rs`: host roles and the connection string
//! - `pool.rs`: validated write/read pools
//! - `migrate.rs`: embedded schema migrations

pub mod connection;
pub mod credential;
pub mod migrate;
pub mod pool;

pub use connection::{CONNECT_TIMEOUT, ConnectionString, HostRole};
pub use credential::{AuthTokenSource, CredentialProvider, RdsAuthTokenSource};
pub use migrate::{MigrationReport, MigrationRunner};
pub use pool::{Database, PoolBootstrapper, PoolLimits, setup_database};
