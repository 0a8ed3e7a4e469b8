pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod startup;

pub use error::StarshipError;
pub use startup::Starship;
