pub mod errors;
pub mod health;
pub mod helpers;

pub use errors::ApiError;
pub use health::health_handler;
