use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerTime {
    pub message: String,
    pub time: String,
}

/// GET /{mode}/health
pub async fn health_handler() -> Json<ServerTime> {
    Json(ServerTime {
        message: "Systems Up".to_string(),
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
