use axum::http::{HeaderName, HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use url::Url;

use crate::error::StarshipError;

pub const SESSION_HEADER: &str = "x-session";
pub const CSRF_TOKEN_HEADER: &str = "x-csrf-token";

/// Split the comma-separated `cors_origins` setting.
///
/// Entries are trimmed and blanks dropped. `*` is refused, and every
/// origin must be an absolute http(s) URL.
pub fn load_allowed_origins(raw: &str) -> Result<Vec<String>, StarshipError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    validate_allowed_origins(&origins)?;
    Ok(origins)
}

pub fn validate_allowed_origins(origins: &[String]) -> Result<(), StarshipError> {
    for origin in origins {
        if origin == "*" {
            return Err(StarshipError::InvalidCorsOrigin(
                "wildcard '*' is not allowed in CORS allowed origins".to_string(),
            ));
        }
        let url = Url::parse(origin)
            .map_err(|e| StarshipError::InvalidCorsOrigin(format!("{origin}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(StarshipError::InvalidCorsOrigin(format!(
                "{origin}: expected an http(s) origin"
            )));
        }
    }
    Ok(())
}

/// CORS layer for the configured origins, or `None` when none are set.
pub fn cors_layer(raw_origins: &str) -> Result<Option<CorsLayer>, StarshipError> {
    let origins = load_allowed_origins(raw_origins)?;
    if origins.is_empty() {
        return Ok(None);
    }
    info!(origins = ?origins, "cors origins");

    let values = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).map_err(|e| StarshipError::InvalidCorsOrigin(format!("{o}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let session = HeaderName::from_static(SESSION_HEADER);
    let csrf = HeaderName::from_static(CSRF_TOKEN_HEADER);

    let layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(values))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            csrf.clone(),
            session.clone(),
        ])
        .expose_headers([header::LINK, csrf, session])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300));
    Ok(Some(layer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        let origins =
            load_allowed_origins(" https://app.example.com, ,http://localhost:3000 ").unwrap();
        assert_eq!(origins, vec!["https://app.example.com", "http://localhost:3000"]);
    }

    #[test]
    fn wildcard_is_rejected() {
        let err = load_allowed_origins("https://app.example.com,*").unwrap_err();
        assert!(err.to_string().contains("wildcard"));
    }

    #[test]
    fn non_http_origins_are_rejected() {
        assert!(load_allowed_origins("ftp://files.example.com").is_err());
        assert!(load_allowed_origins("app.example.com").is_err());
    }

    #[test]
    fn empty_setting_disables_the_layer() {
        assert!(cors_layer("").unwrap().is_none());
        assert!(cors_layer("https://app.example.com").unwrap().is_some());
    }
}
