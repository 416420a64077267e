use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use service::ProxyError;
use thiserror::Error;

use crate::routes::auth::clear_session_cookies;

/// Error body returned by every `/api` handler:
/// `{ "error": ..., "message": ..., "code": ... }`, plus `redirect` when the
/// session has ended.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: String,
    pub message: Option<String>,
    pub code: Option<u16>,
    /// Login page to send the browser to; set only for ended sessions.
    pub redirect: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: Option<String>) -> Self {
        Self { status, error: error.into(), message, code: None, redirect: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", Some(message.into()))
    }

    pub fn session_expired(login_path: &str) -> Self {
        Self::from_proxy(ProxyError::SessionExpired, login_path)
    }

    pub fn from_proxy(e: ProxyError, login_path: &str) -> Self {
        let status = StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::BAD_GATEWAY);
        let redirect = e.forces_logout().then(|| login_path.to_string());
        Self {
            status,
            error: e.kind().to_string(),
            message: Some(e.to_string()),
            code: Some(e.code()),
            redirect,
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error,
            "message": self.message,
            "code": self.code,
            "redirect": self.redirect,
        }));
        if self.redirect.is_some() {
            // 会话结束：同时清除 cookie
            let jar = clear_session_cookies(CookieJar::new());
            return (self.status, jar, body).into_response();
        }
        (self.status, body).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("upstream client setup failed: {0}")]
    Upstream(#[from] ProxyError),
}
