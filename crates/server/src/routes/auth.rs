use std::convert::Infallible;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use models::UserProfile;
use serde::Deserialize;
use serde_json::Value;
use service::session::is_expired;
use service::ProxyError;
use tracing::{info, warn};

use crate::errors::JsonApiError;
use crate::session::SessionStatus;
use crate::state::ServerState;

pub const TOKEN_COOKIE: &str = "token";
pub const USER_COOKIE: &str = "user";

fn parse_bearer(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Bearer token from `Authorization: Bearer <t>` (scheme matched without
/// case), falling back to the `token` cookie when the header is absent or
/// not a bearer credential.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer);
    if from_header.is_some() {
        return from_header;
    }

    // Cookie 回退
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Optional bearer token; handlers decide whether it is required.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> { self.0.as_deref() }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(token_from_headers(&parts.headers)))
    }
}

fn session_cookie(name: &'static str, value: String, http_only: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(http_only);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(USER_COOKIE).path("/"))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile the browser sent back in the `user` cookie.
fn user_from_cookie(jar: &CookieJar) -> Option<UserProfile> {
    let raw = URL_SAFE_NO_PAD.decode(jar.get(USER_COOKIE)?.value()).ok()?;
    serde_json::from_slice(&raw).ok()
}

fn login_failure(e: ProxyError, login_path: &str) -> JsonApiError {
    match e {
        // 登录请求不带 token，上游 401 即账号或密码错误
        ProxyError::MissingCredentials | ProxyError::SessionExpired => JsonApiError::new(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            Some("email or password is incorrect".into()),
        ),
        ProxyError::Upstream { status: 401 | 403, message } => {
            JsonApiError::new(StatusCode::UNAUTHORIZED, "invalid_credentials", Some(message))
        }
        other => JsonApiError::from_proxy(other, login_path),
    }
}

fn find_str<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a str> {
    let scopes = [Some(body), body.get("data")];
    scopes
        .into_iter()
        .flatten()
        .find_map(|scope| keys.iter().find_map(|k| scope.get(*k).and_then(Value::as_str)))
        .filter(|s| !s.is_empty())
}

fn find_user(body: &Value) -> UserProfile {
    let raw = body
        .get("user")
        .or_else(|| body.get("data").and_then(|d| d.get("user")))
        .cloned()
        .unwrap_or(Value::Null);
    serde_json::from_value(raw).unwrap_or_default()
}

#[utoipa::path(
    post, path = "/api/auth/login", tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged In; token and user cookies set"),
        (status = 400, description = "Validation Error"),
        (status = 401, description = "Invalid Credentials"),
        (status = 502, description = "Upstream Unavailable")
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    previous: BearerToken,
    jar: CookieJar,
    Json(input): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), JsonApiError> {
    models::user::validate_email(&input.email)
        .map_err(|e| JsonApiError::bad_request(e.to_string()))?;
    if input.password.is_empty() {
        return Err(JsonApiError::bad_request("password is required"));
    }

    let credentials =
        serde_json::json!({ "email": input.email.trim(), "password": input.password });
    let body = state
        .upstream
        .post_json("auth/login", &credentials, None)
        .await
        .map_err(|e| login_failure(e, state.login_path()))?;

    let token = find_str(&body, &["token", "accessToken", "access_token"])
        .map(str::to_string)
        .ok_or_else(|| {
            let detail = Some("login response carried no token".into());
            JsonApiError::new(StatusCode::BAD_GATEWAY, "upstream_error", detail)
        })?;
    let user = find_user(&body);

    if let Some(old) = previous.0.filter(|old| *old != token) {
        if let Err(e) = state.session.end(&old).await {
            warn!(error = %e, "failed to clear previous admin session");
        }
    }
    if let Err(e) = state.session.start(&token, &user).await {
        warn!(error = %e, "failed to persist admin session");
    }

    let user_json = serde_json::to_string(&user).unwrap_or_else(|_| "{}".into());
    let jar = jar
        .add(session_cookie(TOKEN_COOKIE, token, true))
        .add(session_cookie(USER_COOKIE, URL_SAFE_NO_PAD.encode(user_json), false));
    info!(event = "login", email = ?user.email, "admin logged in");
    Ok((jar, Json(body)))
}

#[utoipa::path(
    post, path = "/api/auth/logout", tag = "auth",
    responses((status = 303, description = "Cookies cleared, redirect to login"))
)]
pub async fn logout(
    State(state): State<ServerState>,
    token: BearerToken,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    // 只结束调用方自己的会话
    if let Some(token) = token.as_deref() {
        if let Err(e) = state.session.end(token).await {
            warn!(error = %e, "failed to clear admin session");
        }
    }
    (clear_session_cookies(jar), Redirect::to(state.login_path()))
}

#[utoipa::path(
    get, path = "/api/auth/session", tag = "auth",
    responses((status = 200, description = "Caller's session status; cookies cleared when expired"))
)]
pub async fn session_status(
    State(state): State<ServerState>,
    token: BearerToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionStatus>), JsonApiError> {
    let cookie_user = user_from_cookie(&jar);
    let status = state
        .session
        .status(token.as_deref(), cookie_user)
        .await
        .map_err(|e| {
            let detail = Some(e.to_string());
            JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "session_error", detail)
        })?;
    if !status.expired {
        return Ok((jar, Json(status)));
    }
    if let Some(token) = token.as_deref() {
        if let Err(e) = state.session.end(token).await {
            warn!(error = %e, "failed to clear expired admin session");
        }
    }
    Ok((clear_session_cookies(jar), Json(status)))
}

/// Paths that never look at the bearer token.
fn is_exempt(method: &Method, path: &str) -> bool {
    method == Method::OPTIONS
        || !path.starts_with("/api/")
        || path.starts_with("/api/auth/")
        || (method == Method::POST && path == "/api/contact-messages")
}

/// 中间件：携带的 token 已过期或无法解析时返回 401 并清除 cookie；
/// 未携带 token 的请求放行，由具体 handler 决定是否需要凭证
pub async fn require_live_session(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_exempt(req.method(), &path) {
        return next.run(req).await;
    }
    let Some(token) = token_from_headers(req.headers()) else {
        return next.run(req).await;
    };
    if is_expired(Some(&token), chrono::Utc::now().timestamp()) {
        warn!(path = %path, "bearer token expired or undecodable");
        service::observability::SESSIONS_EXPIRED_TOTAL.inc();
        return JsonApiError::session_expired(state.login_path()).into_response();
    }
    next.run(req).await
}
