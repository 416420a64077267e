use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use common::types::Health;
use models::forms::{
    AchievementForm, BrandForm, ClientForm, FeatureForm, ServiceForm, SubServiceForm, WorkForm,
};
use models::{Achievement, Brand, Client, ContactMessage, Service};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::openapi;
use crate::state::ServerState;

pub mod auth;
pub mod multipart;
pub mod resources;

use resources::{
    create, create_nested, get_one, list, remove, remove_nested, submit_contact_message, update,
    update_nested,
};

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "OK"))
)]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

fn api_routes() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session_status))
        .route("/api/brands", get(list::<Brand>).post(create::<BrandForm>))
        .route(
            "/api/brands/:id",
            get(get_one::<Brand>).put(update::<BrandForm>).delete(remove::<Brand>),
        )
        .route("/api/clients", get(list::<Client>).post(create::<ClientForm>))
        .route(
            "/api/clients/:id",
            get(get_one::<Client>).put(update::<ClientForm>).delete(remove::<Client>),
        )
        .route("/api/services", get(list::<Service>).post(create::<ServiceForm>))
        .route(
            "/api/services/:id",
            get(get_one::<Service>).put(update::<ServiceForm>).delete(remove::<Service>),
        )
        .route("/api/achievements", get(list::<Achievement>).post(create::<AchievementForm>))
        .route(
            "/api/achievements/:id",
            get(get_one::<Achievement>)
                .put(update::<AchievementForm>)
                .delete(remove::<Achievement>),
        )
        .route(
            "/api/contact-messages",
            get(list::<ContactMessage>).post(submit_contact_message),
        )
        .route(
            "/api/contact-messages/:id",
            get(get_one::<ContactMessage>).delete(remove::<ContactMessage>),
        )
        .route("/api/services/:id/features", post(create_nested::<FeatureForm>))
        .route(
            "/api/services/:id/features/:feature_id",
            put(update_nested::<FeatureForm>).delete(remove_nested::<FeatureForm>),
        )
        .route("/api/services/:id/sub-services", post(create_nested::<SubServiceForm>))
        .route(
            "/api/services/:id/sub-services/:sub_service_id",
            put(update_nested::<SubServiceForm>).delete(remove_nested::<SubServiceForm>),
        )
        .route("/api/sub-services/:id/works", post(create_nested::<WorkForm>))
        .route(
            "/api/sub-services/:id/works/:work_id",
            put(update_nested::<WorkForm>).delete(remove_nested::<WorkForm>),
        )
}

/// Build the full application router: health, docs, the `/api` proxy and
/// the static site.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let static_root = state.config.server.static_dir.clone();
    let index = format!("{}/index.html", static_root.trim_end_matches('/'));
    let static_dir = ServeDir::new(&static_root).fallback(ServeFile::new(index));
    let max_upload = state.config.server.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        // 同一层级的路径参数必须同名（matchit 限制），父 id 统一为 :id
        .merge(api_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_live_session))
        .fallback_service(static_dir)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
