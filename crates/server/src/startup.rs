use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use configs::AppConfig;
use service::errors::StorageError;
use service::session::FileSessionStore;
use service::{runtime, ViewScope};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes;
use crate::session::AdminSession;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn admin_metrics() -> (StatusCode, String) {
    match service::observability::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}")),
    }
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address: {e}")))
}

/// Assemble state and router; split out so tests can serve the same app.
pub async fn build_app(cfg: AppConfig, shutdown: &ViewScope) -> Result<Router, StartupError> {
    let store_err = |e: StorageError| {
        StartupError::InvalidConfig(format!("session store {}: {e}", cfg.session.store_path))
    };
    let store = FileSessionStore::open(&cfg.session.store_path).await.map_err(store_err)?;
    // 上次运行留下的会话没有守卫，启动时清空
    store.purge().await.map_err(store_err)?;
    let session = AdminSession::new(Arc::new(store), cfg.session.clone(), shutdown.child());
    let state = ServerState::new(cfg, session)?;
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app and serve until `shutdown` is torn down.
pub async fn run(cfg: AppConfig, shutdown: ViewScope) -> anyhow::Result<()> {
    let data_dir = runtime::data_dir_for(&cfg.session.store_path);
    runtime::ensure_env(&cfg.server.static_dir, data_dir).await?;

    if cfg.admin.enabled {
        common::admin_http::spawn_admin_server(&cfg.admin.addr, admin_metrics);
    }

    let addr = bind_addr(&cfg)?;
    info!(
        %addr,
        upstream = %cfg.upstream.base_url,
        static_dir = %cfg.server.static_dir,
        "starting server"
    );
    let app = build_app(cfg, &shutdown).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.cancelled().await })
        .await
        .map_err(|e| {
            error!(error = %e, "server stopped with error");
            anyhow::Error::from(e)
        })?;
    shutdown.teardown();
    info!("server stopped");
    Ok(())
}
