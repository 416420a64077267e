use std::sync::Arc;

use configs::AppConfig;
use service::UpstreamClient;

use crate::errors::StartupError;
use crate::session::AdminSession;

#[derive(Clone)]
pub struct ServerState {
    pub upstream: UpstreamClient,
    pub config: Arc<AppConfig>,
    pub session: Arc<AdminSession>,
}

impl ServerState {
    pub fn new(config: AppConfig, session: AdminSession) -> Result<Self, StartupError> {
        let upstream = UpstreamClient::from_config(&config.upstream)?;
        Ok(Self { upstream, config: Arc::new(config), session: Arc::new(session) })
    }

    pub fn login_path(&self) -> &str { &self.config.session.login_path }
}
