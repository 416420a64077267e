use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::context::SessionContext;
use crate::observability::SESSIONS_EXPIRED_TOTAL;
use crate::scope::ViewScope;

/// Watches the stored token and ends the session once it expires.
///
/// The `expired` flag starts false and only ever flips to true; observers
/// subscribe through a `watch` channel.
pub struct SessionGuard {
    context: SessionContext,
    login_path: String,
    poll_interval: Duration,
    expired: watch::Sender<bool>,
}

impl SessionGuard {
    pub fn new(
        context: SessionContext,
        login_path: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        let (expired, _) = watch::channel(false);
        Self { context, login_path: login_path.into(), poll_interval, expired }
    }

    pub fn from_config(context: SessionContext, cfg: &configs::SessionConfig) -> Self {
        Self::new(context, cfg.login_path.clone(), Duration::from_secs(cfg.poll_interval_secs))
    }

    pub fn login_path(&self) -> &str { &self.login_path }

    pub fn is_expired(&self) -> bool { *self.expired.borrow() }

    pub fn subscribe(&self) -> watch::Receiver<bool> { self.expired.subscribe() }

    /// Check against an explicit clock. Returns the login path when the
    /// session has just been (or already was) ended.
    pub async fn check_at(&self, now_secs: i64) -> Option<String> {
        if self.is_expired() {
            return Some(self.login_path.clone());
        }
        if self.context.is_expired_at(now_secs).await {
            self.force_logout().await;
            return Some(self.login_path.clone());
        }
        None
    }

    pub async fn check_now(&self) -> Option<String> {
        self.check_at(chrono::Utc::now().timestamp()).await
    }

    /// Clear credentials and raise the flag.
    pub async fn force_logout(&self) {
        if let Err(e) = self.context.clear().await {
            warn!(error = %e, "failed to clear session storage");
        }
        let was_expired = self.expired.send_replace(true);
        if !was_expired {
            SESSIONS_EXPIRED_TOTAL.inc();
            info!(event = "session_expired", login_path = %self.login_path, "session ended");
        }
    }

    /// Poll immediately, then every `poll_interval`, until the session ends
    /// or `scope` is torn down.
    pub fn spawn(self: Arc<Self>, scope: ViewScope) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = scope.cancelled() => break,
                    _ = ticker.tick() => {
                        if scope.is_torn_down() {
                            break;
                        }
                        if self.check_now().await.is_some() {
                            break;
                        }
                    }
                }
            }
        })
    }
}
