//! Back-office sessions mirrored by the server.
//!
//! Every admin login gets its own slot in the session store (namespaced by
//! a fresh session id) and its own expiry guard, keyed by the bearer token
//! the browser carries. Requests only ever see the session that matches
//! their own token.

use std::collections::HashMap;
use std::sync::Arc;

use configs::SessionConfig;
use models::UserProfile;
use serde::Serialize;
use service::errors::SessionError;
use service::session::{
    is_expired, ScopedSessionStore, SessionContext, SessionGuard, SessionStore,
};
use service::ViewScope;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub expired: bool,
    pub user: Option<UserProfile>,
    pub login_path: String,
}

struct ArmedGuard {
    context: SessionContext,
    guard: Arc<SessionGuard>,
    scope: ViewScope,
}

impl ArmedGuard {
    async fn disarm(self) -> Result<(), SessionError> {
        self.scope.teardown();
        self.context.clear().await
    }
}

pub struct AdminSession {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    root: ViewScope,
    // bearer token -> 该 token 的存储与守卫
    sessions: Mutex<HashMap<String, ArmedGuard>>,
}

impl AdminSession {
    /// `root` is the server's lifetime; guards are torn down with it.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig, root: ViewScope) -> Self {
        Self { store, config, root, sessions: Mutex::new(HashMap::new()) }
    }

    pub fn login_path(&self) -> &str { &self.config.login_path }

    /// Store credentials for `token` and start a guard for them. A repeated
    /// login with the same token replaces its previous slot.
    pub async fn start(&self, token: &str, user: &UserProfile) -> Result<(), SessionError> {
        let sid = Uuid::new_v4().to_string();
        let scoped = ScopedSessionStore::new(self.store.clone(), sid.clone());
        let context = SessionContext::new(Arc::new(scoped));
        context.set_session(token, user).await?;

        let scope = self.root.child();
        let guard = Arc::new(SessionGuard::from_config(context.clone(), &self.config));
        guard.clone().spawn(scope.clone());

        let (previous, pruned) = {
            let mut sessions = self.sessions.lock().await;
            let before = sessions.len();
            // 守卫已触发的会话存储已被清空，这里只移除登记
            sessions.retain(|_, armed| !armed.guard.is_expired());
            let pruned = before - sessions.len();
            (sessions.insert(token.to_string(), ArmedGuard { context, guard, scope }), pruned)
        };
        if pruned > 0 {
            debug!(pruned, "expired sessions dropped");
        }
        if let Some(prev) = previous {
            prev.disarm().await?;
        }
        info!(event = "session_started", %sid, user = ?user.email, "admin session stored");
        Ok(())
    }

    /// End the session belonging to `token`; other sessions are untouched.
    /// Returns whether a session was found.
    pub async fn end(&self, token: &str) -> Result<bool, SessionError> {
        let armed = self.sessions.lock().await.remove(token);
        match armed {
            Some(armed) => {
                armed.disarm().await?;
                info!(event = "session_ended", "admin session cleared");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn active_count(&self) -> usize {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|armed| !armed.guard.is_expired())
            .count()
    }

    /// Status of the caller's session. `cookie_user` is the profile the
    /// browser sent back, used when the server holds no mirror for the token
    /// (e.g. after a restart).
    pub async fn status(
        &self,
        token: Option<&str>,
        cookie_user: Option<UserProfile>,
    ) -> Result<SessionStatus, SessionError> {
        let login_path = self.config.login_path.clone();
        let signed_out = |expired| SessionStatus {
            authenticated: false,
            expired,
            user: None,
            login_path: login_path.clone(),
        };
        let Some(token) = token else {
            return Ok(signed_out(false));
        };

        let mirrored = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(token)
                .map(|armed| (armed.guard.is_expired(), armed.context.clone()))
        };
        let guard_fired = mirrored.as_ref().is_some_and(|(fired, _)| *fired);
        let expired = guard_fired || is_expired(Some(token), chrono::Utc::now().timestamp());
        if expired {
            return Ok(signed_out(true));
        }

        let user = match mirrored {
            Some((_, context)) => context.user().await?.or(cookie_user),
            None => cookie_user,
        };
        Ok(SessionStatus { authenticated: true, expired: false, user, login_path })
    }
}
