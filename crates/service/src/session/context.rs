use std::sync::Arc;

use models::UserProfile;

use super::store::{SessionStore, TOKEN_KEY, USER_KEY};
use super::token::is_expired;
use crate::errors::SessionError;

/// The only way the rest of the application touches session storage.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self { Self { store } }

    pub async fn get_token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).await.filter(|t| !t.is_empty())
    }

    /// Stored profile; `Ok(None)` when nobody is logged in.
    pub async fn user(&self) -> Result<Option<UserProfile>, SessionError> {
        match self.store.get(USER_KEY).await {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| SessionError::Profile(e.to_string())),
        }
    }

    pub async fn set_session(&self, token: &str, user: &UserProfile) -> Result<(), SessionError> {
        let profile =
            serde_json::to_string(user).map_err(|e| SessionError::Profile(e.to_string()))?;
        self.store.set(TOKEN_KEY, token.to_string()).await?;
        self.store.set(USER_KEY, profile).await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(TOKEN_KEY).await?;
        self.store.remove(USER_KEY).await?;
        Ok(())
    }

    pub async fn is_expired_at(&self, now_secs: i64) -> bool {
        is_expired(self.get_token().await.as_deref(), now_secs)
    }
}
