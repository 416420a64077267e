use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::errors::ProxyError;

/// Lifetime of one view (a form, a guarded page).
///
/// Async work started through [`ViewScope::run`] resolves to
/// `ProxyError::Cancelled` once the scope is torn down, so a late upstream
/// response can never reach state that belongs to a closed view.
#[derive(Clone, Debug, Default)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    pub fn new() -> Self { Self { token: CancellationToken::new() } }

    /// Scope that is torn down together with `self`.
    pub fn child(&self) -> Self { Self { token: self.token.child_token() } }

    pub async fn run<T, F>(&self, fut: F) -> Result<T, ProxyError>
    where
        F: Future<Output = Result<T, ProxyError>>,
    {
        if self.token.is_cancelled() {
            return Err(ProxyError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ProxyError::Cancelled),
            out = fut => {
                // a result that lands after teardown is dropped
                if self.token.is_cancelled() { Err(ProxyError::Cancelled) } else { out }
            }
        }
    }

    pub fn teardown(&self) { self.token.cancel(); }

    pub fn is_torn_down(&self) -> bool { self.token.is_cancelled() }

    pub async fn cancelled(&self) { self.token.cancelled().await }
}
