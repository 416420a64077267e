//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure expected directories exist; warn on missing optional ones.
///
/// `static_dir` holds public pages and media and is optional; `data_dir`
/// backs the session store and is created when missing.
pub async fn ensure_env(static_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(static_dir).await.is_err() {
        warn!(%static_dir, "static assets directory not found; public pages may 404");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

/// Parent directory of a file path, if it has a non-empty one.
pub fn parent_dir(path: &str) -> Option<&str> {
    Path::new(path)
        .parent()
        .and_then(|p| p.to_str())
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_env_creates_data_dir() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("dge_env_{}", uuid::Uuid::new_v4()));
        let data = root.join("data");
        let data = data.to_str().unwrap();
        ensure_env("/nonexistent-static-dir", data).await?;
        assert!(tokio::fs::metadata(data).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[test]
    fn parent_dir_skips_bare_file_names() {
        assert_eq!(parent_dir("data/session.json"), Some("data"));
        assert_eq!(parent_dir("session.json"), None);
    }
}
