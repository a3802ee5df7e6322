//! Newline-delimited input files.

use crate::error::{RegistrarError, RegistrarResult};
use crate::proxy_pool::ProxyPool;
use std::path::Path;
use tracing::{error, info};

/// Read a file into trimmed, non-empty lines.
pub async fn read_lines(path: impl AsRef<Path>) -> RegistrarResult<Vec<String>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| RegistrarError::io(path, e))?;
    Ok(parse_lines(&content))
}

/// Load the proxy pool. A missing or unreadable file, or one with no usable
/// lines, leaves the pool empty and every identity connects directly.
pub async fn load_proxy_pool(path: impl AsRef<Path>) -> ProxyPool {
    let path = path.as_ref();
    if !path.exists() {
        info!(
            "No {} file found, using default connection.",
            path.display()
        );
        return ProxyPool::empty();
    }

    match read_lines(path).await {
        Ok(lines) => {
            let pool = ProxyPool::from_lines(&lines);
            info!("Loaded {} of {} proxies", pool.len(), lines.len());
            pool
        }
        Err(e) => {
            error!("Failed to read proxies: {}", e);
            ProxyPool::empty()
        }
    }
}

/// Split text into trimmed, non-empty lines.
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
