// JSON file loading shared by the adapters

use fip_core::error::{AppError, Result};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

// io::Error and serde_json::Error lose the path; keep it in the message
fn map_io_error(path: &Path, err: std::io::Error) -> AppError {
    match err.kind() {
        ErrorKind::NotFound => AppError::NotFound(format!("{}", path.display())),
        _ => AppError::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        )),
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| map_io_error(path, e))?;
    debug!(path = %path.display(), bytes = raw.len(), "Read JSON file");

    serde_json::from_str(&raw).map_err(|e| {
        AppError::Config(format!("invalid JSON in {}: {}", path.display(), e))
    })
}

/// Like `read_json`, but a missing file yields `T::default()`
pub(crate) async fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match read_json(path).await {
        Err(AppError::NotFound(_)) => {
            debug!(path = %path.display(), "Optional JSON file missing, using default");
            Ok(T::default())
        }
        other => other,
    }
}
