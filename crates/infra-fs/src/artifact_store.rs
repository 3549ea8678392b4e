// Filesystem ArtifactStore Implementation
//
// Hardhat layout: artifacts/contracts/<path>/<Name>.sol/<Name>.json, next to
// <Name>.dbg.json debug files that are skipped.

use crate::json::read_json;
use async_trait::async_trait;
use fip_core::error::{AppError, Result};
use fip_core::port::{Artifact, ArtifactStore};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every `<name>.json` under the root, depth first, sorted per directory
    async fn find(&self, name: &str) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let file_name = format!("{}.json", name);

        tokio::task::spawn_blocking(move || walk(&root, &file_name))
            .await
            .map_err(|e| AppError::InvalidState(format!("artifact lookup aborted: {}", e)))?
    }
}

fn walk(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::NotFound(format!(
            "artifacts directory {}",
            root.display()
        )));
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name() == file_name {
            matches.push(entry.into_path());
        }
    }
    Ok(matches)
}

fn describe(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn artifact(&self, name: &str) -> Result<Artifact> {
        let matches = self.find(name).await?;
        let path: &Path = match matches.as_slice() {
            [] => {
                return Err(AppError::NotFound(format!(
                    "artifact {} under {}",
                    name,
                    self.root.display()
                )))
            }
            [only] => only,
            [first, ..] => {
                warn!(
                    artifact = %name,
                    candidates = %describe(&matches),
                    "Multiple artifacts share a name, using the first"
                );
                first
            }
        };

        debug!(artifact = %name, path = %path.display(), "Loading artifact");
        read_json(path).await
    }
}
