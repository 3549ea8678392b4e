// Artifact Store Port (Interface)

use crate::error::Result;
use async_trait::async_trait;
use ethers_core::abi::Abi;
use ethers_core::types::Bytes;
use serde::Deserialize;

/// Compiled contract: ABI plus creation bytecode
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
}

/// Lookup of compiled contract artifacts by contract name
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn artifact(&self, name: &str) -> Result<Artifact>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct InMemoryArtifacts {
        artifacts: HashMap<String, Artifact>,
    }

    impl InMemoryArtifacts {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, artifact: Artifact) {
            self.artifacts.insert(artifact.contract_name.clone(), artifact);
        }
    }

    #[async_trait]
    impl ArtifactStore for InMemoryArtifacts {
        async fn artifact(&self, name: &str) -> Result<Artifact> {
            self.artifacts
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("artifact {}", name)))
        }
    }
}
