// Proposal Source Port (Interface)

use crate::domain::{AddressRegistry, PermissionsConfig, ProposalDescription, ProposalsConfig};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to proposal descriptions and protocol configuration
#[async_trait]
pub trait ProposalSource: Send + Sync {
    /// Load a proposal description by name
    async fn description(&self, name: &str) -> Result<ProposalDescription>;

    /// Load the proposal config map
    async fn proposals_config(&self) -> Result<ProposalsConfig>;

    /// Load the named contract addresses
    async fn registry(&self) -> Result<AddressRegistry>;

    /// Load the expected role holders
    async fn permissions(&self) -> Result<PermissionsConfig>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    /// In-memory proposal source
    #[derive(Default, Clone)]
    pub struct InMemorySource {
        pub descriptions: HashMap<String, ProposalDescription>,
        pub config: ProposalsConfig,
        pub registry: AddressRegistry,
        pub permissions: PermissionsConfig,
    }

    impl InMemorySource {
        pub fn new(registry: AddressRegistry) -> Self {
            Self {
                registry,
                ..Default::default()
            }
        }

        pub fn with_proposal(
            mut self,
            name: impl Into<String>,
            config: crate::domain::ProposalConfig,
            description: ProposalDescription,
        ) -> Self {
            let name = name.into();
            self.config.insert(name.clone(), config);
            self.descriptions.insert(name, description);
            self
        }
    }

    #[async_trait]
    impl ProposalSource for InMemorySource {
        async fn description(&self, name: &str) -> Result<ProposalDescription> {
            self.descriptions
                .get(name)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("proposal description {}", name)))
        }

        async fn proposals_config(&self) -> Result<ProposalsConfig> {
            Ok(self.config.clone())
        }

        async fn registry(&self) -> Result<AddressRegistry> {
            Ok(self.registry.clone())
        }

        async fn permissions(&self) -> Result<PermissionsConfig> {
            Ok(self.permissions.clone())
        }
    }
}
