// Filesystem ProposalSource Implementation

use crate::json::{read_json, read_json_or_default};
use async_trait::async_trait;
use fip_core::domain::{AddressRegistry, PermissionsConfig, ProposalDescription, ProposalsConfig};
use fip_core::error::{AppError, Result};
use fip_core::port::ProposalSource;
use std::path::{Path, PathBuf};
use tracing::info;

/// Relative locations of the JSON inputs under the repository root
#[derive(Debug, Clone)]
pub struct Layout {
    pub descriptions_dir: PathBuf,
    pub proposals_config: PathBuf,
    pub addresses: PathBuf,
    pub permissions: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            descriptions_dir: PathBuf::from("proposals/description"),
            proposals_config: PathBuf::from("proposals/proposals_config.json"),
            addresses: PathBuf::from("protocol-configuration/mainnet_addresses.json"),
            permissions: PathBuf::from("protocol-configuration/permissions.json"),
        }
    }
}

pub struct FsProposalSource {
    root: PathBuf,
    layout: Layout,
}

impl FsProposalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_layout(root, Layout::default())
    }

    pub fn with_layout(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn description_path(&self, name: &str) -> Result<PathBuf> {
        // names come from the CLI; keep them inside the descriptions dir
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(AppError::Validation(format!("invalid proposal name: {:?}", name)));
        }
        Ok(self
            .root
            .join(&self.layout.descriptions_dir)
            .join(format!("{}.json", name)))
    }
}

#[async_trait]
impl ProposalSource for FsProposalSource {
    async fn description(&self, name: &str) -> Result<ProposalDescription> {
        let path = self.description_path(name)?;
        read_json(&path).await.map_err(|e| match e {
            AppError::NotFound(_) => {
                AppError::NotFound(format!("proposal description {} ({})", name, path.display()))
            }
            other => other,
        })
    }

    async fn proposals_config(&self) -> Result<ProposalsConfig> {
        let config: ProposalsConfig =
            read_json(&self.root.join(&self.layout.proposals_config)).await?;
        info!(proposals = config.len(), "Loaded proposals config");
        Ok(config)
    }

    async fn registry(&self) -> Result<AddressRegistry> {
        let registry: AddressRegistry = read_json(&self.root.join(&self.layout.addresses)).await?;
        info!(contracts = registry.len(), "Loaded address registry");
        Ok(registry)
    }

    async fn permissions(&self) -> Result<PermissionsConfig> {
        read_json_or_default(&self.root.join(&self.layout.permissions)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fip_core::domain::{ContractCategory, ProposalCategory};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "proposals/description/fip_100.json",
            r#"{
                "title": "FIP-100: Pause PSM",
                "commands": [{
                    "target": "daiPSM",
                    "values": "0",
                    "method": "pause()",
                    "arguments": [],
                    "description": "Pause the DAI PSM"
                }],
                "description": "Pauses minting."
            }"#,
        );
        write(
            dir.path(),
            "proposals/proposals_config.json",
            r#"{
                "fip_100": {
                    "deploy": false,
                    "category": "OA",
                    "totalValue": 0,
                    "proposalId": "",
                    "affectedContractSignoff": ["daiPSM"],
                    "deprecatedContractSignoff": []
                }
            }"#,
        );
        write(
            dir.path(),
            "protocol-configuration/mainnet_addresses.json",
            r#"{
                "daiPSM": {
                    "address": "0x2A188F9EB761F70ECEa083bA6c2A40145078dfc2",
                    "artifactName": "PegStabilityModule",
                    "category": "Peg"
                }
            }"#,
        );
        dir
    }

    #[tokio::test]
    async fn test_loads_all_inputs() {
        let dir = fixture();
        let source = FsProposalSource::new(dir.path());

        let desc = source.description("fip_100").await.unwrap();
        assert_eq!(desc.commands.len(), 1);
        assert_eq!(desc.commands[0].target, "daiPSM");

        let config = source.proposals_config().await.unwrap();
        assert_eq!(config["fip_100"].category, ProposalCategory::Oa);

        let registry = source.registry().await.unwrap();
        assert_eq!(registry.get("daiPSM").unwrap().category, ContractCategory::Peg);

        // permissions.json is optional
        assert!(source.permissions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_description_is_not_found() {
        let dir = fixture();
        let source = FsProposalSource::new(dir.path());
        let err = source.description("fip_404").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("fip_404")));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = fixture();
        let source = FsProposalSource::new(dir.path());
        let err = source.description("../proposals_config").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_names_the_file() {
        let dir = fixture();
        write(dir.path(), "protocol-configuration/permissions.json", "{ not json");
        let source = FsProposalSource::new(dir.path());
        let err = source.permissions().await.unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("permissions.json")));
    }
}
