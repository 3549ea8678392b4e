//! Layered settings: defaults, then `fip.toml` (or `--config`), then `FIP_*` env vars

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use fip_core::application::GovernanceConfig;
use fip_core::domain::ProposalCategory;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "fip.toml";
const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
/// First Hardhat/Anvil dev account
const DEFAULT_DEPLOYER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Timelock delays used for offline calldata (seconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimelockDelays {
    pub oa: u64,
    pub tc: u64,
}

impl Default for TimelockDelays {
    fn default() -> Self {
        Self {
            oa: 4 * 24 * 60 * 60,
            tc: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rpc_url: String,
    /// Repository root holding `proposals/` and `protocol-configuration/`
    pub root: String,
    /// Hardhat artifacts, relative to `root` unless absolute
    pub artifacts_dir: String,
    pub deployer: String,
    pub governance: GovernanceConfig,
    pub timelock_delay: TimelockDelays,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            root: ".".to_string(),
            artifacts_dir: "artifacts".to_string(),
            deployer: DEFAULT_DEPLOYER.to_string(),
            governance: GovernanceConfig::default(),
            timelock_delay: TimelockDelays::default(),
        }
    }
}

impl Settings {
    /// Load settings; an explicit `path` must exist, the default file is optional
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(expand(&path.to_string_lossy())).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("FIP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn root(&self) -> PathBuf {
        expand(&self.root)
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.root().join(expand(&self.artifacts_dir))
    }

    pub fn timelock_delay(&self, category: ProposalCategory) -> u64 {
        match category {
            ProposalCategory::Tc => self.timelock_delay.tc,
            _ => self.timelock_delay.oa,
        }
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
