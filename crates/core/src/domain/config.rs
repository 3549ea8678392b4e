// Proposal Configuration Domain Model

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// How a proposal reaches the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalCategory {
    /// Governor vote, queued through the DAO timelock
    #[serde(rename = "DAO")]
    Dao,
    /// Optimistic approval timelock
    #[serde(rename = "OA")]
    Oa,
    /// Tribal council timelock
    #[serde(rename = "TC")]
    Tc,
    /// Deployment/setup only, no governance action
    None,
}

impl ProposalCategory {
    pub fn is_timelock(&self) -> bool {
        matches!(self, ProposalCategory::Oa | ProposalCategory::Tc)
    }
}

impl fmt::Display for ProposalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalCategory::Dao => write!(f, "DAO"),
            ProposalCategory::Oa => write!(f, "OA"),
            ProposalCategory::Tc => write!(f, "TC"),
            ProposalCategory::None => write!(f, "NONE"),
        }
    }
}

/// Per-proposal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalConfig {
    /// Run the deploy step before simulating
    #[serde(default)]
    pub deploy: bool,
    pub category: ProposalCategory,
    /// Total wei carried by the proposal's commands (decimal string)
    #[serde(default = "zero", deserialize_with = "number_or_string")]
    pub total_value: String,
    /// On-chain governor proposal id, when already proposed
    #[serde(default, deserialize_with = "blank_as_none")]
    pub proposal_id: Option<String>,
    #[serde(default)]
    pub affected_contract_signoff: Vec<String>,
    #[serde(default)]
    pub deprecated_contract_signoff: Vec<String>,
}

fn zero() -> String {
    "0".to_string()
}

// Config files write `totalValue` both as `0` and `"0"`
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a number or numeric string, got {}",
            other
        ))),
    }
}

// `"proposalId": ""` means not proposed yet
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|id| !id.trim().is_empty()))
}

/// Ordered proposal name -> config map
pub type ProposalsConfig = IndexMap<String, ProposalConfig>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_config_map_keeps_order() {
        let config: ProposalsConfig = serde_json::from_value(json!({
            "fip_82": {
                "deploy": false,
                "category": "DAO",
                "totalValue": "0",
                "affectedContractSignoff": ["tribalChief"],
                "deprecatedContractSignoff": []
            },
            "oa_fuse_pause": { "category": "OA" },
            "deploy_only": { "category": "None", "deploy": true }
        }))
        .unwrap();

        let names: Vec<_> = config.keys().cloned().collect();
        assert_eq!(names, vec!["fip_82", "oa_fuse_pause", "deploy_only"]);
        assert_eq!(config["oa_fuse_pause"].total_value, "0");
        assert!(config["oa_fuse_pause"].category.is_timelock());
        assert_eq!(config["deploy_only"].category, ProposalCategory::None);
    }

    #[test]
    fn test_numeric_total_value_and_blank_proposal_id() {
        let config: ProposalConfig = serde_json::from_value(json!({
            "category": "DAO",
            "totalValue": 0,
            "proposalId": ""
        }))
        .unwrap();
        assert_eq!(config.total_value, "0");
        assert_eq!(config.proposal_id, None);

        let config: ProposalConfig = serde_json::from_value(json!({
            "category": "DAO",
            "proposalId": "1234"
        }))
        .unwrap();
        assert_eq!(config.proposal_id.as_deref(), Some("1234"));

        assert!(serde_json::from_value::<ProposalConfig>(json!({
            "category": "DAO",
            "totalValue": [1]
        }))
        .is_err());
    }
}
