// Proposal Description Domain Model

use crate::domain::registry::ContractCategory;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of commands a single proposal may carry
pub const MAX_ACTIONS: usize = 50;

/// A single governance action: `target.method(arguments)` with `values` wei attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Registry name (or literal address) of the contract to call
    pub target: String,
    /// Wei sent with the call (decimal or hex string)
    #[serde(default = "zero_value")]
    pub values: Value,
    /// Human-readable signature, e.g. `grantMinter(address)`
    pub method: String,
    /// JSON arguments; strings may contain `{contract}` placeholders
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub description: String,
}

/// Contract deployed before the proposal runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployStep {
    /// Registry name the deployed contract is stored under
    pub name: String,
    /// Artifact (contract) name to load bytecode and ABI from
    pub artifact: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default = "default_deploy_category")]
    pub category: ContractCategory,
}

/// Impersonated transaction sent on a fork during setup or teardown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkAction {
    /// Sender (registry name, placeholder or literal address)
    pub from: String,
    pub target: String,
    #[serde(default = "zero_value")]
    pub values: Value,
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default)]
    pub description: String,
}

/// Post-execution assertion: `target.method(arguments)` must return `expected`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub target: String,
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Output types, e.g. `["uint256"]`
    pub returns: Vec<String>,
    /// Expected outputs, one per return type
    pub expected: Vec<Value>,
    #[serde(default)]
    pub description: String,
}

/// Declarative proposal: governance commands plus the fork lifecycle hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDescription {
    pub title: String,
    #[serde(default)]
    pub commands: Vec<Command>,
    pub description: String,

    #[serde(default)]
    pub deploy: Vec<DeployStep>,
    #[serde(default)]
    pub setup: Vec<ForkAction>,
    #[serde(default)]
    pub teardown: Vec<ForkAction>,
    #[serde(default)]
    pub checks: Vec<Check>,
}

impl ProposalDescription {
    /// Description submitted on-chain: title, newline, body
    pub fn full_description(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }
}

fn zero_value() -> Value {
    Value::String("0".to_string())
}

fn default_deploy_category() -> ContractCategory {
    ContractCategory::Tbd
}
