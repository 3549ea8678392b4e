// Address Registry Domain Model

use crate::domain::error::{DomainError, Result};
use ethers_core::types::Address;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Contract category (mirrors the protocol configuration grouping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ContractCategory {
    Core,
    Governance,
    Peg,
    #[serde(rename = "PCV")]
    Pcv,
    Collateralization,
    Oracle,
    Keeper,
    Rewards,
    Fuse,
    External,
    Deprecated,
    #[serde(rename = "TBD")]
    Tbd,
}

impl fmt::Display for ContractCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContractCategory::Core => "Core",
            ContractCategory::Governance => "Governance",
            ContractCategory::Peg => "Peg",
            ContractCategory::Pcv => "PCV",
            ContractCategory::Collateralization => "Collateralization",
            ContractCategory::Oracle => "Oracle",
            ContractCategory::Keeper => "Keeper",
            ContractCategory::Rewards => "Rewards",
            ContractCategory::Fuse => "Fuse",
            ContractCategory::External => "External",
            ContractCategory::Deprecated => "Deprecated",
            ContractCategory::Tbd => "TBD",
        };
        write!(f, "{}", s)
    }
}

/// A named on-chain contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub address: Address,
    pub artifact_name: String,
    pub category: ContractCategory,
}

impl ContractRecord {
    pub fn new(address: Address, artifact_name: impl Into<String>, category: ContractCategory) -> Self {
        Self {
            address,
            artifact_name: artifact_name.into(),
            category,
        }
    }
}

/// Ordered name -> contract map used for target resolution and templating
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressRegistry {
    contracts: IndexMap<String, ContractRecord>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract, replacing any previous entry with the same name
    pub fn insert(&mut self, name: impl Into<String>, record: ContractRecord) {
        let name = name.into();
        if let Some(previous) = self.contracts.get(&name) {
            warn!(
                name = %name,
                previous = ?previous.address,
                new = ?record.address,
                "Overwriting registry entry"
            );
        }
        self.contracts.insert(name, record);
    }

    pub fn get(&self, name: &str) -> Option<&ContractRecord> {
        self.contracts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Look up a contract address by name
    pub fn address_of(&self, name: &str) -> Result<Address> {
        self.contracts
            .get(name)
            .map(|record| record.address)
            .ok_or_else(|| DomainError::UnknownContract(name.to_string()))
    }

    /// Resolve either a registry name or a literal `0x` address
    pub fn resolve(&self, name_or_address: &str) -> Result<Address> {
        if is_address_literal(name_or_address) {
            return name_or_address.parse::<Address>().map_err(|e| {
                DomainError::InvalidArgument {
                    param: "address".to_string(),
                    reason: format!("{}: {}", name_or_address, e),
                }
            });
        }
        self.address_of(name_or_address)
    }

    pub fn names_in(&self, category: ContractCategory) -> Vec<&str> {
        self.contracts
            .iter()
            .filter(|(_, record)| record.category == category)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractRecord)> {
        self.contracts.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

fn is_address_literal(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}
