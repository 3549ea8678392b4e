// Proposal Config Signoff
//
// Lints a proposal config against its description and the registry before
// anything is sent on-chain. All findings are collected.

use crate::domain::abi::wei;
use crate::domain::{
    AddressRegistry, ContractCategory, ProposalCategory, ProposalConfig, ProposalDescription,
    MAX_ACTIONS,
};
use ethers_core::types::U256;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignoffFinding {
    /// A command target or deployed contract missing from `affectedContractSignoff`
    MissingAffectedSignoff { contract: String },
    /// A `deprecatedContractSignoff` entry not categorised as deprecated
    NotDeprecated {
        contract: String,
        category: Option<ContractCategory>,
    },
    /// A contract deployed by this proposal is also listed as deprecated
    DeprecatingNewContract { contract: String },
    TotalValueMismatch { configured: String, actual: String },
    InvalidValue { field: String, reason: String },
    NoCommands { category: ProposalCategory },
    TooManyActions { count: usize },
}

impl fmt::Display for SignoffFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignoffFinding::MissingAffectedSignoff { contract } => {
                write!(f, "{} is affected but missing from affectedContractSignoff", contract)
            }
            SignoffFinding::NotDeprecated { contract, category } => match category {
                Some(category) => write!(
                    f,
                    "{} is signed off as deprecated but categorised {}",
                    contract, category
                ),
                None => write!(f, "{} is signed off as deprecated but not in the registry", contract),
            },
            SignoffFinding::DeprecatingNewContract { contract } => {
                write!(f, "{} is deployed by this proposal and cannot be deprecated", contract)
            }
            SignoffFinding::TotalValueMismatch { configured, actual } => write!(
                f,
                "totalValue is {} but commands carry {} wei",
                configured, actual
            ),
            SignoffFinding::InvalidValue { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
            SignoffFinding::NoCommands { category } => {
                write!(f, "{} proposal has no commands", category)
            }
            SignoffFinding::TooManyActions { count } => {
                write!(f, "{} commands exceed the limit of {}", count, MAX_ACTIONS)
            }
        }
    }
}

/// Registry name referenced by a target string (`fei`, `{fei}`); literal addresses have none
fn referenced_name(target: &str) -> Option<&str> {
    let target = target.trim();
    if target.starts_with("0x") {
        return None;
    }
    Some(
        target
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(target),
    )
}

/// Lint one proposal
pub fn check_signoff(
    config: &ProposalConfig,
    description: &ProposalDescription,
    registry: &AddressRegistry,
) -> Vec<SignoffFinding> {
    let mut findings = Vec::new();

    let command_count = description.commands.len();
    if command_count > MAX_ACTIONS {
        findings.push(SignoffFinding::TooManyActions { count: command_count });
    }
    if command_count == 0 && config.category != ProposalCategory::None {
        findings.push(SignoffFinding::NoCommands {
            category: config.category,
        });
    }

    let signed_off: BTreeSet<&str> = config
        .affected_contract_signoff
        .iter()
        .map(String::as_str)
        .collect();
    let deployed: BTreeSet<&str> = description.deploy.iter().map(|d| d.name.as_str()).collect();

    let mut affected: BTreeSet<&str> = description
        .commands
        .iter()
        .filter_map(|c| referenced_name(&c.target))
        .collect();
    affected.extend(deployed.iter().copied());

    for contract in affected {
        if !signed_off.contains(contract) {
            findings.push(SignoffFinding::MissingAffectedSignoff {
                contract: contract.to_string(),
            });
        }
    }

    for contract in &config.deprecated_contract_signoff {
        if deployed.contains(contract.as_str()) {
            findings.push(SignoffFinding::DeprecatingNewContract {
                contract: contract.clone(),
            });
            continue;
        }
        let category = registry.get(contract).map(|r| r.category);
        if category != Some(ContractCategory::Deprecated) {
            findings.push(SignoffFinding::NotDeprecated {
                contract: contract.clone(),
                category,
            });
        }
    }

    let mut actual = U256::zero();
    for command in &description.commands {
        match wei(&command.values) {
            Ok(value) => actual = actual.saturating_add(value),
            Err(e) => findings.push(SignoffFinding::InvalidValue {
                field: format!("values of {}.{}", command.target, command.method),
                reason: e.to_string(),
            }),
        }
    }
    match wei(&serde_json::Value::String(config.total_value.clone())) {
        Ok(configured) if configured != actual => {
            findings.push(SignoffFinding::TotalValueMismatch {
                configured: configured.to_string(),
                actual: actual.to_string(),
            })
        }
        Ok(_) => {}
        Err(e) => findings.push(SignoffFinding::InvalidValue {
            field: "totalValue".to_string(),
            reason: e.to_string(),
        }),
    }

    findings
}
