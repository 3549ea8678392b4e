// Construct Proposal Use Case
//
// Turns a declarative description into resolved, encoded actions.

use crate::domain::abi::{self, MethodSignature};
use crate::domain::template::{render_args, render_str};
use crate::domain::{AddressRegistry, DomainError, ProposalDescription, MAX_ACTIONS};
use crate::error::Result;
use ethers_core::types::{Address, Bytes, U256};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// One encoded governance action
#[derive(Debug, Clone, Serialize)]
pub struct ProposalAction {
    pub target_name: String,
    pub target: Address,
    pub value: U256,
    /// Canonical method signature
    pub signature: String,
    /// Selector followed by the encoded arguments
    pub calldata: Bytes,
    /// Encoded arguments without the selector
    pub params: Bytes,
    pub description: String,
}

/// Proposal ready for calldata assembly or simulation
#[derive(Debug, Clone, Serialize)]
pub struct ConstructedProposal {
    pub title: String,
    /// On-chain description (`title\ndescription`)
    pub description: String,
    pub actions: Vec<ProposalAction>,
}

impl ConstructedProposal {
    pub fn targets(&self) -> Vec<Address> {
        self.actions.iter().map(|a| a.target).collect()
    }

    pub fn values(&self) -> Vec<U256> {
        self.actions.iter().map(|a| a.value).collect()
    }

    pub fn signatures(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.signature.clone()).collect()
    }

    pub fn calldatas(&self) -> Vec<Bytes> {
        self.actions.iter().map(|a| a.calldata.clone()).collect()
    }

    /// Sum of wei attached to all actions
    pub fn total_value(&self) -> U256 {
        self.actions
            .iter()
            .fold(U256::zero(), |acc, a| acc.saturating_add(a.value))
    }
}

/// Encoded single call (shared by commands and fork actions)
#[derive(Debug, Clone)]
pub struct EncodedCall {
    pub target: Address,
    pub value: U256,
    pub method: MethodSignature,
    pub calldata: Bytes,
    pub params: Bytes,
}

/// Resolve a target: registry name, `{placeholder}` or literal address
pub fn resolve_target(target: &str, registry: &AddressRegistry) -> Result<Address> {
    let rendered = render_str(target.trim(), registry)?;
    Ok(registry.resolve(&rendered)?)
}

/// Template, tokenize and encode `target.method(arguments)`
pub fn encode_call(
    target: &str,
    values: &Value,
    method: &str,
    arguments: &[Value],
    registry: &AddressRegistry,
) -> Result<EncodedCall> {
    let target = resolve_target(target, registry)?;
    let value = abi::wei(values)?;
    let method = MethodSignature::parse(method)?;
    let args = render_args(arguments, registry)?;

    let params = method.encode_params(&args)?;
    let mut calldata = Vec::with_capacity(4 + params.len());
    calldata.extend_from_slice(&method.selector());
    calldata.extend_from_slice(&params);

    Ok(EncodedCall {
        target,
        value,
        method,
        calldata: calldata.into(),
        params,
    })
}

/// Build the ordered action list for a proposal description
///
/// # Errors
/// - DomainError::TooManyActions if the proposal exceeds `MAX_ACTIONS`
/// - DomainError::UnknownContract / UnknownPlaceholder for unresolved names
/// - DomainError::InvalidArgument / ArgumentCount for mismatched arguments
pub fn construct_proposal(
    description: &ProposalDescription,
    registry: &AddressRegistry,
) -> Result<ConstructedProposal> {
    if description.commands.len() > MAX_ACTIONS {
        return Err(DomainError::TooManyActions {
            count: description.commands.len(),
            max: MAX_ACTIONS,
        }
        .into());
    }

    let mut actions = Vec::with_capacity(description.commands.len());
    for (index, command) in description.commands.iter().enumerate() {
        let call = encode_call(
            &command.target,
            &command.values,
            &command.method,
            &command.arguments,
            registry,
        )?;

        info!(
            step = index + 1,
            target = %command.target,
            method = %call.method.canonical(),
            "Adding proposal step: {}",
            command.description
        );
        debug!(calldata = %call.calldata, "Encoded proposal step");

        actions.push(ProposalAction {
            target_name: command.target.clone(),
            target: call.target,
            value: call.value,
            signature: call.method.canonical().to_string(),
            calldata: call.calldata,
            params: call.params,
            description: command.description.clone(),
        });
    }

    Ok(ConstructedProposal {
        title: description.title.clone(),
        description: description.full_description(),
        actions,
    })
}
