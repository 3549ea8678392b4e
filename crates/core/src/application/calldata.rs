// Proposal Calldata Use Case
//
// Wraps constructed actions into the governance entrypoint calls:
// Governor `propose` for DAO votes, TimelockController batches for OA/TC.

use crate::application::construct::ConstructedProposal;
use crate::domain::abi::{encode_with_selector, selector_of};
use crate::domain::ProposalCategory;
use crate::error::{AppError, Result};
use ethers_core::abi::{self, Token};
use ethers_core::types::{Address, Bytes, H256, U256};
use ethers_core::utils::keccak256;
use serde::Serialize;

pub const GOVERNOR_PROPOSE: &str = "propose(address[],uint256[],bytes[],string)";
pub const GOVERNOR_QUEUE: &str = "queue(address[],uint256[],bytes[],bytes32)";
pub const GOVERNOR_EXECUTE: &str = "execute(address[],uint256[],bytes[],bytes32)";
pub const TIMELOCK_SCHEDULE_BATCH: &str =
    "scheduleBatch(address[],uint256[],bytes[],bytes32,bytes32,uint256)";
pub const TIMELOCK_EXECUTE_BATCH: &str =
    "executeBatch(address[],uint256[],bytes[],bytes32,bytes32)";

fn address_array(items: &[Address]) -> Token {
    Token::Array(items.iter().copied().map(Token::Address).collect())
}

fn uint_array(items: &[U256]) -> Token {
    Token::Array(items.iter().copied().map(Token::Uint).collect())
}

fn bytes_array(items: &[Bytes]) -> Token {
    Token::Array(items.iter().map(|b| Token::Bytes(b.to_vec())).collect())
}

fn bytes32(value: H256) -> Token {
    Token::FixedBytes(value.as_bytes().to_vec())
}

/// Governor proposal (OpenZeppelin Governor semantics)
#[derive(Debug, Clone)]
pub struct GovernorProposal {
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub calldatas: Vec<Bytes>,
    pub description: String,
}

impl GovernorProposal {
    pub fn from_proposal(proposal: &ConstructedProposal) -> Self {
        Self {
            targets: proposal.targets(),
            values: proposal.values(),
            calldatas: proposal.calldatas(),
            description: proposal.description.clone(),
        }
    }

    pub fn description_hash(&self) -> H256 {
        H256::from(keccak256(self.description.as_bytes()))
    }

    /// `hashProposal(targets, values, calldatas, descriptionHash)`
    pub fn proposal_id(&self) -> U256 {
        let encoded = abi::encode(&[
            address_array(&self.targets),
            uint_array(&self.values),
            bytes_array(&self.calldatas),
            bytes32(self.description_hash()),
        ]);
        U256::from_big_endian(&keccak256(encoded))
    }

    pub fn propose_calldata(&self) -> Bytes {
        encode_with_selector(
            selector_of(GOVERNOR_PROPOSE),
            &[
                address_array(&self.targets),
                uint_array(&self.values),
                bytes_array(&self.calldatas),
                Token::String(self.description.clone()),
            ],
        )
    }

    pub fn queue_calldata(&self) -> Bytes {
        self.lifecycle_call(GOVERNOR_QUEUE)
    }

    pub fn execute_calldata(&self) -> Bytes {
        self.lifecycle_call(GOVERNOR_EXECUTE)
    }

    fn lifecycle_call(&self, signature: &str) -> Bytes {
        encode_with_selector(
            selector_of(signature),
            &[
                address_array(&self.targets),
                uint_array(&self.values),
                bytes_array(&self.calldatas),
                bytes32(self.description_hash()),
            ],
        )
    }
}

/// TimelockController batch operation
#[derive(Debug, Clone)]
pub struct TimelockBatch {
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub payloads: Vec<Bytes>,
    pub predecessor: H256,
    pub salt: H256,
}

impl TimelockBatch {
    /// Salt is `keccak256(description)`, predecessor is zero
    pub fn from_proposal(proposal: &ConstructedProposal) -> Self {
        Self {
            targets: proposal.targets(),
            values: proposal.values(),
            payloads: proposal.calldatas(),
            predecessor: H256::zero(),
            salt: H256::from(keccak256(proposal.description.as_bytes())),
        }
    }

    /// `hashOperationBatch(targets, values, payloads, predecessor, salt)`
    pub fn operation_id(&self) -> H256 {
        H256::from(keccak256(abi::encode(&self.batch_tokens())))
    }

    pub fn schedule_calldata(&self, delay: u64) -> Bytes {
        let mut tokens = self.batch_tokens();
        tokens.push(Token::Uint(U256::from(delay)));
        encode_with_selector(selector_of(TIMELOCK_SCHEDULE_BATCH), &tokens)
    }

    pub fn execute_calldata(&self) -> Bytes {
        encode_with_selector(selector_of(TIMELOCK_EXECUTE_BATCH), &self.batch_tokens())
    }

    fn batch_tokens(&self) -> Vec<Token> {
        vec![
            address_array(&self.targets),
            uint_array(&self.values),
            bytes_array(&self.payloads),
            bytes32(self.predecessor),
            bytes32(self.salt),
        ]
    }
}

/// Calldata to submit for a proposal, by category
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposalCalldata {
    Dao {
        proposal_id: U256,
        propose: Bytes,
    },
    Timelock {
        operation_id: H256,
        salt: H256,
        delay: u64,
        schedule: Bytes,
        execute: Bytes,
    },
}

/// Build the submission calldata for `proposal`
///
/// `timelock_delay` (seconds) is only used for OA/TC proposals.
pub fn proposal_calldata(
    category: ProposalCategory,
    proposal: &ConstructedProposal,
    timelock_delay: u64,
) -> Result<ProposalCalldata> {
    match category {
        ProposalCategory::Dao => {
            let governor = GovernorProposal::from_proposal(proposal);
            Ok(ProposalCalldata::Dao {
                proposal_id: governor.proposal_id(),
                propose: governor.propose_calldata(),
            })
        }
        ProposalCategory::Oa | ProposalCategory::Tc => {
            let batch = TimelockBatch::from_proposal(proposal);
            Ok(ProposalCalldata::Timelock {
                operation_id: batch.operation_id(),
                salt: batch.salt,
                delay: timelock_delay,
                schedule: batch.schedule_calldata(timelock_delay),
                execute: batch.execute_calldata(),
            })
        }
        ProposalCategory::None => Err(AppError::InvalidState(
            "proposals in category NONE have no governance calldata".to_string(),
        )),
    }
}
