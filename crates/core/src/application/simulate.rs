// Governance Simulation Use Case
//
// Drives a constructed proposal through the on-chain governance path of its
// category on a forked chain, impersonating the accounts involved.

use crate::application::calldata::{GovernorProposal, TimelockBatch};
use crate::application::construct::ConstructedProposal;
use crate::application::transact::{call_bool, call_u64, calldata, send_as, ExecutedTx};
use crate::domain::abi::selector_of;
use crate::domain::{AddressRegistry, ProposalCategory};
use crate::error::{AppError, Result};
use crate::port::{Chain, ChainError, TxRequest};
use ethers_core::abi::Token;
use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Upper bound on governor state transitions before giving up
const MAX_DAO_STEPS: usize = 16;

/// Custom error of newer governors for an unknown id
const GOVERNOR_NONEXISTENT_PROPOSAL: &str = "GovernorNonexistentProposal(uint256)";

/// Support value for `castVote` (1 = for)
const VOTE_FOR: u8 = 1;

/// Registry names (or literal addresses) of the governance accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// AccessControl core contract
    pub core: String,
    pub dao: String,
    pub dao_timelock: String,
    /// Account with enough voting power to pass a DAO proposal alone
    pub voter: String,
    pub optimistic_timelock: String,
    pub oa_proposer: String,
    pub oa_executor: String,
    pub tribal_council_timelock: String,
    pub tc_proposer: String,
    pub tc_executor: String,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            core: "core".to_string(),
            dao: "feiDAO".to_string(),
            dao_timelock: "feiDAOTimelock".to_string(),
            voter: "daoVoter".to_string(),
            optimistic_timelock: "optimisticTimelock".to_string(),
            oa_proposer: "optimisticMultisig".to_string(),
            oa_executor: "optimisticMultisig".to_string(),
            tribal_council_timelock: "tribalCouncilTimelock".to_string(),
            tc_proposer: "tribalCouncilSafe".to_string(),
            tc_executor: "tribalCouncilSafe".to_string(),
        }
    }
}

/// Resolved DAO accounts
#[derive(Debug, Clone, Copy)]
pub struct DaoAccounts {
    pub governor: Address,
    pub timelock: Address,
    pub voter: Address,
}

/// Resolved timelock accounts
#[derive(Debug, Clone, Copy)]
pub struct TimelockAccounts {
    pub timelock: Address,
    pub proposer: Address,
    pub executor: Address,
}

impl GovernanceConfig {
    pub fn dao_accounts(&self, registry: &AddressRegistry) -> Result<DaoAccounts> {
        Ok(DaoAccounts {
            governor: registry.resolve(&self.dao)?,
            timelock: registry.resolve(&self.dao_timelock)?,
            voter: registry.resolve(&self.voter)?,
        })
    }

    pub fn timelock_accounts(
        &self,
        category: ProposalCategory,
        registry: &AddressRegistry,
    ) -> Result<TimelockAccounts> {
        let (timelock, proposer, executor) = match category {
            ProposalCategory::Oa => (&self.optimistic_timelock, &self.oa_proposer, &self.oa_executor),
            ProposalCategory::Tc => (
                &self.tribal_council_timelock,
                &self.tc_proposer,
                &self.tc_executor,
            ),
            other => {
                return Err(AppError::InvalidState(format!(
                    "category {} is not executed through a timelock",
                    other
                )))
            }
        };
        Ok(TimelockAccounts {
            timelock: registry.resolve(timelock)?,
            proposer: registry.resolve(proposer)?,
            executor: registry.resolve(executor)?,
        })
    }
}

/// Governor `ProposalState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl GovernorState {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => GovernorState::Pending,
            1 => GovernorState::Active,
            2 => GovernorState::Canceled,
            3 => GovernorState::Defeated,
            4 => GovernorState::Succeeded,
            5 => GovernorState::Queued,
            6 => GovernorState::Expired,
            7 => GovernorState::Executed,
            _ => return None,
        })
    }
}

/// Outcome of a simulation
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub category: String,
    /// Governor proposal id (decimal) or timelock operation id (hex)
    pub id: String,
    pub transactions: Vec<ExecutedTx>,
    /// The operation had already been executed on-chain
    pub already_executed: bool,
}

/// Simulator (governance execution on a fork)
pub struct Simulator {
    chain: Arc<dyn Chain>,
}

impl Simulator {
    pub fn new(chain: Arc<dyn Chain>) -> Self {
        Self { chain }
    }

    /// Run `proposal` through the governance path of `category`
    ///
    /// # Arguments
    /// * `proposal_id` - Existing governor proposal id (DAO only); skips `propose`
    pub async fn simulate(
        &self,
        category: ProposalCategory,
        proposal: &ConstructedProposal,
        governance: &GovernanceConfig,
        registry: &AddressRegistry,
        proposal_id: Option<&str>,
    ) -> Result<SimulationReport> {
        match category {
            ProposalCategory::Dao => {
                let accounts = governance.dao_accounts(registry)?;
                let existing = proposal_id.map(parse_proposal_id).transpose()?;
                self.simulate_dao(proposal, &accounts, existing).await
            }
            ProposalCategory::Oa | ProposalCategory::Tc => {
                let accounts = governance.timelock_accounts(category, registry)?;
                self.simulate_timelock(category, proposal, &accounts).await
            }
            ProposalCategory::None => Err(AppError::InvalidState(
                "proposals in category NONE are not simulated".to_string(),
            )),
        }
    }

    /// Schedule and execute a timelock batch
    pub async fn simulate_timelock(
        &self,
        category: ProposalCategory,
        proposal: &ConstructedProposal,
        accounts: &TimelockAccounts,
    ) -> Result<SimulationReport> {
        let chain = self.chain.as_ref();
        let batch = TimelockBatch::from_proposal(proposal);
        let operation_id = batch.operation_id();
        let id_token = [Token::FixedBytes(operation_id.as_bytes().to_vec())];
        let mut transactions = Vec::new();

        let delay = call_u64(chain, accounts.timelock, "getMinDelay()", &[]).await?;
        info!(
            timelock = ?accounts.timelock,
            operation_id = ?operation_id,
            delay_seconds = delay,
            "Simulating timelock proposal"
        );

        let scheduled = call_bool(chain, accounts.timelock, "isOperation(bytes32)", &id_token).await?;
        if scheduled {
            info!(operation_id = ?operation_id, "Operation already scheduled");
        } else {
            let tx = TxRequest::call(
                accounts.proposer,
                accounts.timelock,
                batch.schedule_calldata(delay),
            );
            transactions.push(send_as(chain, "scheduleBatch", tx).await?);
        }

        if call_bool(chain, accounts.timelock, "isOperationDone(bytes32)", &id_token).await? {
            warn!(operation_id = ?operation_id, "Operation already executed, nothing to do");
            return Ok(SimulationReport {
                category: category.to_string(),
                id: format!("{:?}", operation_id),
                transactions,
                already_executed: true,
            });
        }

        chain.increase_time(delay).await?;
        chain.mine(1).await?;

        if !call_bool(chain, accounts.timelock, "isOperationReady(bytes32)", &id_token).await? {
            return Err(AppError::Simulation(format!(
                "operation {:?} not ready after {}s",
                operation_id, delay
            )));
        }

        let tx = TxRequest::call(accounts.executor, accounts.timelock, batch.execute_calldata())
            .with_value(proposal.total_value());
        transactions.push(send_as(chain, "executeBatch", tx).await?);

        info!(operation_id = ?operation_id, "Timelock proposal executed");

        Ok(SimulationReport {
            category: category.to_string(),
            id: format!("{:?}", operation_id),
            transactions,
            already_executed: false,
        })
    }

    /// Propose, vote, queue and execute through the governor
    ///
    /// Driven by `state(proposalId)`, so a proposal that is already part-way
    /// through its lifecycle resumes where it is.
    pub async fn simulate_dao(
        &self,
        proposal: &ConstructedProposal,
        accounts: &DaoAccounts,
        existing_id: Option<U256>,
    ) -> Result<SimulationReport> {
        let chain = self.chain.as_ref();
        let governor = GovernorProposal::from_proposal(proposal);
        let computed_id = governor.proposal_id();
        let proposal_id = match existing_id {
            Some(id) if id != computed_id => {
                warn!(
                    configured = %id,
                    computed = %computed_id,
                    "Configured proposal id differs from the hash of this proposal"
                );
                id
            }
            Some(id) => id,
            None => computed_id,
        };
        info!(
            governor = ?accounts.governor,
            proposal_id = %proposal_id,
            actions = proposal.actions.len(),
            "Simulating DAO proposal"
        );

        let mut transactions = Vec::new();
        let mut proposed = false;
        let mut voted = false;

        for _ in 0..MAX_DAO_STEPS {
            let state = match self.governor_state(accounts.governor, proposal_id).await? {
                Some(state) => state,
                None if proposed => {
                    return Err(AppError::Simulation(format!(
                        "proposal {} unknown to governor after propose",
                        proposal_id
                    )))
                }
                None => {
                    let tx = TxRequest::call(
                        accounts.voter,
                        accounts.governor,
                        governor.propose_calldata(),
                    );
                    transactions.push(send_as(chain, "propose", tx).await?);
                    proposed = true;
                    continue;
                }
            };

            info!(proposal_id = %proposal_id, state = ?state, "Governor state");

            match state {
                GovernorState::Pending => {
                    let delay = call_u64(chain, accounts.governor, "votingDelay()", &[]).await?;
                    chain.mine(delay + 1).await?;
                }
                GovernorState::Active => {
                    if !voted {
                        let tx = TxRequest::call(
                            accounts.voter,
                            accounts.governor,
                            calldata(
                                "castVote(uint256,uint8)",
                                &[Token::Uint(proposal_id), Token::Uint(U256::from(VOTE_FOR))],
                            ),
                        );
                        transactions.push(send_as(chain, "castVote", tx).await?);
                        voted = true;
                    }
                    let period = call_u64(chain, accounts.governor, "votingPeriod()", &[]).await?;
                    chain.mine(period + 1).await?;
                }
                GovernorState::Succeeded => {
                    let tx = TxRequest::call(
                        accounts.voter,
                        accounts.governor,
                        governor.queue_calldata(),
                    );
                    transactions.push(send_as(chain, "queue", tx).await?);
                }
                GovernorState::Queued => {
                    let delay = call_u64(chain, accounts.timelock, "getMinDelay()", &[]).await?;
                    chain.increase_time(delay + 1).await?;
                    chain.mine(1).await?;
                    let tx = TxRequest::call(
                        accounts.voter,
                        accounts.governor,
                        governor.execute_calldata(),
                    )
                    .with_value(proposal.total_value());
                    transactions.push(send_as(chain, "execute", tx).await?);
                }
                GovernorState::Executed => {
                    let already_executed = transactions.is_empty();
                    if already_executed {
                        warn!(proposal_id = %proposal_id, "Proposal already executed");
                    } else {
                        info!(proposal_id = %proposal_id, "DAO proposal executed");
                    }
                    return Ok(SimulationReport {
                        category: ProposalCategory::Dao.to_string(),
                        id: proposal_id.to_string(),
                        transactions,
                        already_executed,
                    });
                }
                GovernorState::Canceled | GovernorState::Defeated | GovernorState::Expired => {
                    return Err(AppError::Simulation(format!(
                        "proposal {} ended in state {:?}",
                        proposal_id, state
                    )));
                }
            }
        }

        Err(AppError::Simulation(format!(
            "proposal {} not executed after {} governor steps",
            proposal_id, MAX_DAO_STEPS
        )))
    }

    /// `state(proposalId)`; `None` when the governor does not know the id
    async fn governor_state(&self, governor: Address, proposal_id: U256) -> Result<Option<GovernorState>> {
        let raw = match call_u64(
            self.chain.as_ref(),
            governor,
            "state(uint256)",
            &[Token::Uint(proposal_id)],
        )
        .await
        {
            Ok(raw) => raw,
            Err(AppError::Chain(ChainError::Reverted(reason))) if is_unknown_proposal(&reason) => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        u8::try_from(raw)
            .ok()
            .and_then(GovernorState::from_u8)
            .map(Some)
            .ok_or_else(|| AppError::Simulation(format!("unknown governor state {}", raw)))
    }
}

/// Revert raised by `state()` for an id the governor never saw
fn is_unknown_proposal(reason: &str) -> bool {
    let nonexistent = hex::encode(selector_of(GOVERNOR_NONEXISTENT_PROPOSAL));
    reason.contains("unknown proposal id") || reason.contains(&nonexistent)
}

/// Parse a configured proposal id (decimal or `0x` hex)
pub fn parse_proposal_id(raw: &str) -> Result<U256> {
    let raw = raw.trim();
    let parsed = match raw.strip_prefix("0x") {
        Some(hex_digits) => U256::from_str_radix(hex_digits, 16).ok(),
        None => U256::from_dec_str(raw).ok(),
    };
    parsed.ok_or_else(|| AppError::Validation(format!("invalid proposal id: {}", raw)))
}
