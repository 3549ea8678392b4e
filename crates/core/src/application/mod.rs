// Application Layer - Use Cases

pub mod calldata;
pub mod construct;
pub mod lifecycle;
pub mod retry;
pub mod signoff;
pub mod simulate;
pub mod transact;
pub mod validate;


// Re-exports
pub use calldata::{proposal_calldata, GovernorProposal, ProposalCalldata, TimelockBatch};
pub use construct::{construct_proposal, ConstructedProposal, ProposalAction};
pub use lifecycle::{
    DeclarativeScript, DeployedContract, ProposalScript, ScriptContext, UpgradeCoordinator,
    UpgradeOptions, UpgradeReport,
};
pub use retry::{RetryDecision, RetryPolicy};
pub use signoff::{check_signoff, SignoffFinding};
pub use simulate::{GovernanceConfig, SimulationReport, Simulator};
pub use transact::ExecutedTx;
pub use validate::{run_checks, verify_permissions, CheckOutcome, PermissionsReport};
