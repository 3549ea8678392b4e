// Port Layer - Interfaces for external dependencies

pub mod artifact_store;
pub mod chain;
pub mod proposal_source;

// Re-exports
pub use artifact_store::{Artifact, ArtifactStore};
pub use chain::{Chain, ChainError, TxReceipt, TxRequest};
pub use proposal_source::ProposalSource;
