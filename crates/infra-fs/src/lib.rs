// FIP Infrastructure - Filesystem Adapter
// Implements: ProposalSource, ArtifactStore

mod artifact_store;
mod json;
mod proposal_source;

pub use artifact_store::FsArtifactStore;
pub use proposal_source::{FsProposalSource, Layout};
