// Domain Layer - Pure types and encoding logic

pub mod abi;
pub mod config;
pub mod error;
pub mod permissions;
pub mod proposal;
pub mod registry;
pub mod template;

// Re-exports
pub use abi::MethodSignature;
pub use config::{ProposalCategory, ProposalConfig, ProposalsConfig};
pub use error::DomainError;
pub use permissions::PermissionsConfig;
pub use proposal::{Check, Command, DeployStep, ForkAction, ProposalDescription, MAX_ACTIONS};
pub use registry::{AddressRegistry, ContractCategory, ContractRecord};
