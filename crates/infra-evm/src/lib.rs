// FIP Infrastructure - EVM Adapter
// Implements: Chain (Hardhat/Anvil fork over JSON-RPC)

mod error;
mod fork_client;
mod retry;

pub use error::map_provider_error;
pub use fork_client::ForkClient;
