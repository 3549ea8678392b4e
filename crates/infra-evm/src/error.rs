// ProviderError -> ChainError mapping

use ethers::providers::{ProviderError, RpcError};
use fip_core::port::ChainError;

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;

/// geth/anvil "execution reverted"
const EXECUTION_REVERTED: i64 = 3;

/// Map a provider failure for `method`
///
/// - unknown RPC methods -> Unsupported
/// - execution reverts (code 3, or a message mentioning a revert) -> Reverted
/// - other node error responses -> Node
/// - everything else (connection, HTTP, decoding) -> Transport
pub fn map_provider_error(method: &str, err: ProviderError) -> ChainError {
    if let Some(response) = err.as_error_response() {
        if response.code == METHOD_NOT_FOUND {
            return ChainError::Unsupported(format!("{}: {}", method, response.message));
        }
        let reverted = response.code == EXECUTION_REVERTED
            || response.message.to_lowercase().contains("revert");
        if !reverted {
            return ChainError::Node(format!("{}: {}", method, response.message));
        }
        let reason = match &response.data {
            Some(data) => format!("{} (data: {})", response.message, data),
            None => response.message.clone(),
        };
        return ChainError::Reverted(reason);
    }

    ChainError::Transport(format!("{}: {}", method, err))
}
