// ForkClient: Chain over JSON-RPC against a Hardhat or Anvil fork
//
// Uses the node's test methods (hardhat_impersonateAccount, hardhat_setBalance,
// evm_increaseTime, hardhat_mine) so transactions can be sent from any
// account without its key.

use crate::error::map_provider_error;
use crate::retry::with_retry;
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256,
};
use fip_core::application::RetryPolicy;
use fip_core::port::{Chain, ChainError, TxReceipt, TxRequest};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receipt polling interval; forks mine instantly
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct ForkClient {
    provider: Provider<Http>,
    retry: RetryPolicy,
}

impl ForkClient {
    pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
        Self::with_retry_policy(rpc_url, RetryPolicy::default())
    }

    pub fn with_retry_policy(rpc_url: &str, retry: RetryPolicy) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Transport(format!("invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(POLL_INTERVAL);

        info!(rpc_url = %rpc_url, "Fork client created");
        Ok(Self { provider, retry })
    }

    /// Raw JSON-RPC request to a node test method
    async fn node_request<P>(&self, method: &str, params: P) -> Result<Value, ChainError>
    where
        P: serde::Serialize + std::fmt::Debug + Send + Sync + Clone,
    {
        let provider = &self.provider;
        with_retry(&self.retry, method, move || {
            let params = params.clone();
            async move {
                provider
                    .request::<P, Value>(method, params)
                    .await
                    .map_err(|e| map_provider_error(method, e))
            }
        })
        .await
    }
}

#[async_trait]
impl Chain for ForkClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        let (provider, tx) = (&self.provider, &tx);
        with_retry(&self.retry, "eth_call", move || async move {
            provider
                .call(tx, None)
                .await
                .map_err(|e| map_provider_error("eth_call", e))
        })
        .await
    }

    // Not retried: a transport error may hide a transaction that was mined
    async fn send(&self, tx: TxRequest) -> Result<TxReceipt, ChainError> {
        let mut request = TransactionRequest::new()
            .from(tx.from)
            .data(tx.data)
            .value(tx.value);
        if let Some(to) = tx.to {
            request = request.to(to);
        }

        let pending = self
            .provider
            .send_transaction(request, None)
            .await
            .map_err(|e| map_provider_error("eth_sendTransaction", e))?;
        let hash = pending.tx_hash();
        debug!(tx_hash = ?hash, "Transaction submitted");

        let receipt = pending
            .await
            .map_err(|e| map_provider_error("eth_getTransactionReceipt", e))?
            .ok_or_else(|| ChainError::Dropped(format!("{:?}", hash)))?;

        Ok(TxReceipt {
            hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            success: receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false),
            gas_used: receipt.gas_used.unwrap_or_default(),
        })
    }

    async fn impersonate(&self, account: Address) -> Result<(), ChainError> {
        self.node_request("hardhat_impersonateAccount", [account])
            .await?;
        debug!(account = ?account, "Impersonating account");
        Ok(())
    }

    async fn set_balance(&self, account: Address, wei: U256) -> Result<(), ChainError> {
        self.node_request("hardhat_setBalance", (account, wei)).await?;
        Ok(())
    }

    // Not retried: time shifts are not idempotent
    async fn increase_time(&self, seconds: u64) -> Result<(), ChainError> {
        self.provider
            .request::<_, Value>("evm_increaseTime", [seconds])
            .await
            .map_err(|e| map_provider_error("evm_increaseTime", e))?;
        debug!(seconds = seconds, "Increased fork time");
        Ok(())
    }

    async fn mine(&self, blocks: u64) -> Result<(), ChainError> {
        if blocks == 0 {
            return Ok(());
        }

        let mined = self
            .provider
            .request::<_, Value>("hardhat_mine", [U256::from(blocks)])
            .await
            .map_err(|e| map_provider_error("hardhat_mine", e));

        match mined {
            Ok(_) => {}
            Err(ChainError::Unsupported(reason)) => {
                warn!(reason = %reason, blocks = blocks, "hardhat_mine unavailable, falling back to evm_mine");
                for _ in 0..blocks {
                    self.provider
                        .request::<_, Value>("evm_mine", ())
                        .await
                        .map_err(|e| map_provider_error("evm_mine", e))?;
                }
            }
            Err(e) => return Err(e),
        }

        debug!(blocks = blocks, "Mined blocks");
        Ok(())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let provider = &self.provider;
        let block = with_retry(&self.retry, "eth_blockNumber", move || async move {
            provider
                .get_block_number()
                .await
                .map_err(|e| map_provider_error("eth_blockNumber", e))
        })
        .await?;
        Ok(block.as_u64())
    }
}
