// Transaction helpers shared by simulation and DAO scripts

use crate::domain::abi::{decode_output, encode_with_selector, selector_of};
use crate::error::{AppError, Result};
use crate::port::{Chain, ChainError, TxRequest};
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, Bytes, H256, U256};
use serde::Serialize;
use tracing::{debug, info};

/// Balance given to impersonated senders for gas (100 ETH)
pub fn gas_funding() -> U256 {
    U256::exp10(20)
}

/// Transaction sent during a run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutedTx {
    pub label: String,
    pub from: Address,
    pub to: Option<Address>,
    pub hash: H256,
    pub contract_address: Option<Address>,
    pub gas_used: U256,
}

/// Impersonate `from`, fund it, send the transaction and require success
pub async fn send_as(chain: &dyn Chain, label: &str, tx: TxRequest) -> Result<ExecutedTx> {
    chain.impersonate(tx.from).await?;
    chain
        .set_balance(tx.from, gas_funding().saturating_add(tx.value))
        .await?;

    let from = tx.from;
    let to = tx.to;
    debug!(label = %label, from = ?from, to = ?to, value = %tx.value, "Sending transaction");

    let receipt = chain.send(tx).await.map_err(|e| match e {
        ChainError::Reverted(reason) => {
            AppError::Simulation(format!("{} reverted: {}", label, reason))
        }
        other => AppError::Chain(other),
    })?;

    if !receipt.success {
        return Err(AppError::Simulation(format!(
            "{} failed in tx {:?}",
            label, receipt.hash
        )));
    }

    info!(
        label = %label,
        tx_hash = ?receipt.hash,
        gas_used = %receipt.gas_used,
        "Transaction mined"
    );

    Ok(ExecutedTx {
        label: label.to_string(),
        from,
        to,
        hash: receipt.hash,
        contract_address: receipt.contract_address,
        gas_used: receipt.gas_used,
    })
}

/// `eth_call` a view function and decode its outputs
pub async fn call_view(
    chain: &dyn Chain,
    to: Address,
    signature: &str,
    args: &[Token],
    outputs: &[ParamType],
) -> Result<Vec<Token>> {
    let data = encode_with_selector(selector_of(signature), args);
    let raw = chain.call(to, data).await?;
    Ok(decode_output(outputs, &raw)?)
}

/// `eth_call` returning a single `uint256` that must fit in u64
pub async fn call_u64(chain: &dyn Chain, to: Address, signature: &str, args: &[Token]) -> Result<u64> {
    let tokens = call_view(chain, to, signature, args, &[ParamType::Uint(256)]).await?;
    match tokens.first() {
        Some(Token::Uint(value)) if *value <= U256::from(u64::MAX) => Ok(value.low_u64()),
        Some(Token::Uint(value)) => Err(AppError::Simulation(format!(
            "{} returned {} which exceeds u64",
            signature, value
        ))),
        _ => Err(AppError::Simulation(format!(
            "{} returned no uint256",
            signature
        ))),
    }
}

/// `eth_call` returning a single `bool`
pub async fn call_bool(chain: &dyn Chain, to: Address, signature: &str, args: &[Token]) -> Result<bool> {
    let tokens = call_view(chain, to, signature, args, &[ParamType::Bool]).await?;
    match tokens.first() {
        Some(Token::Bool(value)) => Ok(*value),
        _ => Err(AppError::Simulation(format!("{} returned no bool", signature))),
    }
}

/// Raw calldata helper for governance calls built from tokens
pub fn calldata(signature: &str, args: &[Token]) -> Bytes {
    encode_with_selector(selector_of(signature), args)
}
