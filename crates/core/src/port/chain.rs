// Chain Port
// Abstraction over a (forked) EVM node reached through JSON-RPC

use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, H256, U256};
use thiserror::Error;

/// Transaction sent from an (impersonated) account
#[derive(Debug, Clone, PartialEq)]
pub struct TxRequest {
    pub from: Address,
    /// `None` deploys `data` as init code
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
}

impl TxRequest {
    pub fn call(from: Address, to: Address, data: Bytes) -> Self {
        Self {
            from,
            to: Some(to),
            data,
            value: U256::zero(),
        }
    }

    pub fn deploy(from: Address, init_code: Bytes) -> Self {
        Self {
            from,
            to: None,
            data: init_code,
            value: U256::zero(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Mined transaction summary
#[derive(Debug, Clone, PartialEq)]
pub struct TxReceipt {
    pub hash: H256,
    pub contract_address: Option<Address>,
    pub success: bool,
    pub gas_used: U256,
}

/// Chain errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Transaction dropped: {0}")]
    Dropped(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unsupported by node: {0}")]
    Unsupported(String),

    /// Node answered with an error that is not an execution revert
    #[error("Node error: {0}")]
    Node(String),
}

impl ChainError {
    /// Transport failures may succeed on retry; reverts never do
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Transport(_))
    }
}

/// Chain trait
///
/// Implementations:
/// - ForkClient: JSON-RPC against a Hardhat/Anvil fork
/// - MockChain: scripted responses for tests
#[async_trait]
pub trait Chain: Send + Sync {
    /// `eth_call` against the latest block
    ///
    /// # Errors
    /// - ChainError::Reverted if the call reverts
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Send a transaction and wait for its receipt
    async fn send(&self, tx: TxRequest) -> Result<TxReceipt, ChainError>;

    /// Allow sending transactions from `account` without its key
    async fn impersonate(&self, account: Address) -> Result<(), ChainError>;

    async fn set_balance(&self, account: Address, wei: U256) -> Result<(), ChainError>;

    /// Advance the next block timestamp by `seconds`
    async fn increase_time(&self, seconds: u64) -> Result<(), ChainError>;

    /// Mine `blocks` empty blocks
    async fn mine(&self, blocks: u64) -> Result<(), ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use ethers_core::abi::{self, Token};
    use ethers_core::utils::keccak256;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Scripted `eth_call` response
    #[derive(Debug, Clone)]
    pub enum MockResponse {
        Return(Bytes),
        Revert(String),
    }

    impl MockResponse {
        pub fn tokens(tokens: &[Token]) -> Self {
            MockResponse::Return(abi::encode(tokens).into())
        }

        pub fn uint(value: u64) -> Self {
            Self::tokens(&[Token::Uint(U256::from(value))])
        }

        pub fn bool(value: bool) -> Self {
            Self::tokens(&[Token::Bool(value)])
        }
    }

    #[derive(Default)]
    struct MockState {
        responses: HashMap<(Address, [u8; 4]), VecDeque<MockResponse>>,
        send_failures: HashMap<[u8; 4], String>,
        sent: Vec<TxRequest>,
        impersonated: Vec<Address>,
        balances: HashMap<Address, U256>,
        elapsed_seconds: u64,
        block: u64,
        deployed: u64,
    }

    /// Mock Chain for testing
    ///
    /// Each `(to, selector)` pair answers from a queue of responses; the last
    /// response stays in place once the queue drains. Unscripted calls revert.
    #[derive(Default)]
    pub struct MockChain {
        state: Mutex<MockState>,
    }

    impl MockChain {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, to: Address, selector: [u8; 4], responses: Vec<MockResponse>) {
            self.state
                .lock()
                .unwrap()
                .responses
                .insert((to, selector), responses.into());
        }

        /// Make every transaction with this selector revert
        pub fn revert_sends(&self, selector: [u8; 4], reason: impl Into<String>) {
            self.state
                .lock()
                .unwrap()
                .send_failures
                .insert(selector, reason.into());
        }

        pub fn sent(&self) -> Vec<TxRequest> {
            self.state.lock().unwrap().sent.clone()
        }

        pub fn sent_selectors(&self) -> Vec<[u8; 4]> {
            self.sent()
                .iter()
                .filter(|tx| tx.to.is_some() && tx.data.len() >= 4)
                .map(|tx| [tx.data[0], tx.data[1], tx.data[2], tx.data[3]])
                .collect()
        }

        pub fn impersonated(&self) -> Vec<Address> {
            self.state.lock().unwrap().impersonated.clone()
        }

        pub fn balance_of(&self, account: Address) -> Option<U256> {
            self.state.lock().unwrap().balances.get(&account).copied()
        }

        pub fn elapsed_seconds(&self) -> u64 {
            self.state.lock().unwrap().elapsed_seconds
        }

        pub fn blocks_mined(&self) -> u64 {
            self.state.lock().unwrap().block
        }

        /// Address the n-th (1-based) deployment lands at
        pub fn deployment_address(n: u64) -> Address {
            Address::from_low_u64_be(0xc0de_0000 + n)
        }
    }

    #[async_trait]
    impl Chain for MockChain {
        async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
            if data.len() < 4 {
                return Err(ChainError::Reverted("call without selector".to_string()));
            }
            let selector = [data[0], data[1], data[2], data[3]];

            let mut state = self.state.lock().unwrap();
            let queue = match state.responses.get_mut(&(to, selector)) {
                Some(queue) => queue,
                None => return Err(ChainError::Reverted("no mock response".to_string())),
            };
            let response = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };

            match response {
                Some(MockResponse::Return(bytes)) => Ok(bytes),
                Some(MockResponse::Revert(reason)) => Err(ChainError::Reverted(reason)),
                None => Err(ChainError::Reverted("no mock response".to_string())),
            }
        }

        async fn send(&self, tx: TxRequest) -> Result<TxReceipt, ChainError> {
            let mut state = self.state.lock().unwrap();

            if tx.to.is_some() && tx.data.len() >= 4 {
                let selector = [tx.data[0], tx.data[1], tx.data[2], tx.data[3]];
                if let Some(reason) = state.send_failures.get(&selector) {
                    return Err(ChainError::Reverted(reason.clone()));
                }
            }

            let contract_address = if tx.to.is_none() {
                state.deployed += 1;
                Some(Self::deployment_address(state.deployed))
            } else {
                None
            };

            state.sent.push(tx);
            state.block += 1;
            let hash = H256::from(keccak256(state.sent.len().to_be_bytes()));

            Ok(TxReceipt {
                hash,
                contract_address,
                success: true,
                gas_used: U256::from(21_000),
            })
        }

        async fn impersonate(&self, account: Address) -> Result<(), ChainError> {
            let mut state = self.state.lock().unwrap();
            if !state.impersonated.contains(&account) {
                state.impersonated.push(account);
            }
            Ok(())
        }

        async fn set_balance(&self, account: Address, wei: U256) -> Result<(), ChainError> {
            self.state.lock().unwrap().balances.insert(account, wei);
            Ok(())
        }

        async fn increase_time(&self, seconds: u64) -> Result<(), ChainError> {
            self.state.lock().unwrap().elapsed_seconds += seconds;
            Ok(())
        }

        async fn mine(&self, blocks: u64) -> Result<(), ChainError> {
            self.state.lock().unwrap().block += blocks;
            Ok(())
        }

        async fn block_number(&self) -> Result<u64, ChainError> {
            Ok(self.state.lock().unwrap().block)
        }
    }
}
