//! Chain client trait abstractions.
//!
//! The ledger is an opaque remote: we read nonces, balances and transaction
//! status, and we hand it transactions to broadcast. Everything the deployment
//! pipeline needs from the chain goes through [`ChainClient`], which lets tests
//! substitute `MockChainClient`.

use async_trait::async_trait;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction identifier as returned by the broadcast endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positional contract-call argument.
///
/// Callers pick the variant explicitly; nothing inspects values at runtime
/// to guess an encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractArg {
    /// Unsigned integer (`uint`)
    Integer(BigUint),
    /// Standard or contract principal
    Address(String),
    /// UTF-8 string
    Text(String),
    /// Byte buffer
    Bytes(Vec<u8>),
}

impl fmt::Display for ContractArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractArg::Integer(n) => write!(f, "u{}", n),
            ContractArg::Address(addr) => write!(f, "'{}", addr),
            ContractArg::Text(text) => write!(f, "u{:?}", text),
            ContractArg::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

/// Contract deployment transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeploy {
    pub sender: String,
    pub contract_name: String,
    pub source: String,
    pub nonce: u64,
    /// Fee in micro-units of the native currency
    pub fee: u64,
}

/// Contract function call transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub sender: String,
    /// Contract principal (`deployer.contract-name`)
    pub contract: String,
    pub function: String,
    pub args: Vec<ContractArg>,
    pub nonce: u64,
    pub fee: u64,
}

/// Ledger view of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// In the mempool
    Pending,
    /// Not (yet) known to the API
    NotFound,
    Success,
    AbortByResponse,
    AbortByPostCondition,
    /// Dropped from the mempool (replace-by-fee, too expensive, stale, ...)
    Dropped(String),
    /// Status string this client does not know about
    Other(String),
}

impl TxStatus {
    /// Parse the API's `tx_status` field.
    pub fn from_api(status: &str) -> Self {
        match status {
            "pending" => TxStatus::Pending,
            "success" => TxStatus::Success,
            "abort_by_response" => TxStatus::AbortByResponse,
            "abort_by_post_condition" => TxStatus::AbortByPostCondition,
            s if s.starts_with("dropped_") => TxStatus::Dropped(s.to_string()),
            s => TxStatus::Other(s.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TxStatus::Success)
    }

    /// Definitive failure: polling again will not change the outcome.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            TxStatus::AbortByResponse | TxStatus::AbortByPostCondition | TxStatus::Dropped(_)
        )
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::NotFound => write!(f, "not_found"),
            TxStatus::Success => write!(f, "success"),
            TxStatus::AbortByResponse => write!(f, "abort_by_response"),
            TxStatus::AbortByPostCondition => write!(f, "abort_by_post_condition"),
            TxStatus::Dropped(s) | TxStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Chain client errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Broadcast rejected: {0}")]
    Broadcast(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl ChainError {
    /// Transient failures worth another attempt inside a bounded retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Network(_) => true,
            ChainError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Chain operations used by the deployment pipeline.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Next nonce the ledger will accept from `address`, mempool included.
    async fn next_nonce(&self, address: &str) -> ChainResult<u64>;

    /// Native balance of `address` in micro-units.
    async fn balance(&self, address: &str) -> ChainResult<BigUint>;

    /// Broadcast a contract deployment.
    async fn deploy_contract(&self, tx: &ContractDeploy) -> ChainResult<TxId>;

    /// Broadcast a contract function call.
    async fn call_contract(&self, tx: &ContractCall) -> ChainResult<TxId>;

    /// Current status of a broadcast transaction.
    async fn tx_status(&self, txid: &TxId) -> ChainResult<TxStatus>;
}

/// Produces signed, serialized transactions ready for broadcast.
///
/// Key management lives outside this crate; implementations wrap whatever
/// wallet or signing service the operator uses.
pub trait TransactionSigner: Send + Sync {
    fn sign_deploy(&self, tx: &ContractDeploy) -> ChainResult<Vec<u8>>;

    fn sign_call(&self, tx: &ContractCall) -> ChainResult<Vec<u8>>;
}
