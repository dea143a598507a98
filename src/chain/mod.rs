//! Chain boundary: nonce, balance, broadcast and status operations.

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpChainClient;
pub use mock::MockChainClient;
pub use traits::{
    ChainClient, ChainError, ChainResult, ContractArg, ContractCall, ContractDeploy,
    TransactionSigner, TxId, TxStatus,
};
