//! Deployment outcome and pipeline errors.

use crate::chain::{ChainError, TxId, TxStatus};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Contracts deployed for every DAO, in deployment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Token,
    Treasury,
    Governance,
}

impl ContractKind {
    pub const ALL: [ContractKind; 3] = [
        ContractKind::Token,
        ContractKind::Treasury,
        ContractKind::Governance,
    ];

    /// On-chain contract name, e.g. `rivr-token`.
    pub fn contract_name(&self, slug: &str) -> String {
        format!("{}-{}", slug, self)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractKind::Token => "token",
            ContractKind::Treasury => "treasury",
            ContractKind::Governance => "governance",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of one `deploy()` run.
///
/// `tx_ids` and `contracts` are append-only; on failure they hold whatever
/// was recorded before the failing step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub success: bool,
    pub tx_ids: Vec<TxId>,
    pub contracts: BTreeMap<ContractKind, String>,
    pub error: Option<String>,
    /// Sum of fees attached to broadcast transactions (micro-units)
    pub fees_paid: Option<u64>,
}

impl DeploymentResult {
    pub fn contract(&self, kind: ContractKind) -> Option<&str> {
        self.contracts.get(&kind).map(String::as_str)
    }

    pub(crate) fn record_tx(&mut self, txid: TxId, fee: u64) {
        self.tx_ids.push(txid);
        self.fees_paid = Some(self.fees_paid.unwrap_or(0).saturating_add(fee));
    }

    pub(crate) fn fail(&mut self, error: &DeployError) {
        self.success = false;
        self.error = Some(error.to_string());
    }
}

/// Deployment pipeline errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: BigUint, required: BigUint },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Transaction {txid} rejected with status {status}")]
    TxRejected { txid: TxId, status: TxStatus },

    #[error("Transaction {txid} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { txid: TxId, attempts: u32 },

    #[error("Deployment exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Stale nonce {fetched}: previous transaction used {previous}")]
    StaleNonce { fetched: u64, previous: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_names() {
        assert_eq!(ContractKind::Token.contract_name("rivr"), "rivr-token");
        assert_eq!(ContractKind::Treasury.contract_name("rivr"), "rivr-treasury");
        assert_eq!(ContractKind::Governance.contract_name("rivr"), "rivr-governance");
    }

    #[test]
    fn test_record_tx_accumulates_fees() {
        let mut result = DeploymentResult::default();
        assert_eq!(result.fees_paid, None);

        result.record_tx(TxId("0x1".to_string()), 50_000);
        result.record_tx(TxId("0x2".to_string()), 2_000);
        assert_eq!(result.tx_ids.len(), 2);
        assert_eq!(result.fees_paid, Some(52_000));
    }

    #[test]
    fn test_fees_saturate() {
        let mut result = DeploymentResult::default();
        result.record_tx(TxId("0x1".to_string()), u64::MAX - 1);
        result.record_tx(TxId("0x2".to_string()), 10);
        assert_eq!(result.fees_paid, Some(u64::MAX));
    }

    #[test]
    fn test_fail_keeps_progress() {
        let mut result = DeploymentResult::default();
        result.record_tx(TxId("0x1".to_string()), 1);
        result
            .contracts
            .insert(ContractKind::Token, "ST1.a-token".to_string());

        result.fail(&DeployError::ConfirmationTimeout {
            txid: TxId("0x2".to_string()),
            attempts: 30,
        });

        assert!(!result.success);
        assert_eq!(result.tx_ids.len(), 1);
        assert_eq!(result.contract(ContractKind::Token), Some("ST1.a-token"));
        assert_eq!(
            result.error.as_deref(),
            Some("Transaction 0x2 not confirmed after 30 attempts")
        );
    }

    #[test]
    fn test_result_serializes_kind_keys() {
        let mut result = DeploymentResult::default();
        result
            .contracts
            .insert(ContractKind::Governance, "ST1.a-governance".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["contracts"]["governance"], "ST1.a-governance");
    }
}
