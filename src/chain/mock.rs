//! Mock chain client for testing.
//!
//! Simulates a single account's nonce and balance, records every broadcast
//! and serves scripted transaction statuses.

use super::traits::*;
use async_trait::async_trait;
use num_bigint::BigUint;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock chain client for testing
#[derive(Clone)]
pub struct MockChainClient {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    balance: BigUint,
    nonce: u64,
    /// When set, `next_nonce` always returns this value
    pinned_nonce: Option<u64>,
    status_script: VecDeque<ChainResult<TxStatus>>,
    default_status: TxStatus,
    failing_deploys: HashSet<String>,
    failing_calls: HashSet<String>,
    balance_error: Option<ChainError>,
    balance_stalled: bool,
    deploys: Vec<ContractDeploy>,
    calls: Vec<ContractCall>,
    status_polls: usize,
    network_calls: usize,
    next_tx: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            // 100 STX
            balance: BigUint::from(100_000_000u64),
            nonce: 0,
            pinned_nonce: None,
            status_script: VecDeque::new(),
            default_status: TxStatus::Success,
            failing_deploys: HashSet::new(),
            failing_calls: HashSet::new(),
            balance_error: None,
            balance_stalled: false,
            deploys: Vec::new(),
            calls: Vec::new(),
            status_polls: 0,
            network_calls: 0,
            next_tx: 1,
        }
    }
}

impl MockChainClient {
    /// Create new mock client
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn set_balance(&self, micro: u64) {
        self.state.lock().unwrap().balance = BigUint::from(micro);
    }

    /// Make the balance query fail.
    pub fn fail_balance(&self, error: ChainError) {
        self.state.lock().unwrap().balance_error = Some(error);
    }

    /// Make the balance query hang forever, like an API that never answers.
    pub fn stall_balance(&self) {
        self.state.lock().unwrap().balance_stalled = true;
    }

    /// Simulate transactions submitted by someone else from the same account.
    pub fn bump_nonce(&self, by: u64) {
        self.state.lock().unwrap().nonce += by;
    }

    /// Freeze `next_nonce` at a fixed value (a lagging API node).
    pub fn pin_nonce(&self, nonce: u64) {
        self.state.lock().unwrap().pinned_nonce = Some(nonce);
    }

    /// Statuses returned by successive `tx_status` calls, before the default.
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = TxStatus>) {
        self.state
            .lock()
            .unwrap()
            .status_script
            .extend(statuses.into_iter().map(Ok));
    }

    /// Queue a failing `tx_status` response.
    pub fn script_status_error(&self, error: ChainError) {
        self.state.lock().unwrap().status_script.push_back(Err(error));
    }

    /// Status returned once the script is exhausted (initially `Success`).
    pub fn set_default_status(&self, status: TxStatus) {
        self.state.lock().unwrap().default_status = status;
    }

    /// Reject broadcasts of the named contract.
    pub fn fail_deploy(&self, contract_name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_deploys
            .insert(contract_name.to_string());
    }

    /// Reject broadcasts calling the named function.
    pub fn fail_call(&self, function: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_calls
            .insert(function.to_string());
    }

    /// Deployments broadcast so far, in order.
    pub fn deploys(&self) -> Vec<ContractDeploy> {
        self.state.lock().unwrap().deploys.clone()
    }

    /// Contract calls broadcast so far, in order.
    pub fn calls(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Names of the functions called so far, in order.
    pub fn called_functions(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.function).collect()
    }

    pub fn status_polls(&self) -> usize {
        self.state.lock().unwrap().status_polls
    }

    /// Total number of trait method invocations.
    pub fn network_calls(&self) -> usize {
        self.state.lock().unwrap().network_calls
    }

    fn accept(state: &mut MockState, nonce: u64) -> ChainResult<TxId> {
        if nonce != state.nonce {
            return Err(ChainError::Broadcast(format!(
                "BadNonce: expected {}, got {}",
                state.nonce, nonce
            )));
        }
        state.nonce += 1;

        let txid = TxId(format!("0x{:064x}", state.next_tx));
        state.next_tx += 1;
        Ok(txid)
    }
}

impl Default for MockChainClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn next_nonce(&self, _address: &str) -> ChainResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;
        Ok(state.pinned_nonce.unwrap_or(state.nonce))
    }

    async fn balance(&self, _address: &str) -> ChainResult<BigUint> {
        {
            let mut state = self.state.lock().unwrap();
            state.network_calls += 1;
            if !state.balance_stalled {
                return match &state.balance_error {
                    Some(err) => Err(err.clone()),
                    None => Ok(state.balance.clone()),
                };
            }
        }
        std::future::pending().await
    }

    async fn deploy_contract(&self, tx: &ContractDeploy) -> ChainResult<TxId> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;

        if state.failing_deploys.contains(&tx.contract_name) {
            return Err(ChainError::Broadcast(format!(
                "ContractAlreadyExists: {}",
                tx.contract_name
            )));
        }

        let txid = Self::accept(&mut state, tx.nonce)?;
        state.deploys.push(tx.clone());
        Ok(txid)
    }

    async fn call_contract(&self, tx: &ContractCall) -> ChainResult<TxId> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;

        if state.failing_calls.contains(&tx.function) {
            return Err(ChainError::Broadcast(format!(
                "NoSuchPublicFunction: {}",
                tx.function
            )));
        }

        let txid = Self::accept(&mut state, tx.nonce)?;
        state.calls.push(tx.clone());
        Ok(txid)
    }

    async fn tx_status(&self, _txid: &TxId) -> ChainResult<TxStatus> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;
        state.status_polls += 1;

        match state.status_script.pop_front() {
            Some(scripted) => scripted,
            None => Ok(state.default_status.clone()),
        }
    }
}
