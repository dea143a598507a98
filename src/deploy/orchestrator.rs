//! Deployment orchestrator.
//!
//! Runs one proposal's deployment as a strictly sequential pipeline:
//!
//! ```text
//! token -> confirm -> treasury -> confirm -> governance -> confirm
//!       -> distribute-founder -> distribute-participant* -> distribute-treasury
//!       -> distribute-verifier -> finalize-distribution
//! ```
//!
//! Every transaction gets a nonce fetched from the chain right before it is
//! built. The whole pipeline runs under one deadline; whatever was broadcast
//! or confirmed before a failure stays in the returned [`DeploymentResult`].

use super::confirmation::{await_confirmation, Confirmation, ConfirmationPolicy};
use super::result::{ContractKind, DeployError, DeploymentResult};
use super::templates::ContractTemplates;
use crate::chain::{ChainClient, ContractArg, ContractCall, ContractDeploy, TxId};
use crate::dao::address::contract_principal;
use crate::dao::allocation::AllocationClass;
use crate::dao::DeploymentPlan;
use num_bigint::BigUint;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// 1 STX
pub const DEFAULT_MIN_BALANCE: u64 = 1_000_000;

pub const DEFAULT_DEPLOY_FEE: u64 = 100_000;

pub const DEFAULT_CALL_FEE: u64 = 10_000;

/// Upper bound for one full deployment, confirmations included.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30 * 60);

const FINALIZE_FUNCTION: &str = "finalize-distribution";

/// Knobs for one deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPolicy {
    /// Minimum sender balance (micro-STX) required before anything is broadcast
    pub min_balance: BigUint,
    pub confirmation: ConfirmationPolicy,
    pub deadline: Duration,
    pub deploy_fee: u64,
    pub call_fee: u64,
    /// Recipient of the verifier allocation
    pub verifier: String,
}

impl DeploymentPolicy {
    pub fn new(verifier: impl Into<String>) -> Self {
        Self {
            min_balance: BigUint::from(DEFAULT_MIN_BALANCE),
            confirmation: ConfirmationPolicy::default(),
            deadline: DEFAULT_DEADLINE,
            deploy_fee: DEFAULT_DEPLOY_FEE,
            call_fee: DEFAULT_CALL_FEE,
            verifier: verifier.into(),
        }
    }
}

/// Principals of the three confirmed contracts.
#[derive(Debug, Clone)]
struct DeployedContracts {
    token: String,
    treasury: String,
}

/// Tracks the last nonce used so a lagging API node cannot make us reuse one.
#[derive(Debug, Default)]
struct NonceCursor {
    last: Option<u64>,
}

impl NonceCursor {
    fn advance(&mut self, fetched: u64) -> Result<u64, DeployError> {
        if let Some(previous) = self.last {
            if fetched <= previous {
                return Err(DeployError::StaleNonce { fetched, previous });
            }
        }
        self.last = Some(fetched);
        Ok(fetched)
    }
}

pub struct Orchestrator<C: ?Sized, T> {
    chain: Arc<C>,
    templates: T,
    sender: String,
    policy: DeploymentPolicy,
}

impl<C, T> Orchestrator<C, T>
where
    C: ChainClient + ?Sized,
    T: ContractTemplates,
{
    pub fn new(chain: Arc<C>, templates: T, sender: String, policy: DeploymentPolicy) -> Self {
        Self {
            chain,
            templates,
            sender,
            policy,
        }
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn policy(&self) -> &DeploymentPolicy {
        &self.policy
    }

    /// Check that the sender can pay for the deployment.
    ///
    /// Returns the current balance. The balance query counts against the
    /// deployment deadline.
    pub async fn preflight(&self) -> Result<BigUint, DeployError> {
        let balance = timeout(self.policy.deadline, self.chain.balance(&self.sender))
            .await
            .map_err(|_| DeployError::DeadlineExceeded(self.policy.deadline))??;

        if balance < self.policy.min_balance {
            warn!(
                sender = %self.sender,
                balance = %balance,
                required = %self.policy.min_balance,
                "insufficient balance for deployment"
            );
            return Err(DeployError::InsufficientFunds {
                balance,
                required: self.policy.min_balance.clone(),
            });
        }

        debug!(sender = %self.sender, balance = %balance, "preflight passed");
        Ok(balance)
    }

    /// Deploy and distribute under the overall deadline.
    ///
    /// Never returns an error: failures are reported through
    /// `success`/`error` with partial progress preserved.
    pub async fn run(&self, plan: &DeploymentPlan) -> DeploymentResult {
        let proposal_id = plan.proposal_id();
        let mut result = DeploymentResult::default();

        let outcome = timeout(self.policy.deadline, self.execute(plan, &mut result)).await;

        match outcome {
            Ok(Ok(())) => {
                result.success = true;
                info!(
                    proposal_id,
                    txs = result.tx_ids.len(),
                    fees = result.fees_paid.unwrap_or(0),
                    "deployment pipeline finished"
                );
            }
            Ok(Err(err)) => {
                warn!(
                    proposal_id,
                    error = %err,
                    txs = result.tx_ids.len(),
                    "deployment pipeline failed"
                );
                result.fail(&err);
            }
            Err(_) => {
                let err = DeployError::DeadlineExceeded(self.policy.deadline);
                warn!(
                    proposal_id,
                    error = %err,
                    txs = result.tx_ids.len(),
                    "deployment pipeline timed out"
                );
                result.fail(&err);
            }
        }

        result
    }

    async fn execute(
        &self,
        plan: &DeploymentPlan,
        result: &mut DeploymentResult,
    ) -> Result<(), DeployError> {
        let mut nonces = NonceCursor::default();
        let contracts = self.deploy_contracts(plan, &mut nonces, result).await?;
        self.distribute(plan, &contracts, &mut nonces, result).await
    }

    async fn deploy_contracts(
        &self,
        plan: &DeploymentPlan,
        nonces: &mut NonceCursor,
        result: &mut DeploymentResult,
    ) -> Result<DeployedContracts, DeployError> {
        let config = plan.config();

        let source = self.templates.token(config);
        let token = self
            .deploy_contract(plan, ContractKind::Token, source, nonces, result)
            .await?;

        let source = self.templates.treasury(config, &token);
        let treasury = self
            .deploy_contract(plan, ContractKind::Treasury, source, nonces, result)
            .await?;

        let source = self.templates.governance(config, &token, &treasury);
        self.deploy_contract(plan, ContractKind::Governance, source, nonces, result)
            .await?;

        Ok(DeployedContracts { token, treasury })
    }

    async fn deploy_contract(
        &self,
        plan: &DeploymentPlan,
        kind: ContractKind,
        source: String,
        nonces: &mut NonceCursor,
        result: &mut DeploymentResult,
    ) -> Result<String, DeployError> {
        let contract_name = kind.contract_name(&plan.config().contract_slug());
        let nonce = self.next_nonce(nonces).await?;

        let tx = ContractDeploy {
            sender: self.sender.clone(),
            contract_name,
            source,
            nonce,
            fee: self.policy.deploy_fee,
        };
        let txid = self.chain.deploy_contract(&tx).await?;
        info!(
            proposal_id = plan.proposal_id(),
            %txid,
            nonce,
            contract = %tx.contract_name,
            "contract deployment broadcast"
        );
        result.record_tx(txid.clone(), tx.fee);

        self.confirm(&txid).await?;

        let principal = contract_principal(&self.sender, &tx.contract_name);
        result.contracts.insert(kind, principal.clone());
        Ok(principal)
    }

    async fn distribute(
        &self,
        plan: &DeploymentPlan,
        contracts: &DeployedContracts,
        nonces: &mut NonceCursor,
        result: &mut DeploymentResult,
    ) -> Result<(), DeployError> {
        let allocations = plan.allocations(&contracts.treasury, &self.policy.verifier);

        for allocation in allocations {
            let args = vec![
                ContractArg::Address(allocation.recipient),
                ContractArg::Integer(allocation.amount),
            ];
            let function = distribution_function(allocation.class);
            self.call(plan, &contracts.token, function, args, nonces, result)
                .await?;
        }

        self.call(plan, &contracts.token, FINALIZE_FUNCTION, Vec::new(), nonces, result)
            .await?;
        Ok(())
    }

    async fn call(
        &self,
        plan: &DeploymentPlan,
        contract: &str,
        function: &str,
        args: Vec<ContractArg>,
        nonces: &mut NonceCursor,
        result: &mut DeploymentResult,
    ) -> Result<TxId, DeployError> {
        let nonce = self.next_nonce(nonces).await?;
        let tx = ContractCall {
            sender: self.sender.clone(),
            contract: contract.to_string(),
            function: function.to_string(),
            args,
            nonce,
            fee: self.policy.call_fee,
        };

        let txid = self.chain.call_contract(&tx).await?;
        info!(
            proposal_id = plan.proposal_id(),
            %txid,
            nonce,
            function,
            "distribution call broadcast"
        );
        result.record_tx(txid.clone(), tx.fee);
        Ok(txid)
    }

    async fn next_nonce(&self, nonces: &mut NonceCursor) -> Result<u64, DeployError> {
        let fetched = self.chain.next_nonce(&self.sender).await?;
        nonces.advance(fetched)
    }

    async fn confirm(&self, txid: &TxId) -> Result<(), DeployError> {
        match await_confirmation(self.chain.as_ref(), txid, &self.policy.confirmation).await? {
            Confirmation::Confirmed { .. } => Ok(()),
            Confirmation::Rejected(status) => Err(DeployError::TxRejected {
                txid: txid.clone(),
                status,
            }),
            Confirmation::TimedOut { attempts } => Err(DeployError::ConfirmationTimeout {
                txid: txid.clone(),
                attempts,
            }),
        }
    }
}

fn distribution_function(class: AllocationClass) -> &'static str {
    match class {
        AllocationClass::Founder => "distribute-founder",
        AllocationClass::Participant => "distribute-participant",
        AllocationClass::Treasury => "distribute-treasury",
        AllocationClass::Verifier => "distribute-verifier",
    }
}
