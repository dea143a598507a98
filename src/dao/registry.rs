//! In-memory proposal registry.
//!
//! Each proposal sits behind its own mutex. Every check-then-mutate sequence
//! (capacity, duplicate, threshold, status transitions) runs while holding
//! that proposal's lock, so concurrent callers cannot race past a check.
//! The outer map lock is only held long enough to look up or insert an entry.

use super::address::Network;
use super::allocation::{equal_split_bp, token_allocations, TokenAllocation};
use super::config::DaoConfig;
use super::proposal::{now_secs, Participant, Proposal, ProposalStatus};
use crate::deploy::DeploymentResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Registry operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Proposal not found: {0}")]
    NotFound(u64),

    #[error("Proposal {id} is {status}; operation not allowed")]
    InvalidState { id: u64, status: ProposalStatus },

    #[error("Proposal {id} is full ({max} participants)")]
    CapacityExceeded { id: u64, max: usize },

    #[error("Participant already whitelisted: {0}")]
    Duplicate(String),

    #[error("Invalid {network} address: {address}")]
    InvalidAddress { address: String, network: Network },

    #[error("Proposal {id} has {current} participants, {required} required")]
    ThresholdNotMet {
        id: u64,
        current: usize,
        required: usize,
    },

    #[error("Proposal {0} is already deployed")]
    AlreadyDeployed(u64),
}

/// Snapshot handed to the deployment orchestrator.
///
/// Taken under the proposal lock with allocations already finalized; later
/// registry mutations do not affect it.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub proposal: Proposal,
}

impl DeploymentPlan {
    pub fn proposal_id(&self) -> u64 {
        self.proposal.id
    }

    pub fn config(&self) -> &DaoConfig {
        &self.proposal.config
    }

    pub fn allocations(&self, treasury: &str, verifier: &str) -> Vec<TokenAllocation> {
        token_allocations(&self.proposal, treasury, verifier)
    }
}

pub struct ProposalRegistry {
    network: Network,
    proposals: RwLock<HashMap<u64, Arc<Mutex<Proposal>>>>,
    next_id: AtomicU64,
}

impl ProposalRegistry {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            proposals: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Store a new proposal in GATHERING with the proposer at 10000 bp.
    pub async fn create_proposal(
        &self,
        discussion_ref: String,
        proposer: String,
        proposer_name: String,
        config: DaoConfig,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let proposal = Proposal::new(id, discussion_ref, config, proposer, proposer_name);

        info!(
            proposal_id = id,
            name = %proposal.config.name,
            symbol = %proposal.config.symbol,
            proposer = %proposal.proposer,
            "proposal created"
        );

        self.proposals
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(proposal)));

        id
    }

    async fn entry(&self, id: u64) -> Result<Arc<Mutex<Proposal>>, RegistryError> {
        self.proposals
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    /// Whitelist a participant.
    ///
    /// Checks run in order: state, capacity, duplicate, address format.
    pub async fn add_participant(
        &self,
        id: u64,
        address: String,
        name: String,
        verified: bool,
        external_ref: Option<String>,
    ) -> Result<ProposalStatus, RegistryError> {
        let entry = self.entry(id).await?;
        let mut proposal = entry.lock().await;

        if !proposal.status.accepts_participants() {
            return Err(RegistryError::InvalidState {
                id,
                status: proposal.status,
            });
        }

        if proposal.participant_count() >= proposal.config.max_participants {
            return Err(RegistryError::CapacityExceeded {
                id,
                max: proposal.config.max_participants,
            });
        }

        if proposal.has_participant(&address) {
            return Err(RegistryError::Duplicate(address));
        }

        if !self.network.is_valid_address(&address) {
            return Err(RegistryError::InvalidAddress {
                address,
                network: self.network,
            });
        }

        debug!(proposal_id = id, address = %address, verified, "participant whitelisted");
        proposal
            .participants
            .push(Participant::new(address, name, verified, external_ref));

        if proposal.status == ProposalStatus::Gathering && proposal.threshold_reached() {
            proposal.status = ProposalStatus::ThresholdMet;
            proposal.threshold_met_at = Some(now_secs());
            info!(
                proposal_id = id,
                participants = proposal.participant_count(),
                "participant threshold met"
            );
        }

        Ok(proposal.status)
    }

    /// Give every non-proposer participant an equal share of the pool.
    ///
    /// Overwrites any custom allocation. Returns false for an unknown id or
    /// when nobody besides the proposer has joined.
    pub async fn finalize_allocations(&self, id: u64) -> bool {
        match self.entry(id).await {
            Ok(entry) => finalize(&mut *entry.lock().await),
            Err(_) => false,
        }
    }

    /// Read-only deployability check, used before any network call.
    pub async fn check_deployable(&self, id: u64) -> Result<(), RegistryError> {
        let entry = self.entry(id).await?;
        let proposal = entry.lock().await;
        deployable(&proposal)
    }

    /// Finalize allocations and move to DEPLOYING in one atomic step.
    pub async fn begin_deployment(&self, id: u64) -> Result<DeploymentPlan, RegistryError> {
        let entry = self.entry(id).await?;
        let mut proposal = entry.lock().await;
        deployable(&proposal)?;

        if !finalize(&mut proposal) {
            debug!(proposal_id = id, "no participants besides proposer to allocate");
        }
        proposal.status = ProposalStatus::Deploying;
        proposal.error = None;

        info!(proposal_id = id, "deployment started");
        Ok(DeploymentPlan {
            proposal: proposal.clone(),
        })
    }

    /// Record the deployment outcome and move to DEPLOYED or FAILED.
    pub async fn complete_deployment(
        &self,
        id: u64,
        result: &DeploymentResult,
    ) -> Result<ProposalStatus, RegistryError> {
        let entry = self.entry(id).await?;
        let mut proposal = entry.lock().await;

        if proposal.status != ProposalStatus::Deploying {
            return Err(RegistryError::InvalidState {
                id,
                status: proposal.status,
            });
        }

        proposal.contracts = result.contracts.clone();
        proposal.tx_ids = result.tx_ids.clone();
        proposal.error = result.error.clone();

        if result.success {
            proposal.status = ProposalStatus::Deployed;
            proposal.deployed_at = Some(now_secs());
            info!(proposal_id = id, txs = result.tx_ids.len(), "proposal deployed");
        } else {
            proposal.status = ProposalStatus::Failed;
            warn!(
                proposal_id = id,
                error = result.error.as_deref().unwrap_or("unknown"),
                txs = result.tx_ids.len(),
                "proposal deployment failed"
            );
        }

        Ok(proposal.status)
    }

    /// Snapshot of a single proposal.
    pub async fn get(&self, id: u64) -> Option<Proposal> {
        let entry = self.entry(id).await.ok()?;
        let proposal = entry.lock().await;
        Some(proposal.clone())
    }

    /// Snapshots of all proposals, ordered by id.
    pub async fn list(&self) -> Vec<Proposal> {
        let entries: Vec<_> = self.proposals.read().await.values().cloned().collect();

        let mut proposals = Vec::with_capacity(entries.len());
        for entry in entries {
            proposals.push(entry.lock().await.clone());
        }
        proposals.sort_by_key(|p| p.id);
        proposals
    }
}

fn deployable(proposal: &Proposal) -> Result<(), RegistryError> {
    match proposal.status {
        ProposalStatus::Deployed => return Err(RegistryError::AlreadyDeployed(proposal.id)),
        ProposalStatus::Deploying | ProposalStatus::Failed => {
            return Err(RegistryError::InvalidState {
                id: proposal.id,
                status: proposal.status,
            })
        }
        ProposalStatus::Gathering | ProposalStatus::ThresholdMet => {}
    }

    if !proposal.threshold_reached() {
        return Err(RegistryError::ThresholdNotMet {
            id: proposal.id,
            current: proposal.participant_count(),
            required: proposal.config.min_participants,
        });
    }

    Ok(())
}

fn finalize(proposal: &mut Proposal) -> bool {
    let others = proposal.participant_count().saturating_sub(1);
    let Some(share) = equal_split_bp(others) else {
        return false;
    };

    for participant in proposal.participants.iter_mut().skip(1) {
        participant.allocation_bp = share;
    }
    true
}
