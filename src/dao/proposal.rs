//! Proposal and participant records.

use super::allocation::BASIS_POINTS;
use super::config::DaoConfig;
use crate::chain::TxId;
use crate::deploy::ContractKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Proposal lifecycle state.
///
/// ```text
/// Gathering -> ThresholdMet -> Deploying -> Deployed
///                                      \--> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Collecting whitelisted participants
    Gathering,
    /// Enough participants to deploy
    ThresholdMet,
    /// Deployment pipeline running
    Deploying,
    /// Contracts deployed and tokens distributed (terminal)
    Deployed,
    /// Deployment aborted (terminal)
    Failed,
}

impl ProposalStatus {
    /// Whether participants may still join.
    pub fn accepts_participants(&self) -> bool {
        matches!(self, ProposalStatus::Gathering | ProposalStatus::ThresholdMet)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Deployed | ProposalStatus::Failed)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalStatus::Gathering => "GATHERING",
            ProposalStatus::ThresholdMet => "THRESHOLD_MET",
            ProposalStatus::Deploying => "DEPLOYING",
            ProposalStatus::Deployed => "DEPLOYED",
            ProposalStatus::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Whitelisted participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: String,
    pub name: String,
    pub verified: bool,
    /// Share of the participant pool (bp). Rewritten during finalization.
    pub allocation_bp: u16,
    pub joined_at: u64,
    /// Reserved for claim-based distribution
    pub claimed: bool,
    /// External identity reference (forum handle, ticket id, ...)
    pub external_ref: Option<String>,
}

impl Participant {
    pub fn new(
        address: String,
        name: String,
        verified: bool,
        external_ref: Option<String>,
    ) -> Self {
        Self {
            address,
            name,
            verified,
            allocation_bp: 0,
            joined_at: now_secs(),
            claimed: false,
            external_ref,
        }
    }
}

/// Proposed DAO and its deployment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    /// Discussion thread the proposal originated from
    pub discussion_ref: String,
    pub config: DaoConfig,
    pub proposer: String,
    /// Index 0 is always the proposer
    pub participants: Vec<Participant>,
    pub status: ProposalStatus,
    pub created_at: u64,
    pub threshold_met_at: Option<u64>,
    pub deployed_at: Option<u64>,
    pub contracts: BTreeMap<ContractKind, String>,
    pub tx_ids: Vec<TxId>,
    pub error: Option<String>,
}

impl Proposal {
    pub fn new(
        id: u64,
        discussion_ref: String,
        config: DaoConfig,
        proposer: String,
        proposer_name: String,
    ) -> Self {
        let mut founder = Participant::new(proposer.clone(), proposer_name, true, None);
        founder.allocation_bp = BASIS_POINTS;

        Self {
            id,
            discussion_ref,
            config,
            proposer,
            participants: vec![founder],
            status: ProposalStatus::Gathering,
            created_at: now_secs(),
            threshold_met_at: None,
            deployed_at: None,
            contracts: BTreeMap::new(),
            tx_ids: Vec::new(),
            error: None,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn has_participant(&self, address: &str) -> bool {
        self.participants.iter().any(|p| p.address == address)
    }

    pub fn threshold_reached(&self) -> bool {
        self.participant_count() >= self.config.min_participants
    }
}

/// Current unix time in seconds.
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
