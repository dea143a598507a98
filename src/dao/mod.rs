//! Proposal domain: configuration, allocation math and the proposal registry.
//!
//! Lifecycle:
//! - proposer creates a proposal (GATHERING)
//! - participants are whitelisted until the threshold is met (THRESHOLD_MET)
//! - allocations are finalized right before deployment (DEPLOYING)
//! - the deployment outcome is recorded (DEPLOYED or FAILED)

pub mod address;
pub mod allocation;
pub mod config;
pub mod proposal;
pub mod registry;
pub mod serde_amount;

#[cfg(test)]
mod proptests;

pub use address::Network;
pub use allocation::{
    bp_share, equal_split_bp, split_supply, token_allocations, AllocationClass, SupplySplit,
    TokenAllocation, BASIS_POINTS,
};
pub use config::{AllocationSplits, ConfigOverrides, DaoConfig, GovernanceParams};
pub use proposal::{Participant, Proposal, ProposalStatus};
pub use registry::{DeploymentPlan, ProposalRegistry, RegistryError};
