//! Token allocation arithmetic.
//!
//! Everything here uses floor division on `BigUint`. Remainders from
//! truncation are never redistributed: the few base units they represent are
//! simply not minted.

use super::proposal::{Participant, Proposal};
use super::serde_amount;
use crate::dao::config::AllocationSplits;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 100% expressed in basis points.
pub const BASIS_POINTS: u16 = 10_000;

/// Recipient class of a token allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationClass {
    Founder,
    Participant,
    Treasury,
    Verifier,
}

impl fmt::Display for AllocationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllocationClass::Founder => "founder",
            AllocationClass::Participant => "participant",
            AllocationClass::Treasury => "treasury",
            AllocationClass::Verifier => "verifier",
        };
        write!(f, "{}", name)
    }
}

/// Derived, read-only allocation record. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAllocation {
    pub recipient: String,
    #[serde(with = "serde_amount")]
    pub amount: BigUint,
    pub class: AllocationClass,
    pub basis_points: u16,
}

/// Top-level split of the total supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplySplit {
    pub founder: BigUint,
    pub participant_pool: BigUint,
    pub treasury: BigUint,
    pub verifier: BigUint,
}

impl SupplySplit {
    pub fn total(&self) -> BigUint {
        &self.founder + &self.participant_pool + &self.treasury + &self.verifier
    }
}

/// `floor(amount * bp / 10000)`
pub fn bp_share(amount: &BigUint, bp: u16) -> BigUint {
    amount * BigUint::from(bp) / BigUint::from(BASIS_POINTS)
}

pub fn split_supply(total: &BigUint, splits: &AllocationSplits) -> SupplySplit {
    SupplySplit {
        founder: bp_share(total, splits.founder_bp),
        participant_pool: bp_share(total, splits.participants_bp),
        treasury: bp_share(total, splits.treasury_bp),
        verifier: bp_share(total, splits.verifier_bp),
    }
}

/// Equal share of the participant pool for each non-proposer participant.
///
/// Returns `None` when there is nobody to share with.
pub fn equal_split_bp(non_proposer_count: usize) -> Option<u16> {
    if non_proposer_count == 0 {
        return None;
    }
    let count = u16::try_from(non_proposer_count).unwrap_or(u16::MAX);
    Some(BASIS_POINTS / count)
}

/// Participants that receive a `distribute-participant` call, in list order.
pub fn eligible_participants(proposal: &Proposal) -> impl Iterator<Item = &Participant> {
    proposal
        .participants
        .iter()
        .skip(1)
        .filter(|p| p.allocation_bp > 0)
}

/// Full allocation table in distribution order: founder, eligible
/// participants, treasury, verifier.
pub fn token_allocations(
    proposal: &Proposal,
    treasury: &str,
    verifier: &str,
) -> Vec<TokenAllocation> {
    let config = &proposal.config;
    let split = split_supply(&config.total_supply, &config.splits);

    let mut allocations = Vec::with_capacity(proposal.participants.len() + 3);

    allocations.push(TokenAllocation {
        recipient: proposal.proposer.clone(),
        amount: split.founder,
        class: AllocationClass::Founder,
        basis_points: config.splits.founder_bp,
    });

    for participant in eligible_participants(proposal) {
        allocations.push(TokenAllocation {
            recipient: participant.address.clone(),
            amount: bp_share(&split.participant_pool, participant.allocation_bp),
            class: AllocationClass::Participant,
            basis_points: participant.allocation_bp,
        });
    }

    allocations.push(TokenAllocation {
        recipient: treasury.to_string(),
        amount: split.treasury,
        class: AllocationClass::Treasury,
        basis_points: config.splits.treasury_bp,
    });

    allocations.push(TokenAllocation {
        recipient: verifier.to_string(),
        amount: split.verifier,
        class: AllocationClass::Verifier,
        basis_points: config.splits.verifier_bp,
    });

    allocations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::config::DaoConfig;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_bp_share_floors() {
        assert_eq!(bp_share(&big(10_000), 1), big(1));
        assert_eq!(bp_share(&big(9_999), 1), big(0));
        assert_eq!(bp_share(&big(3), 3_333), big(0));
        assert_eq!(bp_share(&big(1_000_000), 2_500), big(250_000));
    }

    #[test]
    fn test_bp_share_beyond_u64() {
        let supply: BigUint = "1000000000000000000000000000".parse().unwrap();
        let share = bp_share(&supply, 1_500);
        assert_eq!(share, "150000000000000000000000000".parse::<BigUint>().unwrap());
    }

    #[test]
    fn test_split_supply_exact() {
        let split = split_supply(&big(1_000_000), &AllocationSplits::default());
        assert_eq!(split.founder, big(150_000));
        assert_eq!(split.participant_pool, big(500_000));
        assert_eq!(split.treasury, big(300_000));
        assert_eq!(split.verifier, big(50_000));
        assert_eq!(split.total(), big(1_000_000));
    }

    #[test]
    fn test_split_supply_rounding_loss() {
        let splits = AllocationSplits {
            founder_bp: 3_333,
            participants_bp: 3_333,
            treasury_bp: 3_333,
            verifier_bp: 1,
        };
        let split = split_supply(&big(10_001), &splits);
        assert!(split.total() <= big(10_001));
        assert_eq!(split.founder, big(3_333));
        assert_eq!(split.verifier, big(1));
    }

    #[test]
    fn test_equal_split_bp() {
        assert_eq!(equal_split_bp(0), None);
        assert_eq!(equal_split_bp(1), Some(10_000));
        assert_eq!(equal_split_bp(3), Some(3_333));
        assert_eq!(equal_split_bp(7), Some(1_428));
        assert_eq!(equal_split_bp(20_000), Some(0));
    }

    #[test]
    fn test_token_allocations_order_and_skip() {
        let mut proposal = Proposal::new(
            1,
            "forum#1".to_string(),
            DaoConfig::default(),
            "ST1FOUNDER".to_string(),
            "Founder".to_string(),
        );
        for (address, bp) in [("ST1A", 5_000u16), ("ST1B", 0), ("ST1C", 5_000)] {
            let mut participant =
                Participant::new(address.to_string(), address.to_string(), true, None);
            participant.allocation_bp = bp;
            proposal.participants.push(participant);
        }

        let allocations = token_allocations(&proposal, "ST1DEPLOYER.cdao-treasury", "ST1VERIFIER");
        let classes: Vec<_> = allocations.iter().map(|a| a.class).collect();
        assert_eq!(
            classes,
            vec![
                AllocationClass::Founder,
                AllocationClass::Participant,
                AllocationClass::Participant,
                AllocationClass::Treasury,
                AllocationClass::Verifier,
            ]
        );
        assert_eq!(allocations[1].recipient, "ST1A");
        assert_eq!(allocations[2].recipient, "ST1C");

        let pool = bp_share(&proposal.config.total_supply, proposal.config.splits.participants_bp);
        assert_eq!(allocations[1].amount, bp_share(&pool, 5_000));
        assert_eq!(allocations[3].recipient, "ST1DEPLOYER.cdao-treasury");
    }
}
