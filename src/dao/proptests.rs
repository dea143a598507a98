//! Property-based tests for allocation math and the proposal state machine
//!
//! Tests for:
//! - Supply split: floor semantics, no over-allocation
//! - Equal split: per-participant share never exceeds the pool
//! - Registry: duplicate rejection, monotonic threshold transition

use super::address::Network;
use super::allocation::{bp_share, equal_split_bp, split_supply, BASIS_POINTS};
use super::config::{AllocationSplits, ConfigOverrides, DaoConfig};
use super::proposal::ProposalStatus;
use super::registry::{ProposalRegistry, RegistryError};
use num_bigint::BigUint;
use proptest::prelude::*;

/// Four basis-point weights summing to exactly 10000.
fn splits_strategy() -> impl Strategy<Value = AllocationSplits> {
    (0..=BASIS_POINTS, 0..=BASIS_POINTS, 0..=BASIS_POINTS).prop_map(|(a, b, c)| {
        let mut cuts = [a, b, c];
        cuts.sort_unstable();
        AllocationSplits {
            founder_bp: cuts[0],
            participants_bp: cuts[1] - cuts[0],
            treasury_bp: cuts[2] - cuts[1],
            verifier_bp: BASIS_POINTS - cuts[2],
        }
    })
}

/// Supplies well beyond 2^53, built from two u64 limbs.
fn supply_strategy() -> impl Strategy<Value = BigUint> {
    (any::<u64>(), any::<u64>())
        .prop_map(|(hi, lo)| (BigUint::from(hi) << 64u32) + BigUint::from(lo))
}

fn addr(n: usize) -> String {
    format!("ST{:0>39}", n)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

// ============================================================================
// ALLOCATION PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: each class amount is floor(S * bp / 10000) and the four
    /// amounts never exceed S
    #[test]
    fn split_never_exceeds_supply(splits in splits_strategy(), supply in supply_strategy()) {
        prop_assert_eq!(splits.total(), u32::from(BASIS_POINTS));

        let split = split_supply(&supply, &splits);
        let ten_k = BigUint::from(BASIS_POINTS);

        prop_assert_eq!(&split.founder, &(&supply * BigUint::from(splits.founder_bp) / &ten_k));
        prop_assert_eq!(
            &split.participant_pool,
            &(&supply * BigUint::from(splits.participants_bp) / &ten_k)
        );
        prop_assert_eq!(&split.treasury, &(&supply * BigUint::from(splits.treasury_bp) / &ten_k));
        prop_assert_eq!(&split.verifier, &(&supply * BigUint::from(splits.verifier_bp) / &ten_k));
        prop_assert!(split.total() <= supply);
    }

    /// Property: the split is exact when S is a multiple of 10000
    #[test]
    fn split_exact_for_multiples(splits in splits_strategy(), units in any::<u64>()) {
        let supply = BigUint::from(units) * BigUint::from(BASIS_POINTS);
        prop_assert_eq!(split_supply(&supply, &splits).total(), supply);
    }

    /// Property: equal split shares never sum past 100%
    #[test]
    fn equal_split_fits_pool(others in 1usize..=10_000) {
        let share = equal_split_bp(others).unwrap();
        prop_assert_eq!(share, BASIS_POINTS / others as u16);
        prop_assert!(others as u64 * share as u64 <= BASIS_POINTS as u64);
    }

    /// Property: participant amounts from an equal split never exceed the pool
    #[test]
    fn participant_amounts_fit_pool(pool in supply_strategy(), others in 1usize..=500) {
        let share = equal_split_bp(others).unwrap();
        let total = bp_share(&pool, share) * BigUint::from(others);
        prop_assert!(total <= pool);
    }
}

// ============================================================================
// REGISTRY PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: finalization assigns floor(10000/(N-1)) to every non-proposer
    #[test]
    fn finalize_assigns_equal_split(joiners in 1usize..40) {
        runtime().block_on(async {
            let registry = ProposalRegistry::new(Network::Testnet);
            let config = DaoConfig::default()
                .with_overrides(ConfigOverrides {
                    min_participants: Some(2),
                    max_participants: Some(64),
                    ..Default::default()
                })
                .unwrap();
            let id = registry
                .create_proposal("t".to_string(), addr(0), "p".to_string(), config)
                .await;
            for n in 1..=joiners {
                registry
                    .add_participant(id, addr(n), "m".to_string(), true, None)
                    .await
                    .unwrap();
            }

            assert!(registry.finalize_allocations(id).await);
            let proposal = registry.get(id).await.unwrap();
            let expected = BASIS_POINTS / joiners as u16;
            assert!(proposal.participants[1..].iter().all(|p| p.allocation_bp == expected));
            assert!(joiners as u32 * expected as u32 <= BASIS_POINTS as u32);
        });
    }

    /// Property: once out of GATHERING, adds never move the status back,
    /// and repeated addresses are always rejected as duplicates
    #[test]
    fn threshold_is_monotonic(
        min in 2usize..6,
        picks in prop::collection::vec(1usize..8, 1..30),
    ) {
        runtime().block_on(async {
            let registry = ProposalRegistry::new(Network::Testnet);
            let config = DaoConfig::default()
                .with_overrides(ConfigOverrides {
                    min_participants: Some(min),
                    max_participants: Some(6),
                    ..Default::default()
                })
                .unwrap();
            let id = registry
                .create_proposal("t".to_string(), addr(0), "p".to_string(), config)
                .await;

            let mut left_gathering = false;
            let mut seen = std::collections::HashSet::new();
            for n in picks {
                let before = registry.get(id).await.unwrap().participants.clone();
                let result = registry
                    .add_participant(id, addr(n), "m".to_string(), true, None)
                    .await;

                if seen.contains(&n) {
                    // capacity is checked before duplicates
                    assert!(matches!(
                        result,
                        Err(RegistryError::Duplicate(_) | RegistryError::CapacityExceeded { .. })
                    ));
                    assert_eq!(registry.get(id).await.unwrap().participants, before);
                } else if result.is_ok() {
                    seen.insert(n);
                }

                let status = registry.get(id).await.unwrap().status;
                if left_gathering {
                    assert_ne!(status, ProposalStatus::Gathering);
                }
                left_gathering |= status != ProposalStatus::Gathering;
            }
        });
    }
}
