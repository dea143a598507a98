use dao_factory::config::FactoryConfig;
use dao_factory::dao::{
    bp_share, equal_split_bp, split_supply, ConfigOverrides, DaoConfig, BASIS_POINTS,
};
use num_bigint::BigUint;
use std::fmt::Write;

/// Print the supply split for a DAO with `participants` members
pub fn execute(
    config: &FactoryConfig,
    name: &str,
    symbol: &str,
    participants: usize,
    supply: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let total_supply = match supply {
        Some(raw) => Some(
            raw.replace('_', "")
                .parse::<BigUint>()
                .map_err(|e| format!("Invalid supply '{}': {}", raw, e))?,
        ),
        None => None,
    };

    let dao = config.dao.with_overrides(ConfigOverrides {
        total_supply,
        ..ConfigOverrides::named(name, symbol)
    })?;

    print!("{}", render(&dao, participants));
    Ok(())
}

/// Allocation table for `participants` members, proposer included, after
/// equal-split finalization.
fn render(dao: &DaoConfig, participants: usize) -> String {
    let split = split_supply(&dao.total_supply, &dao.splits);
    let mut out = String::new();

    let _ = writeln!(out, "{} ({})", dao.name, dao.symbol);
    let _ = writeln!(out, "Total supply: {}", dao.total_supply);
    let _ = writeln!(out);

    let rows = [
        ("founder", dao.splits.founder_bp, &split.founder),
        ("participant pool", dao.splits.participants_bp, &split.participant_pool),
        ("treasury", dao.splits.treasury_bp, &split.treasury),
        ("verifier", dao.splits.verifier_bp, &split.verifier),
    ];
    for (label, bp, amount) in rows {
        let _ = writeln!(out, "  {:<18} {:>5} bp  {}", label, bp, amount);
    }
    let _ = writeln!(out);

    let others = participants.saturating_sub(1);
    match equal_split_bp(others) {
        Some(share) => {
            let each = bp_share(&split.participant_pool, share);
            let distributed = &each * BigUint::from(others);
            let _ = writeln!(out, "  {} participants besides the proposer", others);
            let _ = writeln!(out, "  each: {} bp of pool = {}", share, each);
            let _ = writeln!(
                out,
                "  rounding loss: {}",
                &split.participant_pool - distributed
            );
        }
        None => {
            let _ = writeln!(out, "  no participants besides the proposer");
        }
    }

    let unallocated = &dao.total_supply - split.total();
    if unallocated > BigUint::from(0u32) {
        let _ = writeln!(
            out,
            "  unallocated (floor of {} bp splits): {}",
            BASIS_POINTS, unallocated
        );
    }

    out
}
