//! Bounded confirmation polling.
//!
//! After a broadcast we poll the transaction status until the ledger either
//! accepts it or definitively rejects it:
//! - `Success` → confirmed
//! - abort/dropped statuses → rejected immediately, no further polls
//! - `NotFound`, `Pending`, unknown statuses, transient network errors → retry
//! - retry budget exhausted → timed out
//!
//! The budget is per transaction. The overall deployment deadline is enforced
//! by the orchestrator around the whole pipeline.

use crate::chain::{ChainClient, ChainError, TxId, TxStatus};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Default attempts per transaction.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default delay between attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Retry budget for confirming one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Outcome of polling one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed { attempts: u32 },
    Rejected(TxStatus),
    TimedOut { attempts: u32 },
}

/// Poll `txid` until it confirms, is rejected, or the budget runs out.
///
/// Returns `Err` only for non-transient chain errors; everything else is a
/// tagged [`Confirmation`].
pub async fn await_confirmation<C>(
    chain: &C,
    txid: &TxId,
    policy: &ConfirmationPolicy,
) -> Result<Confirmation, ChainError>
where
    C: ChainClient + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        match chain.tx_status(txid).await {
            Ok(status) if status.is_success() => {
                info!(%txid, attempt, "transaction confirmed");
                return Ok(Confirmation::Confirmed { attempts: attempt });
            }
            Ok(status) if status.is_rejected() => {
                warn!(%txid, %status, "transaction rejected");
                return Ok(Confirmation::Rejected(status));
            }
            Ok(status) => {
                debug!(%txid, %status, attempt, max = policy.max_attempts, "awaiting confirmation");
            }
            Err(err) if err.is_transient() => {
                warn!(%txid, attempt, error = %err, "status query failed, will retry");
            }
            Err(err) => return Err(err),
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    warn!(%txid, attempts = policy.max_attempts, "confirmation budget exhausted");
    Ok(Confirmation::TimedOut {
        attempts: policy.max_attempts,
    })
}
