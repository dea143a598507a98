//! DAO configuration snapshot.
//!
//! A `DaoConfig` is copied into every proposal at creation time and never
//! re-read from the operator defaults afterwards. Partial caller overrides go
//! through [`DaoConfig::with_overrides`], which validates the merged result.

use super::allocation::BASIS_POINTS;
use super::serde_amount;
use crate::config::ConfigError;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Maximum token symbol length accepted by the token template.
pub const MAX_SYMBOL_LEN: usize = 12;

/// Basis-point split of the total supply across recipient classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSplits {
    pub founder_bp: u16,
    pub participants_bp: u16,
    pub treasury_bp: u16,
    pub verifier_bp: u16,
}

impl AllocationSplits {
    /// Sum of the four weights, widened so overflow cannot hide a bad config.
    pub fn total(&self) -> u32 {
        u32::from(self.founder_bp)
            + u32::from(self.participants_bp)
            + u32::from(self.treasury_bp)
            + u32::from(self.verifier_bp)
    }
}

impl Default for AllocationSplits {
    fn default() -> Self {
        Self {
            founder_bp: 1_500,
            participants_bp: 5_000,
            treasury_bp: 3_000,
            verifier_bp: 500,
        }
    }
}

/// On-chain governance parameters baked into the governance contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Blocks a governance vote stays open
    pub voting_period_blocks: u64,
    /// Share of supply that must vote (bp)
    pub quorum_bp: u16,
    /// Share of cast votes required to pass (bp)
    pub approval_threshold_bp: u16,
    /// Blocks between a passed vote and execution
    pub execution_delay_blocks: u64,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            voting_period_blocks: 1_440,
            quorum_bp: 2_000,
            approval_threshold_bp: 5_000,
            execution_delay_blocks: 144,
        }
    }
}

/// Missing fields in a serialized config fall back to [`DaoConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaoConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "serde_amount")]
    pub total_supply: BigUint,
    pub splits: AllocationSplits,
    pub governance: GovernanceParams,
    /// Participants required before deployment, proposer included
    pub min_participants: usize,
    /// Whitelist capacity, proposer included
    pub max_participants: usize,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            name: "Community DAO".to_string(),
            symbol: "CDAO".to_string(),
            decimals: 6,
            // 1 billion tokens at 6 decimals
            total_supply: BigUint::from(1_000_000_000_000_000u64),
            splits: AllocationSplits::default(),
            governance: GovernanceParams::default(),
            min_participants: 3,
            max_participants: 100,
        }
    }
}

/// Caller-supplied partial configuration. Set fields replace the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    #[serde(default, with = "optional_amount")]
    pub total_supply: Option<BigUint>,
    pub splits: Option<AllocationSplits>,
    pub governance: Option<GovernanceParams>,
    pub min_participants: Option<usize>,
    pub max_participants: Option<usize>,
}

impl ConfigOverrides {
    pub fn named(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            symbol: Some(symbol.into()),
            ..Default::default()
        }
    }
}

impl DaoConfig {
    /// Merge `overrides` over `self` and validate the result.
    ///
    /// Nested groups (`splits`, `governance`) are replaced as a whole.
    pub fn with_overrides(&self, overrides: ConfigOverrides) -> Result<DaoConfig, ConfigError> {
        let merged = DaoConfig {
            name: overrides.name.unwrap_or_else(|| self.name.clone()),
            symbol: overrides.symbol.unwrap_or_else(|| self.symbol.clone()),
            decimals: overrides.decimals.unwrap_or(self.decimals),
            total_supply: overrides
                .total_supply
                .unwrap_or_else(|| self.total_supply.clone()),
            splits: overrides.splits.unwrap_or(self.splits),
            governance: overrides.governance.unwrap_or(self.governance),
            min_participants: overrides.min_participants.unwrap_or(self.min_participants),
            max_participants: overrides.max_participants.unwrap_or(self.max_participants),
        };

        merged.validate()?;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("DAO name cannot be empty".to_string()));
        }

        if self.symbol.is_empty()
            || self.symbol.len() > MAX_SYMBOL_LEN
            || !self.symbol.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ConfigError::Invalid(format!(
                "Token symbol must be 1-{} ASCII alphanumerics. Got: '{}'",
                MAX_SYMBOL_LEN, self.symbol
            )));
        }

        if self.total_supply.is_zero() {
            return Err(ConfigError::Invalid(
                "Total supply must be greater than zero".to_string(),
            ));
        }

        let total = self.splits.total();
        if total != u32::from(BASIS_POINTS) {
            return Err(ConfigError::InvalidSplits { total });
        }

        let gov = &self.governance;
        if gov.quorum_bp > BASIS_POINTS || gov.approval_threshold_bp > BASIS_POINTS {
            return Err(ConfigError::Invalid(format!(
                "Quorum and approval threshold must be at most {} bp",
                BASIS_POINTS
            )));
        }

        if self.min_participants < 2 || self.min_participants > self.max_participants {
            return Err(ConfigError::ParticipantBounds {
                min: self.min_participants,
                max: self.max_participants,
            });
        }

        Ok(())
    }

    /// Lowercase symbol used as the contract-name stem.
    pub fn contract_slug(&self) -> String {
        self.symbol.to_ascii_lowercase()
    }
}

mod optional_amount {
    use super::serde_amount;
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<BigUint>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(amount) => serde_amount::serialize(amount, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigUint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "serde_amount")] BigUint);

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(amount)| amount))
    }
}
