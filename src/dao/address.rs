//! Chain address format and network selection.
//!
//! A standard principal is a two-letter network prefix followed by the
//! c32-encoded key hash, e.g. `ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM`.
//! Contract principals append `.contract-name` to a standard principal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum length of a standard principal, prefix included.
///
/// Leading zero bytes of the key hash encode to a single `0` each, so
/// principals shrink down to the all-zero hash `SP000000000000000000002Q6VF78`.
pub const MIN_ADDRESS_LEN: usize = 28;

/// Maximum length of a standard principal, prefix included.
pub const MAX_ADDRESS_LEN: usize = 41;

/// Network the factory deploys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    /// Address prefixes valid on this network (single-sig, multi-sig).
    pub fn address_prefixes(&self) -> [&'static str; 2] {
        match self {
            Network::Mainnet => ["SP", "SM"],
            Network::Testnet => ["ST", "SN"],
        }
    }

    /// Public API endpoint used when the operator does not configure one.
    pub fn default_api_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet.hiro.so",
            Network::Testnet => "https://api.testnet.hiro.so",
        }
    }

    /// Check a standard principal against this network's address format.
    pub fn is_valid_address(&self, address: &str) -> bool {
        let len = address.len();
        if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
            return false;
        }

        if !address.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }

        self.address_prefixes()
            .iter()
            .any(|prefix| address.starts_with(prefix))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(format!(
                "Unknown network: {}. Use 'mainnet' or 'testnet'.",
                other
            )),
        }
    }
}

/// Contract principal for a contract deployed by `deployer`.
pub fn contract_principal(deployer: &str, contract_name: &str) -> String {
    format!("{}.{}", deployer, contract_name)
}
