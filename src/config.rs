//! Operator configuration file handling.
//!
//! The operator file carries deployment settings (network, deployer account,
//! fees, confirmation budget) and the default `DaoConfig` that proposals start
//! from. Proposal-specific settings are never written back here: each proposal
//! keeps its own validated snapshot.
//!
//! Environment variables (`DAO_FACTORY_NETWORK`, `DAO_FACTORY_API_URL`,
//! `DAO_FACTORY_DEPLOYER`) override the file after loading.

use crate::dao::{DaoConfig, Network};
use crate::deploy::orchestrator::{
    DEFAULT_CALL_FEE, DEFAULT_DEADLINE, DEFAULT_DEPLOY_FEE, DEFAULT_MIN_BALANCE,
};
use crate::deploy::{ConfirmationPolicy, DeploymentPolicy};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_NETWORK: &str = "DAO_FACTORY_NETWORK";
pub const ENV_API_URL: &str = "DAO_FACTORY_API_URL";
pub const ENV_DEPLOYER: &str = "DAO_FACTORY_DEPLOYER";

/// Configuration errors.
///
/// Credential errors are fatal at factory construction; the rest surface when
/// a file is loaded or a config is merged.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Allocation splits must sum to 10000 bp, got {total}")]
    InvalidSplits { total: u32 },

    #[error("Invalid participant bounds: min {min}, max {max} (need 2 <= min <= max)")]
    ParticipantBounds { min: usize, max: usize },

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Failed to access config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactoryConfig {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub deployer: DeployerConfig,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Defaults every new proposal starts from
    #[serde(default)]
    pub dao: DaoConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub network: Network,

    /// REST API base URL (defaults to the public API for `network`)
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Account that deploys the contracts and pays the fees
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Minimum deployer balance in micro-STX
    pub min_balance: u64,
    pub deploy_fee: u64,
    pub call_fee: u64,
    pub confirmation_attempts: u32,
    #[serde(with = "serde_duration")]
    pub confirmation_interval: Duration,
    #[serde(with = "serde_duration")]
    pub deadline: Duration,
    /// Verifier allocation recipient (defaults to the deployer)
    pub verifier: Option<String>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        let confirmation = ConfirmationPolicy::default();
        Self {
            min_balance: DEFAULT_MIN_BALANCE,
            deploy_fee: DEFAULT_DEPLOY_FEE,
            call_fee: DEFAULT_CALL_FEE,
            confirmation_attempts: confirmation.max_attempts,
            confirmation_interval: confirmation.interval,
            deadline: DEFAULT_DEADLINE,
            verifier: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl FactoryConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: FactoryConfig = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the default location if it exists,
    /// otherwise built-in defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?;

        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, contents).map_err(io_err)?;

        Ok(())
    }

    /// Apply `DAO_FACTORY_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(network) = lookup(ENV_NETWORK) {
            self.network.network = network.parse().map_err(|_| {
                ConfigError::Invalid(format!("{}: unknown network '{}'", ENV_NETWORK, network))
            })?;
        }
        if let Some(api_url) = lookup(ENV_API_URL) {
            self.network.api_url = Some(api_url);
        }
        if let Some(deployer) = lookup(ENV_DEPLOYER) {
            self.deployer.address = Some(deployer);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dao.validate()?;

        if self.deployment.confirmation_attempts == 0 {
            return Err(ConfigError::Invalid(
                "confirmation_attempts must be at least 1".to_string(),
            ));
        }
        if self.deployment.deadline.is_zero() {
            return Err(ConfigError::Invalid("deadline must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn api_url(&self) -> String {
        self.network
            .api_url
            .clone()
            .unwrap_or_else(|| self.network.network.default_api_url().to_string())
    }

    /// Deployer address, checked against the configured network.
    pub fn deployer_address(&self) -> Result<&str, ConfigError> {
        let address = self
            .deployer
            .address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingCredentials(format!(
                    "deployer address not set (use [deployer] address or {})",
                    ENV_DEPLOYER
                ))
            })?;

        if !self.network.network.is_valid_address(address) {
            return Err(ConfigError::InvalidCredentials(format!(
                "'{}' is not a valid {} address",
                address, self.network.network
            )));
        }
        Ok(address)
    }

    /// Verifier allocation recipient: explicit setting, else the deployer.
    pub fn verifier_address(&self) -> Result<String, ConfigError> {
        match &self.deployment.verifier {
            Some(verifier) if self.network.network.is_valid_address(verifier) => {
                Ok(verifier.clone())
            }
            Some(verifier) => Err(ConfigError::Invalid(format!(
                "verifier '{}' is not a valid {} address",
                verifier, self.network.network
            ))),
            None => self.deployer_address().map(str::to_string),
        }
    }

    pub fn deployment_policy(&self) -> Result<DeploymentPolicy, ConfigError> {
        let deployment = &self.deployment;
        Ok(DeploymentPolicy {
            min_balance: BigUint::from(deployment.min_balance),
            confirmation: ConfirmationPolicy {
                max_attempts: deployment.confirmation_attempts,
                interval: deployment.confirmation_interval,
            },
            deadline: deployment.deadline,
            deploy_fee: deployment.deploy_fee,
            call_fee: deployment.call_fee,
            verifier: self.verifier_address()?,
        })
    }

    /// Default configuration content with comments
    pub fn generate_default_toml(network: Network) -> String {
        format!(
            r#"# DAO factory operator configuration
#
# Environment overrides: {env_network}, {env_api_url}, {env_deployer}
# Log filtering: RUST_LOG takes precedence over [logging] level

[network]
# "mainnet" or "testnet"
network = "{network}"

# REST API base URL (defaults to the public API for the network)
# api_url = "{api_url}"

[deployer]
# Account that deploys contracts and pays fees. Required for deployment.
# address = "ST..."

[deployment]
# Minimum deployer balance in micro-STX before anything is broadcast
min_balance = {min_balance}
deploy_fee = {deploy_fee}
call_fee = {call_fee}
confirmation_attempts = {attempts}
confirmation_interval = "{interval}"
deadline = "{deadline}"

# Verifier allocation recipient (defaults to the deployer)
# verifier = "ST..."

[dao]
name = "Community DAO"
symbol = "CDAO"
decimals = 6
total_supply = "1000000000000000"
min_participants = 3
max_participants = 100

[dao.splits]
founder_bp = 1500
participants_bp = 5000
treasury_bp = 3000
verifier_bp = 500

[dao.governance]
voting_period_blocks = 1440
quorum_bp = 2000
approval_threshold_bp = 5000
execution_delay_blocks = 144

[logging]
level = "{log_level}"
"#,
            env_network = ENV_NETWORK,
            env_api_url = ENV_API_URL,
            env_deployer = ENV_DEPLOYER,
            network = network,
            api_url = network.default_api_url(),
            min_balance = DEFAULT_MIN_BALANCE,
            deploy_fee = DEFAULT_DEPLOY_FEE,
            call_fee = DEFAULT_CALL_FEE,
            attempts = ConfirmationPolicy::default().max_attempts,
            interval = humantime::format_duration(ConfirmationPolicy::default().interval),
            deadline = humantime::format_duration(DEFAULT_DEADLINE),
            log_level = DEFAULT_LOG_LEVEL,
        )
    }
}

/// `~/.config/dao-factory/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dao-factory")
        .join("config.toml")
}

/// Durations as humantime strings (`"10s"`, `"30m"`).
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
