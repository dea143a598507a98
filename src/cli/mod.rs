use clap::{Parser, Subcommand};
use dao_factory::config::FactoryConfig;
use std::path::PathBuf;

pub mod allocations;
pub mod generate;
pub mod init;
pub mod status;
pub mod version;

#[derive(Parser)]
#[command(name = "dao-factory")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the DAO factory", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.config/dao-factory/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a commented default config file
    Init {
        /// Network the file targets (mainnet or testnet)
        #[arg(long, default_value = "testnet")]
        network: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Render the token, treasury and governance contract sources
    Generate {
        /// DAO display name
        #[arg(long)]
        name: String,

        /// Token symbol (1-12 alphanumerics)
        #[arg(long)]
        symbol: String,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Deployer address used for contract references (default: from config)
        #[arg(long)]
        deployer: Option<String>,
    },

    /// Show deployer balance and next nonce
    Status,

    /// Print the token supply split for a DAO
    Allocations {
        #[arg(long)]
        name: String,

        #[arg(long)]
        symbol: String,

        /// Participants including the proposer
        #[arg(long, default_value_t = 3)]
        participants: usize,

        /// Total supply in base units (default: from config)
        #[arg(long)]
        supply: Option<String>,
    },

    /// Display version information
    Version,
}

/// Log level to fall back on when `RUST_LOG` is unset.
pub fn log_level(cli: &Cli) -> String {
    FactoryConfig::resolve(cli.config.as_deref())
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".to_string())
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init { network, force } => init::execute(cli.config, &network, force),
        Commands::Generate {
            name,
            symbol,
            out,
            deployer,
        } => {
            let config = FactoryConfig::resolve(cli.config.as_deref())?;
            generate::execute(&config, &name, &symbol, &out, deployer)
        }
        Commands::Status => {
            let config = FactoryConfig::resolve(cli.config.as_deref())?;
            status::execute(&config).await
        }
        Commands::Allocations {
            name,
            symbol,
            participants,
            supply,
        } => {
            let config = FactoryConfig::resolve(cli.config.as_deref())?;
            allocations::execute(&config, &name, &symbol, participants, supply)
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate() {
        let cli = Cli::parse_from([
            "dao-factory",
            "generate",
            "--name",
            "River DAO",
            "--symbol",
            "RIVR",
        ]);

        match cli.command {
            Commands::Generate {
                name,
                symbol,
                out,
                deployer,
            } => {
                assert_eq!(name, "River DAO");
                assert_eq!(symbol, "RIVR");
                assert_eq!(out, PathBuf::from("."));
                assert!(deployer.is_none());
            }
            _ => panic!("Expected Generate command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_global_config() {
        let cli = Cli::parse_from(["dao-factory", "status", "--config", "/etc/dao-factory.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/dao-factory.toml")));
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn test_cli_parse_allocations() {
        let cli = Cli::parse_from([
            "dao-factory",
            "allocations",
            "--name",
            "River DAO",
            "--symbol",
            "RIVR",
            "--participants",
            "5",
            "--supply",
            "1000000",
        ]);

        match cli.command {
            Commands::Allocations {
                participants,
                supply,
                ..
            } => {
                assert_eq!(participants, 5);
                assert_eq!(supply.as_deref(), Some("1000000"));
            }
            _ => panic!("Expected Allocations command"),
        }
    }

    #[test]
    fn test_cli_parse_allocations_defaults() {
        let cli = Cli::parse_from([
            "dao-factory",
            "allocations",
            "--name",
            "River DAO",
            "--symbol",
            "RIVR",
        ]);

        match cli.command {
            Commands::Allocations {
                participants,
                supply,
                ..
            } => {
                assert_eq!(participants, 3);
                assert!(supply.is_none());
            }
            _ => panic!("Expected Allocations command"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["dao-factory", "init", "--network", "mainnet", "--force"]);

        match cli.command {
            Commands::Init { network, force } => {
                assert_eq!(network, "mainnet");
                assert!(force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["dao-factory", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_requires_symbol() {
        let result = Cli::try_parse_from(["dao-factory", "generate", "--name", "River DAO"]);
        assert!(result.is_err());
    }
}
