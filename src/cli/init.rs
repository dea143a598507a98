use dao_factory::config::{default_config_path, FactoryConfig};
use dao_factory::dao::Network;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a commented default configuration file
pub fn execute(
    path: Option<PathBuf>,
    network: &str,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let network: Network = network
        .parse()
        .map_err(|_| format!("Unknown network '{}' (expected mainnet or testnet)", network))?;
    let path = path.unwrap_or_else(default_config_path);

    write_default(&path, network, force)?;

    println!("Wrote {}", path.display());
    println!("Set [deployer] address before deploying.");
    Ok(())
}

fn write_default(
    path: &Path,
    network: Network,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    fs::write(path, FactoryConfig::generate_default_toml(network))
        .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

    Ok(())
}
