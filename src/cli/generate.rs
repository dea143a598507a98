use dao_factory::config::FactoryConfig;
use dao_factory::dao::address::contract_principal;
use dao_factory::dao::{ConfigOverrides, DaoConfig};
use dao_factory::deploy::{ClarityTemplates, ContractKind, ContractTemplates};
use std::fs;
use std::path::{Path, PathBuf};

/// Render the three contract sources into `out`
pub fn execute(
    config: &FactoryConfig,
    name: &str,
    symbol: &str,
    out: &Path,
    deployer: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dao = config
        .dao
        .with_overrides(ConfigOverrides::named(name, symbol))?;

    let deployer = match deployer {
        Some(address) => {
            if !config.network.network.is_valid_address(&address) {
                return Err(format!(
                    "'{}' is not a valid {} address",
                    address, config.network.network
                )
                .into());
            }
            address
        }
        None => config.deployer_address()?.to_string(),
    };

    let written = write_contracts(&ClarityTemplates, &dao, &deployer, out)?;

    println!("Generated contracts for {} ({})", dao.name, dao.symbol);
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

/// Write `{slug}-{kind}.clar` for each contract kind, in deployment order.
pub fn write_contracts<T: ContractTemplates>(
    templates: &T,
    dao: &DaoConfig,
    deployer: &str,
    out: &Path,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    fs::create_dir_all(out)
        .map_err(|e| format!("Failed to create output directory '{}': {}", out.display(), e))?;

    let slug = dao.contract_slug();
    let token = contract_principal(deployer, &ContractKind::Token.contract_name(&slug));
    let treasury = contract_principal(deployer, &ContractKind::Treasury.contract_name(&slug));

    let mut written = Vec::with_capacity(ContractKind::ALL.len());
    for kind in ContractKind::ALL {
        let source = match kind {
            ContractKind::Token => templates.token(dao),
            ContractKind::Treasury => templates.treasury(dao, &token),
            ContractKind::Governance => templates.governance(dao, &token, &treasury),
        };

        let path = out.join(format!("{}.clar", kind.contract_name(&slug)));
        fs::write(&path, source)
            .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
        written.push(path);
    }

    Ok(written)
}
