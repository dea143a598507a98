use dao_factory::chain::{ChainClient, HttpChainClient};
use dao_factory::config::FactoryConfig;
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Micro-STX per STX
const MICRO_PER_STX: u64 = 1_000_000;

/// Show the deployer account's balance and next nonce
pub async fn execute(config: &FactoryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let deployer = config.deployer_address()?;
    let api_url = config.api_url();
    let chain = HttpChainClient::new(&api_url)?;

    println!("DAO Factory Status");
    println!();
    println!("  Network:  {}", config.network.network);
    println!("  API:      {}", chain.api_url());
    println!("  Deployer: {}", deployer);

    let balance = chain.balance(deployer).await?;
    let nonce = chain.next_nonce(deployer).await?;
    let required = BigUint::from(config.deployment.min_balance);

    println!("  Balance:  {}", format_stx(&balance));
    println!("  Nonce:    {}", nonce);
    println!();

    if balance >= required {
        println!("Ready to deploy (minimum {})", format_stx(&required));
    } else {
        println!("Balance below deployment minimum of {}", format_stx(&required));
    }

    Ok(())
}

/// Render micro-STX as `STX.micro`, e.g. `1.500000 STX`.
fn format_stx(micro: &BigUint) -> String {
    let divisor = BigUint::from(MICRO_PER_STX);
    let whole = micro / &divisor;
    let fraction = (micro % &divisor).to_u64().unwrap_or(0);
    format!("{}.{:06} STX", whole, fraction)
}
