/// Display version information
pub fn execute() {
    println!("dao-factory {}", env!("CARGO_PKG_VERSION"));
    println!("Proposal coordination and DAO contract deployment");
}
