#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "Supply Chain Harness".bright_cyan().bold());
    println!("{}", "--------------------".bright_cyan());
    println!();
    println!(
        "{}",
        "The harness is split into three binaries, started in this order:".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!(
        "  - {}  {}",
        "supplychain-chain".bright_white(),
        "local chain, accounts.json, contract deployment".dimmed()
    );
    println!(
        "  - {}  {}",
        "supplychain-storage".bright_white(),
        "content-addressed metadata store on port 8000".dimmed()
    );
    println!(
        "  - {}  {}",
        "supplychain-demo".bright_white(),
        "scripted enrollment, minting and order sequence".dimmed()
    );
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin supplychain-chain".italic());
    println!("{}", "  cargo run --bin supplychain-storage".italic());
    println!("{}", "  cargo run --bin supplychain-demo -- run --with-checks".italic());
}
