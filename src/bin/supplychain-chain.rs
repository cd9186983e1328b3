#![forbid(unsafe_code)]
//! Local chain launcher: starts a dev node, writes accounts.json and deploys
//! the supply chain contract

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use supplychain_harness::chain::{bootstrap, LocalChain};
use supplychain_harness::config::load_config;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (defaults to $HARNESS_CONFIG or ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Port for the dev node's JSON-RPC endpoint
    #[arg(long)]
    port: Option<u16>,
    /// Only start the node and export accounts
    #[arg(long)]
    no_deploy: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.chain.override_port(port)?;
    }

    let chain = LocalChain::spawn(&config.chain)?;
    println!(
        "{} {}",
        "Local chain listening on port".bright_green(),
        chain.port().to_string().bright_white().bold()
    );

    if let Some(addresses) = bootstrap(&chain, &config.paths, !cli.no_deploy).await? {
        println!("SupplyChain: {}", addresses.supply_chain.to_string().bright_yellow());
        println!("Token:       {}", addresses.token.to_string().bright_yellow());
    }
    println!("Accounts written to {}", config.paths.accounts.display());
    println!(
        "{} {}",
        "JSON-RPC endpoint (chain.rpc_url):".bright_green(),
        chain.endpoint().bright_white().bold()
    );
    if cli.port.is_some() {
        println!(
            "{}",
            format!(
                "Port overridden: set chain.rpc_url = \"{}\" in the config supplychain-demo reads.",
                config.chain.rpc_url
            )
            .yellow()
        );
    }
    println!("{}", "Press Ctrl-C to stop the node.".dimmed());

    tokio::signal::ctrl_c().await?;
    println!("{}", "Shutting down local chain.".yellow());
    drop(chain);

    Ok(())
}
