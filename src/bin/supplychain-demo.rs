#![forbid(unsafe_code)]
//! Scripted supply-chain demo: enrollment, minting, product upload and
//! status changes, plus a few read-only inspections

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::Table;
use std::path::PathBuf;
use std::str::FromStr;
use supplychain_harness::accounts::{Participant, Participants};
use supplychain_harness::config::{load_config, Config};
use supplychain_harness::contracts::{connect_provider, ChainLedger, SupplyChainLedger};
use supplychain_harness::deployment::{load_abi, ContractAddresses};
use supplychain_harness::statuses::StatusTable;
use supplychain_harness::storage::client::metadata_from_image;
use supplychain_harness::storage::{MetadataStore, StorageClient};
use supplychain_harness::workflow::{Scenario, ScenarioSettings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file (defaults to $HARNESS_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the full enrollment, funding, upload and order sequence
    Run {
        /// Log user records and balances between phases
        #[arg(long)]
        with_checks: bool,
        /// Continue with the distributor handover after the sale
        #[arg(long)]
        with_handover: bool,
        /// Product image to upload (overrides demo.image_path)
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Shows the token balance of a participant or address
    Balance { who: String },
    /// Shows the supply chain user record of a participant or address
    User { who: String },
    /// Shows a product record by id
    Product { id: String },
    /// Fetches product metadata from storage by CID
    Fetch { cid: String },
    /// Prints every participant's address, user record and balance
    Summary,
}

fn connect(config: &Config) -> Result<(ChainLedger, Participants), Box<dyn std::error::Error>> {
    let participants = Participants::load(&config.paths.accounts)?;
    let addresses = ContractAddresses::load(&config.paths.addresses)?;
    let provider = connect_provider(&config.chain.rpc_url, participants.signers()?)?;
    let ledger = ChainLedger::new(
        provider,
        addresses.supply_chain,
        load_abi(&config.paths.supply_chain_abi)?,
        addresses.token,
        load_abi(&config.paths.token_abi)?,
    );
    Ok((ledger, participants))
}

fn resolve_target(who: &str, participants: &Participants) -> Result<Address, Box<dyn std::error::Error>> {
    if who.starts_with("0x") {
        return Ok(Address::from_str(who)?);
    }
    Ok(participants.address(who.parse::<Participant>()?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            with_checks,
            with_handover,
            image,
        } => {
            run(&config, with_checks, with_handover, image).await?;
        }
        Commands::Balance { who } => {
            let (ledger, participants) = connect(&config)?;
            let target = resolve_target(&who, &participants)?;
            let balance = ledger
                .balance_of(participants.address(Participant::Owner), target)
                .await?;
            println!("{} {}", target.to_string().bright_white(), balance.to_string().bright_green());
        }
        Commands::User { who } => {
            let (ledger, participants) = connect(&config)?;
            let target = resolve_target(&who, &participants)?;
            let record = ledger
                .user(participants.address(Participant::Owner), target)
                .await?;
            println!("{} ({})", target.to_string().bright_white(), record.join(", "));
        }
        Commands::Product { id } => {
            let (ledger, participants) = connect(&config)?;
            let id = U256::from_str(&id)?;
            let record = ledger
                .product(participants.address(Participant::Owner), id)
                .await?;
            println!("Product {}: ({})", id.to_string().bright_yellow(), record.join(", "));
        }
        Commands::Fetch { cid } => {
            let storage = StorageClient::new(&config.storage.url);
            let metadata = storage.get(&cid).await?;
            println!("{} {}", "Name:".bright_cyan(), metadata.name);
            println!("{} {}", "Description:".bright_cyan(), metadata.description);
            println!(
                "{} {} base64 characters",
                "Image:".bright_cyan(),
                metadata.base64_image.len()
            );
        }
        Commands::Summary => {
            summary(&config).await?;
        }
    }

    Ok(())
}

async fn run(
    config: &Config,
    with_checks: bool,
    with_handover: bool,
    image: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (ledger, participants) = connect(config)?;
    let statuses = StatusTable::load(&config.paths.statuses)?;
    let storage = StorageClient::new(&config.storage.url);

    let image = image.unwrap_or_else(|| config.demo.image_path.clone());
    let metadata = metadata_from_image(
        &image,
        &config.demo.product_name,
        &config.demo.product_description,
    )?;

    let settings = ScenarioSettings {
        settle_delay: config.demo.settle_delay()?,
        fund_amount: U256::from(config.demo.fund_amount),
        product_price: U256::from(config.demo.product_price),
        approve_gas_limit: config.demo.approve_gas_limit,
        with_checks,
        with_handover,
    };

    println!("{}", "Running supply chain demo...".bright_cyan());
    let report = Scenario::new(&ledger, &storage, &participants, &statuses, settings)
        .run(&metadata)
        .await?;

    println!("{}", "Demo finished.".bright_green().bold());
    println!("CID:          {}", report.cid.bright_yellow());
    println!("Product id:   {}", report.product_id.to_string().bright_yellow());
    println!("Transactions: {}", report.transactions.len());
    Ok(())
}

async fn summary(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (ledger, participants) = connect(config)?;
    let owner = participants.address(Participant::Owner);

    let mut table = Table::new();
    table.set_header(vec!["Participant", "Address", "User record", "Balance"]);
    for who in Participant::ALL {
        let address = participants.address(who);
        let record = ledger.user(owner, address).await?;
        let balance = ledger.balance_of(owner, address).await?;
        table.add_row(vec![
            who.to_string(),
            address.to_string(),
            record.join(", "),
            balance.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
