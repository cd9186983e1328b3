//! Local chain bootstrap: launch a dev node, export its accounts and deploy
//! the supply chain contract.

use crate::accounts::{save_accounts, Account};
use crate::config::{ChainConfig, PathsConfig};
use crate::contracts::{connect_provider, token_address, SignerProvider};
use crate::deployment::{load_abi, load_bytecode, ContractAddresses};
use crate::error::{HarnessError, Result};
use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use tracing::info;

/// A running dev node. Dropping it stops the node.
pub struct LocalChain {
    instance: AnvilInstance,
}

impl LocalChain {
    pub fn spawn(config: &ChainConfig) -> Result<Self> {
        let mut anvil = Anvil::new().port(config.port);
        if let Some(path) = &config.anvil_path {
            anvil = anvil.path(path);
        }
        if let Some(secs) = config.block_time_secs {
            anvil = anvil.block_time(secs);
        }
        let instance = anvil
            .try_spawn()
            .map_err(|e| HarnessError::ChainLaunchError(e.to_string()))?;
        info!(
            endpoint = %instance.endpoint(),
            chain_id = instance.chain_id(),
            "local chain listening"
        );
        Ok(Self { instance })
    }

    pub fn endpoint(&self) -> String {
        self.instance.endpoint()
    }

    pub fn port(&self) -> u16 {
        self.instance.port()
    }

    /// The node's funded dev accounts in `accounts.json` form.
    pub fn accounts(&self) -> Vec<Account> {
        self.instance
            .addresses()
            .iter()
            .zip(self.instance.keys())
            .map(|(address, key)| Account {
                public_key: *address,
                private_key: alloy::hex::encode_prefixed(key.to_bytes()),
            })
            .collect()
    }
}

/// Deploy the supply chain contract from `deployer` and read back the token
/// address its constructor created.
pub async fn deploy_supply_chain(
    provider: &SignerProvider,
    deployer: Address,
    bytecode: Bytes,
    abi: &JsonAbi,
) -> Result<ContractAddresses> {
    info!("deploying SupplyChainContract");
    let tx = TransactionRequest::default()
        .with_from(deployer)
        .with_deploy_code(bytecode);
    let receipt = provider
        .send_transaction(tx)
        .await?
        .get_receipt()
        .await
        .map_err(|e| HarnessError::RpcError(format!("deployment not mined: {}", e)))?;
    let supply_chain = receipt.contract_address.ok_or_else(|| {
        HarnessError::RpcError("deployment receipt carries no contract address".to_string())
    })?;

    let token = token_address(provider, supply_chain, abi).await?;
    info!(%supply_chain, %token, "contracts deployed");
    Ok(ContractAddresses {
        supply_chain,
        token,
    })
}

/// Write the accounts file and, when `deploy` is set, deploy and write the
/// addresses file. Returns the addresses that were written.
pub async fn bootstrap(
    chain: &LocalChain,
    paths: &PathsConfig,
    deploy: bool,
) -> Result<Option<ContractAddresses>> {
    let accounts = chain.accounts();
    save_accounts(&paths.accounts, &accounts)?;
    info!(
        count = accounts.len(),
        path = %paths.accounts.display(),
        "wrote dev accounts"
    );

    if !deploy {
        return Ok(None);
    }

    let deployer = accounts
        .first()
        .ok_or_else(|| HarnessError::AccountsError("dev node exposed no accounts".to_string()))?;
    let provider = connect_provider(&chain.endpoint(), vec![deployer.signer()?])?;
    let abi = load_abi(&paths.supply_chain_abi)?;
    let bytecode = load_bytecode(&paths.supply_chain_bytecode)?;

    let addresses = deploy_supply_chain(&provider, deployer.address(), bytecode, &abi).await?;
    addresses.save(&paths.addresses)?;
    info!(path = %paths.addresses.display(), "wrote contract addresses");
    Ok(Some(addresses))
}
