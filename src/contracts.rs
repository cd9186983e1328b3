//! Supply-chain and token contract access over JSON-RPC

use crate::abi::{decode_output, encode_call, render_all, Arg};
use crate::error::{HarnessError, Result};
use alloy::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    network::{Ethereum, EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use async_trait::async_trait;
use tracing::{info, warn};

/// HTTP provider that fills gas, nonce and chain id and signs with a local wallet.
pub type SignerProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Http<Client>>,
    Http<Client>,
    Ethereum,
>;

/// Build a provider whose wallet holds every given signer. The first one is
/// the default sender; the others are picked by the `from` of each request.
pub fn connect_provider(rpc_url: &str, signers: Vec<PrivateKeySigner>) -> Result<SignerProvider> {
    let mut signers = signers.into_iter();
    let default = signers
        .next()
        .ok_or_else(|| HarnessError::AccountsError("no signer to connect with".to_string()))?;
    let mut wallet = EthereumWallet::new(default);
    for signer in signers {
        wallet.register_signer(signer);
    }

    let url: reqwest::Url = rpc_url
        .parse()
        .map_err(|_| HarnessError::Config(format!("Invalid chain endpoint: '{}'", rpc_url)))?;

    Ok(ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(url))
}

/// A submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub hash: TxHash,
}

/// What the receipt said once the settle delay passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// Every contract interaction the demo sequence needs, keyed by sender.
#[async_trait]
pub trait SupplyChainLedger: Send + Sync {
    async fn request_enrollment(&self, from: Address, role: u8) -> Result<TxOutcome>;
    async fn approve_enrollment(&self, from: Address, applicant: Address) -> Result<TxOutcome>;
    async fn mint(&self, from: Address, to: Address, amount: U256) -> Result<TxOutcome>;
    async fn upload_product(&self, from: Address, cid: &str, price: U256) -> Result<TxOutcome>;
    async fn request_status_change(
        &self,
        from: Address,
        product_id: U256,
        status: u8,
    ) -> Result<TxOutcome>;
    async fn approve_status_change(
        &self,
        from: Address,
        product_id: U256,
        request_index: U256,
        gas_limit: u64,
    ) -> Result<TxOutcome>;

    async fn product_id(&self, from: Address, cid: &str) -> Result<U256>;
    async fn product(&self, from: Address, product_id: U256) -> Result<Vec<String>>;
    async fn user(&self, from: Address, address: Address) -> Result<Vec<String>>;
    async fn balance_of(&self, from: Address, address: Address) -> Result<U256>;

    /// Receipt lookup; `None` when the chain has not included the transaction yet.
    async fn confirmation(&self, tx: &TxOutcome) -> Result<Option<Confirmation>>;
}

/// [`SupplyChainLedger`] backed by a live node.
pub struct ChainLedger {
    provider: SignerProvider,
    supply_chain: Address,
    supply_chain_abi: JsonAbi,
    token: Address,
    token_abi: JsonAbi,
}

impl ChainLedger {
    pub fn new(
        provider: SignerProvider,
        supply_chain: Address,
        supply_chain_abi: JsonAbi,
        token: Address,
        token_abi: JsonAbi,
    ) -> Self {
        Self {
            provider,
            supply_chain,
            supply_chain_abi,
            token,
            token_abi,
        }
    }

    pub fn provider(&self) -> &SignerProvider {
        &self.provider
    }

    async fn send(
        &self,
        from: Address,
        to: Address,
        abi: &JsonAbi,
        method: &str,
        args: &[Arg],
        gas_limit: Option<u64>,
    ) -> Result<TxOutcome> {
        let input = encode_call(abi, method, args)?;
        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);
        if let Some(gas) = gas_limit {
            tx = tx.with_gas_limit(gas.into());
        }

        let pending = self.provider.send_transaction(tx).await?;
        let hash = *pending.tx_hash();
        info!(method, %from, %hash, "transaction submitted");
        Ok(TxOutcome { hash })
    }

    async fn read(
        &self,
        from: Address,
        to: Address,
        abi: &JsonAbi,
        method: &str,
        args: &[Arg],
    ) -> Result<Vec<DynSolValue>> {
        let input = encode_call(abi, method, args)?;
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);
        let output: Bytes = self.provider.call(&tx).await?;
        decode_output(abi, method, args.len(), &output)
    }
}

fn first_uint(values: &[DynSolValue], method: &str) -> Result<U256> {
    values
        .first()
        .and_then(|v| v.as_uint())
        .map(|(v, _)| v)
        .ok_or_else(|| HarnessError::AbiError(format!("{} did not return an integer", method)))
}

#[async_trait]
impl SupplyChainLedger for ChainLedger {
    async fn request_enrollment(&self, from: Address, role: u8) -> Result<TxOutcome> {
        self.send(
            from,
            self.supply_chain,
            &self.supply_chain_abi,
            "requestEnrollment",
            &[role.into()],
            None,
        )
        .await
    }

    async fn approve_enrollment(&self, from: Address, applicant: Address) -> Result<TxOutcome> {
        self.send(
            from,
            self.supply_chain,
            &self.supply_chain_abi,
            "approveEnrollment",
            &[applicant.into()],
            None,
        )
        .await
    }

    async fn mint(&self, from: Address, to: Address, amount: U256) -> Result<TxOutcome> {
        self.send(
            from,
            self.token,
            &self.token_abi,
            "mint",
            &[to.into(), amount.into()],
            None,
        )
        .await
    }

    async fn upload_product(&self, from: Address, cid: &str, price: U256) -> Result<TxOutcome> {
        self.send(
            from,
            self.supply_chain,
            &self.supply_chain_abi,
            "uploadProduct",
            &[cid.into(), price.into()],
            None,
        )
        .await
    }

    async fn request_status_change(
        &self,
        from: Address,
        product_id: U256,
        status: u8,
    ) -> Result<TxOutcome> {
        self.send(
            from,
            self.supply_chain,
            &self.supply_chain_abi,
            "requestStatusChange",
            &[product_id.into(), status.into()],
            None,
        )
        .await
    }

    async fn approve_status_change(
        &self,
        from: Address,
        product_id: U256,
        request_index: U256,
        gas_limit: u64,
    ) -> Result<TxOutcome> {
        self.send(
            from,
            self.supply_chain,
            &self.supply_chain_abi,
            "approveStatusChange",
            &[product_id.into(), request_index.into()],
            Some(gas_limit),
        )
        .await
    }

    async fn product_id(&self, from: Address, cid: &str) -> Result<U256> {
        let values = self
            .read(
                from,
                self.supply_chain,
                &self.supply_chain_abi,
                "getProductId",
                &[cid.into()],
            )
            .await?;
        first_uint(&values, "getProductId")
    }

    async fn product(&self, from: Address, product_id: U256) -> Result<Vec<String>> {
        let values = self
            .read(
                from,
                self.supply_chain,
                &self.supply_chain_abi,
                "products",
                &[product_id.into()],
            )
            .await?;
        Ok(render_all(&values))
    }

    async fn user(&self, from: Address, address: Address) -> Result<Vec<String>> {
        let values = self
            .read(
                from,
                self.supply_chain,
                &self.supply_chain_abi,
                "users",
                &[address.into()],
            )
            .await?;
        Ok(render_all(&values))
    }

    async fn balance_of(&self, from: Address, address: Address) -> Result<U256> {
        let values = self
            .read(from, self.token, &self.token_abi, "balanceOf", &[address.into()])
            .await?;
        first_uint(&values, "balanceOf")
    }

    async fn confirmation(&self, tx: &TxOutcome) -> Result<Option<Confirmation>> {
        let receipt = self.provider.get_transaction_receipt(tx.hash).await?;
        Ok(receipt.map(|r| {
            let confirmation = Confirmation {
                hash: tx.hash,
                success: r.status(),
                block_number: r.block_number,
            };
            if !confirmation.success {
                warn!(hash = %tx.hash, "transaction reverted");
            }
            confirmation
        }))
    }
}

/// Read the token address the supply chain contract created at construction.
pub async fn token_address(
    provider: &SignerProvider,
    supply_chain: Address,
    supply_chain_abi: &JsonAbi,
) -> Result<Address> {
    let input = encode_call(supply_chain_abi, "tokenAddress", &[])?;
    let tx = TransactionRequest::default()
        .with_to(supply_chain)
        .with_input(input);
    let output: Bytes = provider.call(&tx).await?;
    let values = decode_output(supply_chain_abi, "tokenAddress", 0, &output)?;
    values
        .first()
        .and_then(|v| v.as_address())
        .ok_or_else(|| HarnessError::AbiError("tokenAddress did not return an address".to_string()))
}
