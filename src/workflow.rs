//! The scripted demo sequence
//!
//! Every step is awaited before the next starts. After each transaction the
//! scenario sleeps for the settle delay so the dev chain can mine it, then
//! logs what the receipt says.

use crate::accounts::{Participant, Participants};
use crate::contracts::{SupplyChainLedger, TxOutcome};
use crate::error::Result;
use crate::statuses::{Role, StatusTable, READY_TO_SHIP, SHIPPING};
use crate::storage::{MetadataStore, ProductMetadata};
use alloy::primitives::U256;
use std::time::Duration;
use tracing::{info, warn};

/// Numbers the sequence plugs into contract calls.
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub settle_delay: Duration,
    pub fund_amount: U256,
    pub product_price: U256,
    pub approve_gas_limit: u64,
    /// Log user records and balances between phases.
    pub with_checks: bool,
    /// Continue past the sale into the distributor handover.
    pub with_handover: bool,
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub cid: String,
    pub product_id: U256,
    pub transactions: Vec<TxOutcome>,
}

pub struct Scenario<'a, L: SupplyChainLedger, S: MetadataStore> {
    ledger: &'a L,
    storage: &'a S,
    participants: &'a Participants,
    statuses: &'a StatusTable,
    settings: ScenarioSettings,
    transactions: Vec<TxOutcome>,
}

impl<'a, L: SupplyChainLedger, S: MetadataStore> Scenario<'a, L, S> {
    pub fn new(
        ledger: &'a L,
        storage: &'a S,
        participants: &'a Participants,
        statuses: &'a StatusTable,
        settings: ScenarioSettings,
    ) -> Self {
        Self {
            ledger,
            storage,
            participants,
            statuses,
            settings,
            transactions: Vec::new(),
        }
    }

    fn address(&self, who: Participant) -> alloy::primitives::Address {
        self.participants.address(who)
    }

    async fn settle(&mut self, tx: TxOutcome) -> Result<()> {
        info!(hash = %tx.hash, "submitted");
        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }
        match self.ledger.confirmation(&tx).await? {
            Some(c) if c.success => {
                info!(hash = %c.hash, block = ?c.block_number, "confirmed")
            }
            Some(c) => warn!(hash = %c.hash, block = ?c.block_number, "reverted"),
            None => warn!(hash = %tx.hash, "no receipt yet"),
        }
        self.transactions.push(tx);
        Ok(())
    }

    pub async fn request_enrollment(&mut self, who: Participant, role: Role) -> Result<()> {
        info!("Enrollment request of {}", who);
        let code = self.statuses.role(role)?;
        let tx = self
            .ledger
            .request_enrollment(self.address(who), code)
            .await?;
        self.settle(tx).await
    }

    pub async fn approve_enrollment(&mut self, who: Participant) -> Result<()> {
        info!("Approve Enroll request of {}", who);
        let tx = self
            .ledger
            .approve_enrollment(self.address(Participant::Owner), self.address(who))
            .await?;
        self.settle(tx).await
    }

    pub async fn add_funds(&mut self, who: Participant) -> Result<()> {
        info!("Adding Fund to {} Account", who);
        let tx = self
            .ledger
            .mint(
                self.address(Participant::Owner),
                self.address(who),
                self.settings.fund_amount,
            )
            .await?;
        self.settle(tx).await
    }

    pub async fn upload_metadata(&self, metadata: &ProductMetadata) -> Result<String> {
        info!(name = %metadata.name, "Uploading product metadata to storage");
        let cid = self.storage.add(metadata).await?;
        info!(%cid, "metadata stored");
        Ok(cid)
    }

    pub async fn upload_product(&mut self, cid: &str) -> Result<()> {
        info!("Uploading Product");
        let tx = self
            .ledger
            .upload_product(
                self.address(Participant::Seller),
                cid,
                self.settings.product_price,
            )
            .await?;
        self.settle(tx).await
    }

    pub async fn product_id(&self, cid: &str) -> Result<U256> {
        let id = self
            .ledger
            .product_id(self.address(Participant::Owner), cid)
            .await?;
        info!(%cid, product_id = %id, "resolved product id");
        Ok(id)
    }

    pub async fn request_status_change(
        &mut self,
        who: Participant,
        product_id: U256,
        status: &str,
        label: &str,
    ) -> Result<()> {
        info!("{}", label);
        let code = self.statuses.status(status)?;
        let tx = self
            .ledger
            .request_status_change(self.address(who), product_id, code)
            .await?;
        self.settle(tx).await
    }

    pub async fn approve_status_change(
        &mut self,
        who: Participant,
        product_id: U256,
        request_index: u64,
        label: &str,
    ) -> Result<()> {
        info!("{}", label);
        let tx = self
            .ledger
            .approve_status_change(
                self.address(who),
                product_id,
                U256::from(request_index),
                self.settings.approve_gas_limit,
            )
            .await?;
        self.settle(tx).await
    }

    pub async fn status_check(&self, who: Participant) -> Result<Vec<String>> {
        info!("Status check of user type {}", who);
        let record = self
            .ledger
            .user(self.address(Participant::Owner), self.address(who))
            .await?;
        info!(user = %who, record = ?record, "user record");
        Ok(record)
    }

    pub async fn check_balance(&self, who: Participant) -> Result<U256> {
        info!("Balance check of user type {}", who);
        let balance = self
            .ledger
            .balance_of(self.address(Participant::Owner), self.address(who))
            .await?;
        info!(user = %who, %balance, "balance");
        Ok(balance)
    }

    pub async fn show_product(&self, product_id: U256) -> Result<Vec<String>> {
        info!("Getting Product {}", product_id);
        let record = self
            .ledger
            .product(self.address(Participant::Owner), product_id)
            .await?;
        info!(record = ?record, "product record");
        Ok(record)
    }

    async fn status_checks(&self) -> Result<()> {
        for who in Participant::ENROLLED {
            self.status_check(who).await?;
        }
        Ok(())
    }

    async fn balance_checks(&self) -> Result<()> {
        for who in Participant::ENROLLED {
            self.check_balance(who).await?;
        }
        Ok(())
    }

    /// Run the whole sequence with the given product metadata.
    pub async fn run(mut self, metadata: &ProductMetadata) -> Result<ScenarioReport> {
        for who in Participant::ENROLLED {
            if let Some(role) = Role::of(who) {
                self.request_enrollment(who, role).await?;
            }
        }
        if self.settings.with_checks {
            self.status_checks().await?;
        }

        for who in Participant::ENROLLED {
            self.approve_enrollment(who).await?;
        }
        if self.settings.with_checks {
            self.status_checks().await?;
        }

        for who in Participant::ENROLLED {
            self.add_funds(who).await?;
        }
        if self.settings.with_checks {
            self.balance_checks().await?;
        }

        let cid = self.upload_metadata(metadata).await?;
        self.upload_product(&cid).await?;
        let product_id = self.product_id(&cid).await?;

        self.request_status_change(
            Participant::ProductBuyer,
            product_id,
            READY_TO_SHIP,
            "Buyer is requesting to order",
        )
        .await?;
        self.approve_status_change(
            Participant::Seller,
            product_id,
            0,
            "Seller Accepted the request",
        )
        .await?;

        if self.settings.with_handover {
            self.request_status_change(
                Participant::DistributorToWarehouse,
                product_id,
                SHIPPING,
                "Distributor requested for handover",
            )
            .await?;
            self.approve_status_change(
                Participant::Seller,
                product_id,
                1,
                "Seller has handed over the product",
            )
            .await?;
            self.balance_checks().await?;
            self.show_product(product_id).await?;
        }

        Ok(ScenarioReport {
            cid,
            product_id,
            transactions: self.transactions,
        })
    }
}
