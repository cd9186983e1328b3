//! Participant accounts: the `accounts.json` key file and its role mapping

use crate::crypto::check_key_matches;
use crate::error::{HarnessError, Result};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// One entry of `accounts.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub public_key: Address,
    pub private_key: String,
}

impl Account {
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        PrivateKeySigner::from_str(&self.private_key)
            .map_err(|e| HarnessError::AccountsError(format!("bad private key: {}", e)))
    }

    pub fn address(&self) -> Address {
        self.public_key
    }
}

pub fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    let data = fs::read_to_string(path).map_err(|e| {
        HarnessError::AccountsError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let accounts: Vec<Account> = serde_json::from_str(&data)?;
    for (index, account) in accounts.iter().enumerate() {
        check_key_matches(&account.private_key, account.public_key).map_err(|e| {
            HarnessError::AccountsError(format!("account {} in {}: {}", index, path.display(), e))
        })?;
    }
    Ok(accounts)
}

pub fn save_accounts(path: &Path, accounts: &[Account]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string(accounts)?)?;
    Ok(())
}

/// The six parties of the demo, in `accounts.json` index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Participant {
    Owner,
    Seller,
    DistributorToWarehouse,
    Warehouse,
    DoorToDoorDelivery,
    ProductBuyer,
}

impl Participant {
    pub const ALL: [Participant; 6] = [
        Participant::Owner,
        Participant::Seller,
        Participant::DistributorToWarehouse,
        Participant::Warehouse,
        Participant::DoorToDoorDelivery,
        Participant::ProductBuyer,
    ];

    /// Everyone except the contract owner.
    pub const ENROLLED: [Participant; 5] = [
        Participant::Seller,
        Participant::DistributorToWarehouse,
        Participant::Warehouse,
        Participant::DoorToDoorDelivery,
        Participant::ProductBuyer,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            Participant::Owner => "Owner",
            Participant::Seller => "Product Seller",
            Participant::DistributorToWarehouse => "Distributor To Warehouse",
            Participant::Warehouse => "Warehouse",
            Participant::DoorToDoorDelivery => "Door To Door Delivery",
            Participant::ProductBuyer => "Product Buyer",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Participant {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "owner" => Ok(Participant::Owner),
            "seller" | "productseller" => Ok(Participant::Seller),
            "distributor" | "distributortowarehouse" => Ok(Participant::DistributorToWarehouse),
            "warehouse" => Ok(Participant::Warehouse),
            "delivery" | "doortodoordelivery" => Ok(Participant::DoorToDoorDelivery),
            "buyer" | "productbuyer" => Ok(Participant::ProductBuyer),
            _ => Err(HarnessError::LookupError(format!(
                "unknown participant '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Participants {
    accounts: Vec<Account>,
}

impl Participants {
    pub fn from_accounts(accounts: Vec<Account>) -> Result<Self> {
        if accounts.len() < Participant::ALL.len() {
            return Err(HarnessError::AccountsError(format!(
                "need at least {} accounts, found {}",
                Participant::ALL.len(),
                accounts.len()
            )));
        }
        Ok(Self { accounts })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_accounts(load_accounts(path)?)
    }

    pub fn account(&self, who: Participant) -> &Account {
        &self.accounts[who.index()]
    }

    pub fn address(&self, who: Participant) -> Address {
        self.account(who).public_key
    }

    pub fn signers(&self) -> Result<Vec<PrivateKeySigner>> {
        Participant::ALL
            .iter()
            .map(|who| self.account(*who).signer())
            .collect()
    }
}
