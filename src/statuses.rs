//! Role and product-status codes as published in `statuses.json`

use crate::accounts::Participant;
use crate::error::{HarnessError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Product statuses the demo moves a product through.
pub const READY_TO_SHIP: &str = "ReadyToShip";
pub const SHIPPING: &str = "Shipping";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    ProductSeller,
    DistributorToWarehouse,
    Warehouse,
    DoorToDoorDelivery,
    ProductBuyer,
}

impl Role {
    /// Key in the `roles` table.
    pub fn key(self) -> &'static str {
        match self {
            Role::ProductSeller => "ProductSeller",
            Role::DistributorToWarehouse => "DistributorToWarehouse",
            Role::Warehouse => "Warehouse",
            Role::DoorToDoorDelivery => "DoorToDoorDelivery",
            Role::ProductBuyer => "ProductBuyer",
        }
    }

    /// Role each enrolled participant applies for. The owner has none.
    pub fn of(who: Participant) -> Option<Role> {
        match who {
            Participant::Owner => None,
            Participant::Seller => Some(Role::ProductSeller),
            Participant::DistributorToWarehouse => Some(Role::DistributorToWarehouse),
            Participant::Warehouse => Some(Role::Warehouse),
            Participant::DoorToDoorDelivery => Some(Role::DoorToDoorDelivery),
            Participant::ProductBuyer => Some(Role::ProductBuyer),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusTable {
    #[serde(default)]
    pub roles: BTreeMap<String, u8>,
    #[serde(default)]
    pub statuses: BTreeMap<String, u8>,
}

impl StatusTable {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            HarnessError::LookupError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn role(&self, role: Role) -> Result<u8> {
        self.roles.get(role.key()).copied().ok_or_else(|| {
            HarnessError::LookupError(format!("role {} missing from status table", role.key()))
        })
    }

    pub fn status(&self, name: &str) -> Result<u8> {
        self.statuses.get(name).copied().ok_or_else(|| {
            HarnessError::LookupError(format!("status {} missing from status table", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "roles": {
            "ProductSeller": 1,
            "DistributorToWarehouse": 2,
            "Warehouse": 3,
            "DoorToDoorDelivery": 4,
            "ProductBuyer": 5
        },
        "statuses": { "ReadyToShip": 1, "Shipping": 2 }
    }"#;

    #[test]
    fn test_lookup() {
        let table: StatusTable = serde_json::from_str(TABLE).unwrap();
        assert_eq!(table.role(Role::Warehouse).unwrap(), 3);
        assert_eq!(table.status(READY_TO_SHIP).unwrap(), 1);
        assert_eq!(table.status(SHIPPING).unwrap(), 2);
    }

    #[test]
    fn test_missing_entries_named() {
        let table: StatusTable = serde_json::from_str(r#"{"roles": {}}"#).unwrap();
        let err = table.role(Role::ProductBuyer).unwrap_err();
        assert!(err.to_string().contains("ProductBuyer"));
        let err = table.status(SHIPPING).unwrap_err();
        assert!(err.to_string().contains("Shipping"));
    }

    #[test]
    fn test_roles_follow_participants() {
        assert_eq!(Role::of(Participant::Owner), None);
        assert_eq!(Role::of(Participant::Seller), Some(Role::ProductSeller));
        assert_eq!(
            Role::of(Participant::DoorToDoorDelivery),
            Some(Role::DoorToDoorDelivery)
        );
    }
}
