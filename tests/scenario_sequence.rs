//! Integration tests for the scripted demo sequence, run against an
//! in-process recording ledger and metadata store

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use supplychain_harness::accounts::{Account, Participant, Participants};
use supplychain_harness::contracts::{Confirmation, SupplyChainLedger, TxOutcome};
use supplychain_harness::crypto::KeyPair;
use supplychain_harness::error::{HarnessError, Result};
use supplychain_harness::statuses::StatusTable;
use supplychain_harness::storage::{MetadataStore, ProductMetadata};
use supplychain_harness::workflow::{Scenario, ScenarioSettings};

const PRODUCT_ID: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    RequestEnrollment { from: Address, role: u8 },
    ApproveEnrollment { from: Address, applicant: Address },
    Mint { from: Address, to: Address, amount: U256 },
    UploadProduct { from: Address, cid: String, price: U256 },
    ProductId { cid: String },
    RequestStatusChange { from: Address, id: U256, status: u8 },
    ApproveStatusChange { from: Address, id: U256, index: U256, gas: u64 },
    User { address: Address },
    Balance { address: Address },
    Product { id: U256 },
}

#[derive(Default)]
struct RecordingLedger {
    calls: Mutex<Vec<Call>>,
    confirmations: Mutex<usize>,
}

impl RecordingLedger {
    fn record(&self, call: Call) -> TxOutcome {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        TxOutcome {
            hash: TxHash::with_last_byte(calls.len() as u8),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SupplyChainLedger for RecordingLedger {
    async fn request_enrollment(&self, from: Address, role: u8) -> Result<TxOutcome> {
        Ok(self.record(Call::RequestEnrollment { from, role }))
    }

    async fn approve_enrollment(&self, from: Address, applicant: Address) -> Result<TxOutcome> {
        Ok(self.record(Call::ApproveEnrollment { from, applicant }))
    }

    async fn mint(&self, from: Address, to: Address, amount: U256) -> Result<TxOutcome> {
        Ok(self.record(Call::Mint { from, to, amount }))
    }

    async fn upload_product(&self, from: Address, cid: &str, price: U256) -> Result<TxOutcome> {
        Ok(self.record(Call::UploadProduct {
            from,
            cid: cid.to_string(),
            price,
        }))
    }

    async fn request_status_change(
        &self,
        from: Address,
        product_id: U256,
        status: u8,
    ) -> Result<TxOutcome> {
        Ok(self.record(Call::RequestStatusChange {
            from,
            id: product_id,
            status,
        }))
    }

    async fn approve_status_change(
        &self,
        from: Address,
        product_id: U256,
        request_index: U256,
        gas_limit: u64,
    ) -> Result<TxOutcome> {
        Ok(self.record(Call::ApproveStatusChange {
            from,
            id: product_id,
            index: request_index,
            gas: gas_limit,
        }))
    }

    async fn product_id(&self, _from: Address, cid: &str) -> Result<U256> {
        self.record(Call::ProductId {
            cid: cid.to_string(),
        });
        Ok(U256::from(PRODUCT_ID))
    }

    async fn product(&self, _from: Address, product_id: U256) -> Result<Vec<String>> {
        self.record(Call::Product { id: product_id });
        Ok(vec![product_id.to_string()])
    }

    async fn user(&self, _from: Address, address: Address) -> Result<Vec<String>> {
        self.record(Call::User { address });
        Ok(vec![address.to_string(), "1".to_string()])
    }

    async fn balance_of(&self, _from: Address, address: Address) -> Result<U256> {
        self.record(Call::Balance { address });
        Ok(U256::from(10_000))
    }

    async fn confirmation(&self, tx: &TxOutcome) -> Result<Option<Confirmation>> {
        *self.confirmations.lock().unwrap() += 1;
        Ok(Some(Confirmation {
            hash: tx.hash,
            success: true,
            block_number: Some(1),
        }))
    }
}

struct FakeStore {
    fail: bool,
    added: Mutex<Vec<ProductMetadata>>,
}

impl FakeStore {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            added: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MetadataStore for FakeStore {
    async fn add(&self, metadata: &ProductMetadata) -> Result<String> {
        if self.fail {
            return Err(HarnessError::StorageError("storage is down".to_string()));
        }
        self.added.lock().unwrap().push(metadata.clone());
        Ok("bagaaierafake".to_string())
    }

    async fn get(&self, _cid: &str) -> Result<ProductMetadata> {
        Err(HarnessError::StorageError("not used".to_string()))
    }
}

fn participants() -> Participants {
    let accounts = (0..6)
        .map(|_| {
            let kp = KeyPair::generate();
            Account {
                public_key: kp.address(),
                private_key: kp.secret_hex(),
            }
        })
        .collect();
    Participants::from_accounts(accounts).unwrap()
}

fn statuses() -> StatusTable {
    serde_json::from_str(
        r#"{
            "roles": {
                "ProductSeller": 1,
                "DistributorToWarehouse": 2,
                "Warehouse": 3,
                "DoorToDoorDelivery": 4,
                "ProductBuyer": 5
            },
            "statuses": { "ReadyToShip": 10, "Shipping": 11 }
        }"#,
    )
    .unwrap()
}

fn settings(with_checks: bool, with_handover: bool) -> ScenarioSettings {
    ScenarioSettings {
        settle_delay: Duration::ZERO,
        fund_amount: U256::from(10_000),
        product_price: U256::from(100),
        approve_gas_limit: 1_000_000,
        with_checks,
        with_handover,
    }
}

fn metadata() -> ProductMetadata {
    ProductMetadata {
        name: "T Shirt".to_string(),
        description: "Good Design Tshirt".to_string(),
        base64_image: "aGVsbG8=".to_string(),
    }
}

#[tokio::test]
async fn test_default_sequence_order() {
    let ledger = RecordingLedger::default();
    let store = FakeStore::new(false);
    let people = participants();
    let table = statuses();
    let who = |p: Participant| people.address(p);
    let owner = who(Participant::Owner);

    let report = Scenario::new(&ledger, &store, &people, &table, settings(false, false))
        .run(&metadata())
        .await
        .unwrap();

    let mut expected = Vec::new();
    for (p, role) in Participant::ENROLLED.iter().zip(1u8..=5) {
        expected.push(Call::RequestEnrollment { from: who(*p), role });
    }
    for p in Participant::ENROLLED {
        expected.push(Call::ApproveEnrollment {
            from: owner,
            applicant: who(p),
        });
    }
    for p in Participant::ENROLLED {
        expected.push(Call::Mint {
            from: owner,
            to: who(p),
            amount: U256::from(10_000),
        });
    }
    expected.push(Call::UploadProduct {
        from: who(Participant::Seller),
        cid: "bagaaierafake".to_string(),
        price: U256::from(100),
    });
    expected.push(Call::ProductId {
        cid: "bagaaierafake".to_string(),
    });
    expected.push(Call::RequestStatusChange {
        from: who(Participant::ProductBuyer),
        id: U256::from(PRODUCT_ID),
        status: 10,
    });
    expected.push(Call::ApproveStatusChange {
        from: who(Participant::Seller),
        id: U256::from(PRODUCT_ID),
        index: U256::ZERO,
        gas: 1_000_000,
    });

    assert_eq!(ledger.calls(), expected);
    assert_eq!(report.cid, "bagaaierafake");
    assert_eq!(report.product_id, U256::from(PRODUCT_ID));
    // 5 enrollments + 5 approvals + 5 mints + upload + request + approve
    assert_eq!(report.transactions.len(), 18);
    assert_eq!(*ledger.confirmations.lock().unwrap(), 18);
    assert_eq!(store.added.lock().unwrap().as_slice(), &[metadata()]);
}

#[tokio::test]
async fn test_checks_and_handover() {
    let ledger = RecordingLedger::default();
    let store = FakeStore::new(false);
    let people = participants();
    let table = statuses();

    let report = Scenario::new(&ledger, &store, &people, &table, settings(true, true))
        .run(&metadata())
        .await
        .unwrap();

    let calls = ledger.calls();
    let user_checks = calls
        .iter()
        .filter(|c| matches!(c, Call::User { .. }))
        .count();
    let balance_checks = calls
        .iter()
        .filter(|c| matches!(c, Call::Balance { .. }))
        .count();
    assert_eq!(user_checks, 10);
    assert_eq!(balance_checks, 10);

    let tail: Vec<_> = calls
        .iter()
        .filter(|c| {
            matches!(
                c,
                Call::RequestStatusChange { .. } | Call::ApproveStatusChange { .. }
            )
        })
        .cloned()
        .collect();
    assert_eq!(
        tail,
        vec![
            Call::RequestStatusChange {
                from: people.address(Participant::ProductBuyer),
                id: U256::from(PRODUCT_ID),
                status: 10,
            },
            Call::ApproveStatusChange {
                from: people.address(Participant::Seller),
                id: U256::from(PRODUCT_ID),
                index: U256::ZERO,
                gas: 1_000_000,
            },
            Call::RequestStatusChange {
                from: people.address(Participant::DistributorToWarehouse),
                id: U256::from(PRODUCT_ID),
                status: 11,
            },
            Call::ApproveStatusChange {
                from: people.address(Participant::Seller),
                id: U256::from(PRODUCT_ID),
                index: U256::from(1),
                gas: 1_000_000,
            },
        ]
    );
    assert_eq!(
        calls.last(),
        Some(&Call::Product {
            id: U256::from(PRODUCT_ID)
        })
    );
    assert_eq!(report.transactions.len(), 20);
}

#[tokio::test]
async fn test_storage_failure_halts_before_upload() {
    let ledger = RecordingLedger::default();
    let store = FakeStore::new(true);
    let people = participants();
    let table = statuses();

    let err = Scenario::new(&ledger, &store, &people, &table, settings(false, false))
        .run(&metadata())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("storage is down"));

    let calls = ledger.calls();
    assert_eq!(calls.len(), 15);
    assert!(!calls
        .iter()
        .any(|c| matches!(c, Call::UploadProduct { .. })));
}

#[tokio::test]
async fn test_missing_role_code_halts_immediately() {
    let ledger = RecordingLedger::default();
    let store = FakeStore::new(false);
    let people = participants();
    let table: StatusTable = serde_json::from_str(r#"{"roles": {}, "statuses": {}}"#).unwrap();

    let err = Scenario::new(&ledger, &store, &people, &table, settings(false, false))
        .run(&metadata())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ProductSeller"));
    assert!(ledger.calls().is_empty());
}
