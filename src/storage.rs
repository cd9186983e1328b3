//! Content-addressed storage for product metadata. The shim server, its block
//! stores and the HTTP client the demo talks to live in submodules.

pub mod blockstore;
pub mod client;
pub mod content_id;
pub mod server;

pub use blockstore::{open_block_store, BlockStore, MemoryBlockStore, SqliteBlockStore};
pub use client::StorageClient;
pub use content_id::{json_cid, parse_cid, verify_block};
pub use server::{build_storage_router, run_storage_server};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Product record kept in storage. Field order is part of the content
/// identifier, so it must stay `name`, `description`, `base64Image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMetadata {
    pub name: String,
    pub description: String,
    pub base64_image: String,
}

/// Where the demo puts product metadata before referencing it on chain.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn add(&self, metadata: &ProductMetadata) -> Result<String>;
    async fn get(&self, cid: &str) -> Result<ProductMetadata>;
}
