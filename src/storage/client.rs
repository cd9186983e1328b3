//! HTTP client for the storage shim

use super::{MetadataStore, ProductMetadata};
use crate::error::{HarnessError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct AddReply {
    cid: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    message: String,
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
}

impl StorageClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fail(response: reqwest::Response) -> HarnessError {
        let status = response.status();
        match response.json::<ErrorReply>().await {
            Ok(reply) => HarnessError::StorageError(format!("{} ({})", reply.message, status)),
            Err(_) => HarnessError::StorageError(format!("storage replied {}", status)),
        }
    }
}

#[async_trait]
impl MetadataStore for StorageClient {
    async fn add(&self, metadata: &ProductMetadata) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/add", self.base_url))
            .json(metadata)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(response.json::<AddReply>().await?.cid)
    }

    async fn get(&self, cid: &str) -> Result<ProductMetadata> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, cid))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(response.json::<ProductMetadata>().await?)
    }
}

/// Build the metadata record for an image file on disk.
pub fn metadata_from_image(image: &Path, name: &str, description: &str) -> Result<ProductMetadata> {
    let bytes = std::fs::read(image).map_err(|e| {
        HarnessError::IoError(format!("cannot read image {}: {}", image.display(), e))
    })?;
    Ok(ProductMetadata {
        name: name.to_string(),
        description: description.to_string(),
        base64_image: STANDARD.encode(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_metadata_from_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tshirt.jpg");
        std::fs::write(&path, b"hello").unwrap();

        let metadata = metadata_from_image(&path, "T Shirt", "Good Design Tshirt").unwrap();
        assert_eq!(metadata.base64_image, "aGVsbG8=");
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"T Shirt","description":"Good Design Tshirt","base64Image":"aGVsbG8="}"#
        );
    }

    #[test]
    fn test_missing_image() {
        let err = metadata_from_image(Path::new("/nonexistent/x.jpg"), "a", "b").unwrap_err();
        assert!(err.to_string().contains("cannot read image"));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(
            StorageClient::new("http://localhost:8000/").base_url(),
            "http://localhost:8000"
        );
    }
}
