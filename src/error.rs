//! Error types for the supply-chain harness

use std::fmt;

#[derive(Debug, Clone)]
pub enum HarnessError {
    Config(String),
    IoError(String),
    JsonError(String),
    AccountsError(String),
    LookupError(String),
    AbiError(String),
    RpcError(String),
    StorageError(String),
    CidError(String),
    DatabaseError(String),
    ChainLaunchError(String),
    CryptoError(String),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HarnessError::Config(msg) => write!(f, "Configuration error: {}", msg),
            HarnessError::IoError(msg) => write!(f, "IO error: {}", msg),
            HarnessError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            HarnessError::AccountsError(msg) => write!(f, "Accounts error: {}", msg),
            HarnessError::LookupError(msg) => write!(f, "Lookup error: {}", msg),
            HarnessError::AbiError(msg) => write!(f, "ABI error: {}", msg),
            HarnessError::RpcError(msg) => write!(f, "RPC error: {}", msg),
            HarnessError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            HarnessError::CidError(msg) => write!(f, "CID error: {}", msg),
            HarnessError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            HarnessError::ChainLaunchError(msg) => write!(f, "Chain launch error: {}", msg),
            HarnessError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::JsonError(err.to_string())
    }
}

impl From<rusqlite::Error> for HarnessError {
    fn from(err: rusqlite::Error) -> Self {
        HarnessError::DatabaseError(err.to_string())
    }
}

impl From<cid::Error> for HarnessError {
    fn from(err: cid::Error) -> Self {
        HarnessError::CidError(err.to_string())
    }
}

impl From<alloy::dyn_abi::Error> for HarnessError {
    fn from(err: alloy::dyn_abi::Error) -> Self {
        HarnessError::AbiError(err.to_string())
    }
}

impl From<alloy::transports::TransportError> for HarnessError {
    fn from(err: alloy::transports::TransportError) -> Self {
        HarnessError::RpcError(err.to_string())
    }
}

impl From<reqwest::Error> for HarnessError {
    fn from(err: reqwest::Error) -> Self {
        HarnessError::StorageError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = HarnessError::LookupError("role Warehouse missing".to_string());
        assert_eq!(err.to_string(), "Lookup error: role Warehouse missing");

        let err = HarnessError::StorageError("block not found".to_string());
        assert_eq!(err.to_string(), "Storage error: block not found");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "accounts.json");
        let err: HarnessError = io.into();
        assert!(matches!(err, HarnessError::IoError(_)));
        assert!(err.to_string().contains("accounts.json"));
    }
}
