//! Configuration management for the harness

use crate::error::{HarnessError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "HARNESS_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_chain_port")]
    pub port: u16,
    #[serde(default)]
    pub block_time_secs: Option<u64>,
    #[serde(default)]
    pub anvil_path: Option<PathBuf>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            port: default_chain_port(),
            block_time_secs: None,
            anvil_path: None,
        }
    }
}

impl ChainConfig {
    /// Move the node to `port` and point `rpc_url` at it, so clients built
    /// from this config reach the same node.
    pub fn override_port(&mut self, port: u16) -> Result<()> {
        let mut url: reqwest::Url = self.rpc_url.parse().map_err(|_| {
            HarnessError::Config(format!("Invalid chain.rpc_url: '{}'", self.rpc_url))
        })?;
        url.set_port(Some(port))
            .map_err(|_| HarnessError::Config(format!("chain.rpc_url '{}' cannot take a port", url)))?;
        self.port = port;
        self.rpc_url = url.as_str().trim_end_matches('/').to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_url")]
    pub url: String,
    #[serde(default = "default_storage_port")]
    pub port: u16,
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: default_storage_url(),
            port: default_storage_port(),
            backend: default_backend(),
            database_path: default_database_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_accounts_path")]
    pub accounts: PathBuf,
    #[serde(default = "default_addresses_path")]
    pub addresses: PathBuf,
    #[serde(default = "default_statuses_path")]
    pub statuses: PathBuf,
    #[serde(default = "default_supply_chain_abi")]
    pub supply_chain_abi: PathBuf,
    #[serde(default = "default_token_abi")]
    pub token_abi: PathBuf,
    #[serde(default = "default_supply_chain_bytecode")]
    pub supply_chain_bytecode: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            accounts: default_accounts_path(),
            addresses: default_addresses_path(),
            statuses: default_statuses_path(),
            supply_chain_abi: default_supply_chain_abi(),
            token_abi: default_token_abi(),
            supply_chain_bytecode: default_supply_chain_bytecode(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Pause after every transaction, humantime syntax ("1s", "250ms").
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,
    #[serde(default = "default_image_path")]
    pub image_path: PathBuf,
    #[serde(default = "default_product_name")]
    pub product_name: String,
    #[serde(default = "default_product_description")]
    pub product_description: String,
    #[serde(default = "default_product_price")]
    pub product_price: u64,
    #[serde(default = "default_fund_amount")]
    pub fund_amount: u64,
    #[serde(default = "default_approve_gas_limit")]
    pub approve_gas_limit: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            image_path: default_image_path(),
            product_name: default_product_name(),
            product_description: default_product_description(),
            product_price: default_product_price(),
            fund_amount: default_fund_amount(),
            approve_gas_limit: default_approve_gas_limit(),
        }
    }
}

impl DemoConfig {
    pub fn settle_delay(&self) -> Result<Duration> {
        humantime::parse_duration(&self.settle_delay).map_err(|e| {
            HarnessError::Config(format!(
                "demo.settle_delay '{}' is not a duration: {}",
                self.settle_delay, e
            ))
        })
    }
}

impl Config {
    /// Check the values every binary relies on.
    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_url.is_empty() {
            return Err(HarnessError::Config("chain.rpc_url must be set".to_string()));
        }
        if self.storage.url.is_empty() {
            return Err(HarnessError::Config("storage.url must be set".to_string()));
        }
        if self.chain.port == 0 || self.storage.port == 0 {
            return Err(HarnessError::Config(
                "chain.port and storage.port must be non-zero".to_string(),
            ));
        }
        if self.storage.max_body_bytes == 0 {
            return Err(HarnessError::Config(
                "storage.max_body_bytes must be non-zero".to_string(),
            ));
        }
        self.demo.settle_delay()?;
        Ok(())
    }
}

/// Resolve which file to read: explicit path, then `HARNESS_CONFIG`, then `config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration, falling back to defaults when the file is absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = config_path(explicit);
    let config = if path.exists() {
        let config_str = fs::read_to_string(&path)?;
        parse_config(&config_str)?
    } else {
        if explicit.is_some() {
            return Err(HarnessError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    toml::from_str(config_str).map_err(|e| HarnessError::Config(e.to_string()))
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_chain_port() -> u16 {
    8545
}

fn default_storage_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_storage_port() -> u16 {
    8000
}

fn default_backend() -> StorageBackend {
    StorageBackend::Memory
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./data/blocks.sqlite")
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

fn default_addresses_path() -> PathBuf {
    PathBuf::from("contracts/addresses.json")
}

fn default_statuses_path() -> PathBuf {
    PathBuf::from("statuses.json")
}

fn default_supply_chain_abi() -> PathBuf {
    PathBuf::from("contracts/SupplyChainContract/abi.json")
}

fn default_token_abi() -> PathBuf {
    PathBuf::from("contracts/ERC20Contract/abi.json")
}

fn default_supply_chain_bytecode() -> PathBuf {
    PathBuf::from("contracts/SupplyChainContract/bytecode.json")
}

fn default_settle_delay() -> String {
    "1s".to_string()
}

fn default_image_path() -> PathBuf {
    PathBuf::from("tshirt.jpg")
}

fn default_product_name() -> String {
    "T Shirt".to_string()
}

fn default_product_description() -> String {
    "Good Design Tshirt".to_string()
}

fn default_product_price() -> u64 {
    100
}

fn default_fund_amount() -> u64 {
    10_000
}

fn default_approve_gas_limit() -> u64 {
    1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_port_override_moves_rpc_url() {
        let mut chain = ChainConfig::default();
        chain.override_port(9545).unwrap();
        assert_eq!(chain.port, 9545);
        assert_eq!(chain.rpc_url, "http://127.0.0.1:9545");

        let mut chain = ChainConfig {
            rpc_url: "http://localhost:8545/rpc".to_string(),
            ..ChainConfig::default()
        };
        chain.override_port(7000).unwrap();
        assert_eq!(chain.rpc_url, "http://localhost:7000/rpc");

        let mut chain = ChainConfig {
            rpc_url: "not a url".to_string(),
            ..ChainConfig::default()
        };
        assert!(chain.override_port(7000).is_err());
        assert_eq!(chain.port, 8545);
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = parse_config("").unwrap();
        assert_eq!(config.chain.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.storage.port, 8000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.demo.fund_amount, 10_000);
        assert_eq!(config.demo.product_price, 100);
        assert_eq!(config.demo.settle_delay().unwrap(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let config = parse_config(
            r#"
            [storage]
            backend = "sqlite"
            port = 9000

            [demo]
            settle_delay = "250ms"
            product_price = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.port, 9000);
        assert_eq!(config.storage.url, "http://localhost:8000");
        assert_eq!(
            config.demo.settle_delay().unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(config.demo.product_price, 42);
        assert_eq!(config.demo.product_name, "T Shirt");
    }

    #[test]
    fn test_bad_delay_rejected() {
        let config = parse_config("[demo]\nsettle_delay = \"soon\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("settle_delay"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(parse_config("[storage]\nbackend = \"s3\"\n").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("harness.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[chain]\nrpc_url = \"http://10.0.0.2:8545\"").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.chain.rpc_url, "http://10.0.0.2:8545");
        assert_eq!(config.chain.port, 8545);
    }
}
