//! Deployed contract addresses and the compiled contract artifacts

use crate::error::{HarnessError, Result};
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Contents of `contracts/addresses.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub supply_chain: Address,
    pub token: Address,
}

impl ContractAddresses {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            HarnessError::LookupError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AbiFile {
    Bare(JsonAbi),
    Wrapped { abi: JsonAbi },
}

/// Reads an ABI given either as a bare item array or as `{ "abi": [...] }`.
pub fn parse_abi(data: &str) -> Result<JsonAbi> {
    let file: AbiFile = serde_json::from_str(data)
        .map_err(|e| HarnessError::AbiError(format!("unrecognized ABI file: {}", e)))?;
    Ok(match file {
        AbiFile::Bare(abi) => abi,
        AbiFile::Wrapped { abi } => abi,
    })
}

pub fn load_abi(path: &Path) -> Result<JsonAbi> {
    let data = fs::read_to_string(path)
        .map_err(|e| HarnessError::AbiError(format!("cannot read {}: {}", path.display(), e)))?;
    parse_abi(&data)
}

#[derive(Deserialize)]
struct BytecodeFile {
    bytecode: BytecodeObject,
}

#[derive(Deserialize)]
struct BytecodeObject {
    object: String,
}

/// Reads creation bytecode from `{ "bytecode": { "object": "0x..." } }`.
pub fn parse_bytecode(data: &str) -> Result<Bytes> {
    let file: BytecodeFile = serde_json::from_str(data)?;
    let code = alloy::hex::decode(file.bytecode.object.trim())
        .map_err(|e| HarnessError::AbiError(format!("bytecode is not hex: {}", e)))?;
    if code.is_empty() {
        return Err(HarnessError::AbiError("bytecode is empty".to_string()));
    }
    Ok(Bytes::from(code))
}

pub fn load_bytecode(path: &Path) -> Result<Bytes> {
    let data = fs::read_to_string(path)
        .map_err(|e| HarnessError::AbiError(format!("cannot read {}: {}", path.display(), e)))?;
    parse_bytecode(&data)
}
