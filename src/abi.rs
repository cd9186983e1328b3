//! ABI-driven argument coercion and value rendering
//!
//! Contract calls are described by the JSON ABI shipped with the contracts,
//! so the harness never hard-codes selectors. Arguments are given as a small
//! typed [`Arg`] and coerced to whatever Solidity type the ABI declares for
//! that parameter (an enum role arrives as `uint8`, a price as `uint256`).

use crate::error::{HarnessError, Result};
use alloy::dyn_abi::{DynSolType, DynSolValue, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, U256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Uint(U256),
    Address(Address),
    Str(String),
}

impl From<u8> for Arg {
    fn from(v: u8) -> Self {
        Arg::Uint(U256::from(v))
    }
}

impl From<u64> for Arg {
    fn from(v: u64) -> Self {
        Arg::Uint(U256::from(v))
    }
}

impl From<U256> for Arg {
    fn from(v: U256) -> Self {
        Arg::Uint(v)
    }
}

impl From<Address> for Arg {
    fn from(v: Address) -> Self {
        Arg::Address(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

/// Coerce one argument to the declared parameter type.
pub fn coerce(arg: &Arg, ty: &DynSolType) -> Result<DynSolValue> {
    match (arg, ty) {
        (Arg::Uint(v), DynSolType::Uint(bits)) => {
            if *bits < 256 && v.bit_len() > *bits {
                return Err(HarnessError::AbiError(format!(
                    "{} does not fit in uint{}",
                    v, bits
                )));
            }
            Ok(DynSolValue::Uint(*v, *bits))
        }
        (Arg::Address(a), DynSolType::Address) => Ok(DynSolValue::Address(*a)),
        (Arg::Str(s), DynSolType::String) => Ok(DynSolValue::String(s.clone())),
        (arg, ty) => Err(HarnessError::AbiError(format!(
            "cannot pass {:?} as {}",
            arg,
            ty.sol_type_name()
        ))),
    }
}

/// Find the overload of `name` that takes `arity` inputs.
pub fn resolve_function<'a>(abi: &'a JsonAbi, name: &str, arity: usize) -> Result<&'a Function> {
    let overloads = abi
        .function(name)
        .ok_or_else(|| HarnessError::AbiError(format!("ABI has no function '{}'", name)))?;
    overloads
        .iter()
        .find(|f| f.inputs.len() == arity)
        .ok_or_else(|| {
            HarnessError::AbiError(format!(
                "function '{}' takes no {}-argument form",
                name, arity
            ))
        })
}

/// Selector-prefixed calldata for `name(args...)`.
pub fn encode_call(abi: &JsonAbi, name: &str, args: &[Arg]) -> Result<Vec<u8>> {
    let function = resolve_function(abi, name, args.len())?;
    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| -> Result<DynSolValue> {
            let ty = param.resolve()?;
            coerce(arg, &ty)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(function.abi_encode_input(&values)?)
}

pub fn decode_output(abi: &JsonAbi, name: &str, arity: usize, data: &[u8]) -> Result<Vec<DynSolValue>> {
    let function = resolve_function(abi, name, arity)?;
    Ok(function.abi_decode_output(data, true)?)
}

/// Human-readable rendering used by log lines and the summary table.
pub fn render(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(v, _) => v.to_string(),
        DynSolValue::Uint(v, _) => v.to_string(),
        DynSolValue::Address(a) => a.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::FixedBytes(word, size) => alloy::hex::encode_prefixed(&word[..*size]),
        DynSolValue::Bytes(b) => alloy::hex::encode_prefixed(b),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            format!("[{}]", render_all(items).join(", "))
        }
        DynSolValue::Tuple(items) => format!("({})", render_all(items).join(", ")),
        other => format!("{:?}", other),
    }
}

pub fn render_all(values: &[DynSolValue]) -> Vec<String> {
    values.iter().map(render).collect()
}
