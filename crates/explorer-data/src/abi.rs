//! Raw JSON ABI parsing.
//!
//! Walks the ABI array in declaration order and keeps only named `function`
//! entries. Constructors, events, errors, `fallback` and `receive` entries are
//! dropped. Legacy ABIs (pre-0.5 compilers) that carry `constant`/`payable`
//! instead of `stateMutability` are mapped onto [`Mutability`].

use eyre::{eyre, Context, Result};
use serde::Deserialize;

use crate::types::{FunctionDescriptor, Mutability, Param};

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default = "default_entry_type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<String>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    ty: Option<String>,
    #[serde(default)]
    components: Vec<RawParam>,
}

// The ABI spec allows `type` to be omitted, meaning "function".
fn default_entry_type() -> String {
    "function".to_string()
}

/// Parses a JSON ABI document into function descriptors, in declaration order.
///
/// # Errors
/// Returns error if the text is not a JSON array of ABI entries, or if a
/// function declares an unknown `stateMutability`.
pub fn parse_abi(json: &str) -> Result<Vec<FunctionDescriptor>> {
    let entries: Vec<RawEntry> =
        serde_json::from_str(json).wrap_err("ABI is not a JSON array of entries")?;

    let mut functions = Vec::new();
    for entry in entries {
        if entry.kind != "function" {
            continue;
        }
        let name = match entry.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        let mutability = entry_mutability(&entry)
            .ok_or_else(|| eyre!("function `{name}` has unknown state mutability"))?;

        functions.push(FunctionDescriptor {
            name,
            inputs: convert_params(&entry.inputs),
            outputs: convert_params(&entry.outputs),
            mutability,
        });
    }

    Ok(functions)
}

fn entry_mutability(entry: &RawEntry) -> Option<Mutability> {
    if let Some(state) = entry.state_mutability.as_deref() {
        return Mutability::parse(state);
    }
    if entry.constant == Some(true) {
        Some(Mutability::View)
    } else if entry.payable == Some(true) {
        Some(Mutability::Payable)
    } else {
        Some(Mutability::NonPayable)
    }
}

/// Parameters without a `type` are skipped.
fn convert_params(params: &[RawParam]) -> Vec<Param> {
    params
        .iter()
        .filter_map(|param| {
            let ty = canonical_type(param)?;
            Some(Param {
                name: param.name.clone().unwrap_or_default(),
                ty,
            })
        })
        .collect()
}

/// Expands `tuple`, `tuple[]`, `tuple[2]` into their component form, e.g. `(address,uint256)[]`.
fn canonical_type(param: &RawParam) -> Option<String> {
    let ty = param.ty.as_deref()?;
    match ty.strip_prefix("tuple") {
        Some(suffix) => {
            let components: Option<Vec<String>> =
                param.components.iter().map(canonical_type).collect();
            Some(format!("({}){}", components?.join(","), suffix))
        }
        None => Some(ty.to_string()),
    }
}
