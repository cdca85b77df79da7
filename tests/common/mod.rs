//! Shared test helpers and utilities.
//!
//! Provides an in-memory chain that plays both the block explorer and the RPC
//! node, plus small ABI builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::Address;
use explorer_data::source::{ContractCaller, MetadataSource};
use explorer_data::types::{FunctionDescriptor, SourceMetadata};
use explorer_graph::{ContractGraph, ContractResolver, TraversalEngine};
use eyre::{eyre, Result};

/// Creates a deterministic address whose last byte is `n`.
pub fn addr(n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    Address::from(bytes)
}

/// ABI entry for a zero-argument `view` getter returning one address.
pub fn address_getter(name: &str) -> String {
    format!(
        r#"{{"type":"function","name":"{name}","inputs":[],"outputs":[{{"name":"","type":"address"}}],"stateMutability":"view"}}"#
    )
}

/// ABI entry with explicit input/output types and mutability.
pub fn function_entry(name: &str, inputs: &[&str], outputs: &[&str], mutability: &str) -> String {
    let params = |types: &[&str]| -> String {
        types
            .iter()
            .enumerate()
            .map(|(i, ty)| format!(r#"{{"name":"p{i}","type":"{ty}"}}"#))
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        r#"{{"type":"function","name":"{name}","inputs":[{}],"outputs":[{}],"stateMutability":"{mutability}"}}"#,
        params(inputs),
        params(outputs)
    )
}

/// Joins entries into a JSON ABI array.
pub fn abi(entries: &[String]) -> String {
    format!("[{}]", entries.join(","))
}

/// In-memory explorer + RPC node.
#[derive(Default)]
pub struct MockChain {
    abis: HashMap<Address, String>,
    names: HashMap<Address, String>,
    returns: HashMap<(Address, String), Address>,
    /// Every `(contract, function)` call in the order it was made.
    pub calls: Mutex<Vec<(Address, String)>>,
    /// Every ABI lookup in the order it was made.
    pub abi_lookups: Mutex<Vec<Address>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `abi` and `name` for `address`.
    pub fn verified(mut self, address: Address, name: &str, abi: String) -> Self {
        self.abis.insert(address, abi);
        self.names.insert(address, name.to_string());
        self
    }

    /// Makes `function()` on `contract` return `target`. Unregistered calls revert.
    pub fn returns(mut self, contract: Address, function: &str, target: Address) -> Self {
        self.returns.insert((contract, function.to_string()), target);
        self
    }

    pub fn call_log(&self) -> Vec<(Address, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn abi_lookup_count(&self) -> usize {
        self.abi_lookups.lock().unwrap().len()
    }
}

impl MetadataSource for MockChain {
    async fn get_abi(&self, address: Address) -> Result<Option<String>> {
        self.abi_lookups.lock().unwrap().push(address);
        Ok(self.abis.get(&address).cloned())
    }

    async fn get_source_metadata(&self, address: Address) -> Result<Option<SourceMetadata>> {
        Ok(self.names.get(&address).map(|name| SourceMetadata {
            contract_name: name.clone(),
            ..Default::default()
        }))
    }
}

impl ContractCaller for MockChain {
    async fn call_address(&self, contract: Address, function: &FunctionDescriptor) -> Result<Address> {
        self.calls
            .lock()
            .unwrap()
            .push((contract, function.name.clone()));
        self.returns
            .get(&(contract, function.name.clone()))
            .copied()
            .ok_or_else(|| eyre!("execution reverted"))
    }
}

/// Engine that uses `chain` as both explorer and RPC node.
pub fn engine(chain: &MockChain) -> TraversalEngine<&MockChain, &MockChain> {
    TraversalEngine::new(ContractResolver::new(chain), chain)
}

/// Edges as `(source byte, function, target byte)` for compact assertions.
pub fn edge_triples(graph: &ContractGraph) -> Vec<(u8, String, u8)> {
    graph
        .edges()
        .iter()
        .map(|edge| {
            (
                edge.source.as_slice()[19],
                edge.function.clone(),
                edge.target.as_slice()[19],
            )
        })
        .collect()
}
