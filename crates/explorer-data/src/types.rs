//! Type definitions for contracts and their ABI functions.

use std::fmt;

use alloy::primitives::{keccak256, Address};
use serde::{Deserialize, Serialize};

/// Declared state mutability of an ABI function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    /// Does not read or modify state.
    Pure,
    /// Reads state without modifying it.
    View,
    /// Modifies state, rejects ether.
    NonPayable,
    /// Modifies state, accepts ether.
    Payable,
}

impl Mutability {
    /// Parses the ABI `stateMutability` string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pure" => Some(Self::Pure),
            "view" => Some(Self::View),
            "nonpayable" => Some(Self::NonPayable),
            "payable" => Some(Self::Payable),
            _ => None,
        }
    }

    /// `view` and `pure` functions never mutate state.
    pub fn is_read(self) -> bool {
        matches!(self, Self::View | Self::Pure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::View => "view",
            Self::NonPayable => "nonpayable",
            Self::Payable => "payable",
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed function argument or return value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name (empty for unnamed return values).
    pub name: String,
    /// Solidity ABI type, e.g. `address` or `uint256`.
    #[serde(rename = "type")]
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.ty)
        } else {
            write!(f, "{} {}", self.ty, self.name)
        }
    }
}

/// One `function` entry of a contract ABI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Function name.
    pub name: String,
    /// Input arguments in declaration order.
    pub inputs: Vec<Param>,
    /// Return values in declaration order.
    pub outputs: Vec<Param>,
    /// Declared state mutability.
    pub mutability: Mutability,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
        mutability: Mutability,
    ) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            mutability,
        }
    }

    /// Whether this function belongs in the contract's `read` list.
    pub fn is_read(&self) -> bool {
        self.mutability.is_read()
    }

    /// Canonical signature used for selector hashing, e.g. `transfer(address,uint256)`.
    ///
    /// Tuple components are not expanded: the ABI type string is used as-is.
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.inputs.iter().map(|p| p.ty.as_str()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// First four bytes of `keccak256(signature)`.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        selector
    }
}

impl fmt::Display for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.inputs.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.name, args.join(","))?;
        if !self.outputs.is_empty() {
            let returns: Vec<String> = self.outputs.iter().map(ToString::to_string).collect();
            write!(f, " : {}", returns.join(","))?;
        }
        Ok(())
    }
}

/// A verified on-chain contract with its functions split by mutability.
///
/// Built once per discovered address and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractDescriptor {
    /// Contract address. `Display` renders the EIP-55 checksum form.
    pub address: Address,
    /// Declared contract name, empty if unknown.
    pub name: String,
    /// `view` and `pure` functions in ABI declaration order.
    pub read: Vec<FunctionDescriptor>,
    /// `nonpayable` and `payable` functions in ABI declaration order.
    pub write: Vec<FunctionDescriptor>,
}

impl ContractDescriptor {
    /// Splits `functions` into read and write lists, keeping their relative order.
    pub fn new(
        address: Address,
        name: impl Into<String>,
        functions: impl IntoIterator<Item = FunctionDescriptor>,
    ) -> Self {
        let (read, write) = functions.into_iter().partition(FunctionDescriptor::is_read);
        Self {
            address,
            name: name.into(),
            read,
            write,
        }
    }
}

/// Subset of block-explorer `getsourcecode` metadata used by the explorer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Declared contract name.
    pub contract_name: String,
    /// Compiler version string, e.g. `v0.8.19+commit.7dd6d404`.
    pub compiler_version: String,
    /// Whether the explorer flags the contract as a proxy.
    pub proxy: bool,
    /// Implementation address reported for proxies.
    pub implementation: Option<Address>,
}
