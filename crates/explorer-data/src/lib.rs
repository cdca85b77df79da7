//! explorer-data crate
//!
//! Contract and ABI function types, raw ABI parsing, and the network-facing
//! collaborators: block-explorer metadata, JSON-RPC calls, network profiles.

pub mod abi;
pub mod etherscan;
pub mod network;
pub mod rpc;
pub mod source;
pub mod types;

pub use source::{ContractCaller, MetadataSource};
pub use types::{ContractDescriptor, FunctionDescriptor, Mutability, Param, SourceMetadata};
