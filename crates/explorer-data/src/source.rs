//! Collaborator traits consumed by the resolver and traversal engine.
//!
//! [`crate::etherscan::EtherscanClient`] and [`crate::rpc::RpcClient`] are the
//! network-backed implementations; tests plug in in-memory doubles.

use alloy::primitives::Address;
use eyre::Result;

use crate::types::{FunctionDescriptor, SourceMetadata};

/// Source of published contract metadata (a block explorer).
#[allow(async_fn_in_trait)]
pub trait MetadataSource {
    /// Raw JSON ABI text, `None` if the address has no verified source.
    async fn get_abi(&self, address: Address) -> Result<Option<String>>;

    /// Source-code metadata, `None` if unavailable.
    async fn get_source_metadata(&self, address: Address) -> Result<Option<SourceMetadata>>;
}

/// Executes read-only calls against deployed contracts.
#[allow(async_fn_in_trait)]
pub trait ContractCaller {
    /// Calls zero-argument `function` on `contract` and decodes a single `address` return.
    async fn call_address(&self, contract: Address, function: &FunctionDescriptor)
        -> Result<Address>;
}

impl<T: MetadataSource> MetadataSource for &T {
    async fn get_abi(&self, address: Address) -> Result<Option<String>> {
        (**self).get_abi(address).await
    }

    async fn get_source_metadata(&self, address: Address) -> Result<Option<SourceMetadata>> {
        (**self).get_source_metadata(address).await
    }
}

impl<T: ContractCaller> ContractCaller for &T {
    async fn call_address(
        &self,
        contract: Address,
        function: &FunctionDescriptor,
    ) -> Result<Address> {
        (**self).call_address(contract, function).await
    }
}
