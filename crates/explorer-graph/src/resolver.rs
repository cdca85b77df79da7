//! Contract resolution from block-explorer metadata.
//!
//! Unverified contracts, EOAs and empty accounts have no published ABI; they
//! resolve to [`Resolution::NotFound`] and are treated as dead ends by the
//! traversal. Explorer transport failures are logged and folded into
//! `NotFound` as well, so a flaky explorer never aborts a walk.

use alloy::primitives::Address;
use explorer_data::abi::parse_abi;
use explorer_data::source::MetadataSource;
use explorer_data::types::ContractDescriptor;

/// Outcome of resolving one address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Verified contract with classified functions.
    Found(ContractDescriptor),
    /// No ABI published (or the explorer could not be reached).
    NotFound,
    /// An ABI was published but could not be parsed.
    Malformed(String),
}

/// Builds [`ContractDescriptor`]s from a [`MetadataSource`].
#[derive(Clone, Debug)]
pub struct ContractResolver<M> {
    source: M,
}

impl<M: MetadataSource> ContractResolver<M> {
    pub fn new(source: M) -> Self {
        Self { source }
    }

    /// Fetches the ABI and contract name for `address`.
    ///
    /// The name lookup is best-effort: any failure leaves it empty.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, address: Address) -> Resolution {
        let abi = match self.source.get_abi(address).await {
            Ok(Some(abi)) => abi,
            Ok(None) => return Resolution::NotFound,
            Err(err) => {
                tracing::warn!(%address, "ABI lookup failed: {:#}", err);
                return Resolution::NotFound;
            }
        };

        let functions = match parse_abi(&abi) {
            Ok(functions) => functions,
            Err(err) => return Resolution::Malformed(format!("{err:#}")),
        };

        let name = match self.source.get_source_metadata(address).await {
            Ok(Some(meta)) => {
                if meta.proxy {
                    tracing::debug!(
                        %address,
                        implementation = ?meta.implementation,
                        "explorer reports a proxy contract"
                    );
                }
                meta.contract_name
            }
            Ok(None) => String::new(),
            Err(err) => {
                tracing::debug!(%address, "source metadata lookup failed: {:#}", err);
                String::new()
            }
        };

        Resolution::Found(ContractDescriptor::new(address, name, functions))
    }
}
