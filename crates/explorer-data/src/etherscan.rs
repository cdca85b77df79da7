//! Etherscan-compatible block-explorer client.
//!
//! Etherscan, Polygonscan and Gnosisscan share the same `/api` surface. Only two
//! actions of the `contract` module are used:
//!
//! - `getabi` returns the ABI as a JSON-encoded *string* inside `result`.
//! - `getsourcecode` returns an array of metadata objects (`ContractName`,
//!   `CompilerVersion`, `Proxy`, `Implementation`, ...).
//!
//! Every response is wrapped in `{ "status", "message", "result" }`. A status
//! of `"0"` with a "not verified" style result means the address simply has no
//! published source, which is reported as `Ok(None)`.

use std::time::Duration;

use alloy::primitives::Address;
use eyre::{eyre, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::source::MetadataSource;
use crate::types::SourceMetadata;

/// Per-request timeout for explorer calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Standard explorer response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    fn is_ok(&self) -> bool {
        self.status == "1"
    }

    /// Status `"0"` responses that mean "nothing published" rather than a failure.
    ///
    /// Blockscout-style explorers put the reason in `message` and leave
    /// `result` null, so both fields are checked.
    fn is_absent(&self) -> bool {
        let says_absent = |text: &str| {
            let text = text.to_ascii_lowercase();
            text.contains("not verified") || text.contains("no data found")
        };
        says_absent(&self.message) || self.result.as_str().is_some_and(says_absent)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSourceEntry {
    #[serde(default)]
    contract_name: String,
    #[serde(default)]
    compiler_version: String,
    #[serde(default)]
    proxy: String,
    #[serde(default)]
    implementation: String,
}

/// HTTP client for one explorer instance.
#[derive(Clone, Debug)]
pub struct EtherscanClient {
    client: reqwest::Client,
    /// Full endpoint, e.g. `https://api.etherscan.io/api`.
    endpoint: reqwest::Url,
    api_key: String,
}

impl EtherscanClient {
    /// Creates a client for an explorer base URL such as `https://api.polygonscan.com`.
    ///
    /// A trailing `/api` segment is optional.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let base = api_url.trim_end_matches('/');
        let endpoint = if base.ends_with("/api") {
            base.to_string()
        } else {
            format!("{base}/api")
        };
        let endpoint = reqwest::Url::parse(&endpoint)
            .wrap_err_with(|| format!("invalid explorer API URL: {api_url}"))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Issues `module=contract&action=<action>&address=<address>`.
    async fn contract_action(&self, action: &str, address: Address) -> Result<Envelope> {
        let address = address.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("module", "contract"),
                ("action", action),
                ("address", address.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .wrap_err_with(|| format!("explorer {action} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("explorer {} returned HTTP {}", action, status.as_u16()));
        }

        response
            .json::<Envelope>()
            .await
            .wrap_err_with(|| format!("failed to decode explorer {action} response"))
    }
}

impl MetadataSource for EtherscanClient {
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_abi(&self, address: Address) -> Result<Option<String>> {
        let envelope = self.contract_action("getabi", address).await?;
        decode_abi_response(envelope)
    }

    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn get_source_metadata(&self, address: Address) -> Result<Option<SourceMetadata>> {
        let envelope = self.contract_action("getsourcecode", address).await?;
        decode_source_response(envelope)
    }
}

/// Extracts the ABI text from a `getabi` envelope.
///
/// # Errors
/// Returns error for explorer-side failures (bad API key, rate limit) and for
/// successful envelopes whose `result` is not a string.
pub fn decode_abi_response(envelope: Envelope) -> Result<Option<String>> {
    if !envelope.is_ok() {
        if envelope.is_absent() {
            return Ok(None);
        }
        return Err(explorer_error("getabi", &envelope));
    }

    match envelope.result {
        Value::String(abi) => Ok(Some(abi)),
        other => Err(eyre!("getabi result is not a string: {other}")),
    }
}

/// Extracts the first metadata entry from a `getsourcecode` envelope.
///
/// # Errors
/// Returns error for explorer-side failures and unparseable result arrays.
pub fn decode_source_response(envelope: Envelope) -> Result<Option<SourceMetadata>> {
    if !envelope.is_ok() {
        if envelope.is_absent() {
            return Ok(None);
        }
        return Err(explorer_error("getsourcecode", &envelope));
    }

    let entries: Vec<RawSourceEntry> = serde_json::from_value(envelope.result)
        .wrap_err("getsourcecode result is not an array of metadata entries")?;

    Ok(entries.into_iter().next().map(|entry| SourceMetadata {
        contract_name: entry.contract_name,
        compiler_version: entry.compiler_version,
        proxy: entry.proxy == "1",
        implementation: entry.implementation.parse::<Address>().ok(),
    }))
}

fn explorer_error(action: &str, envelope: &Envelope) -> eyre::Report {
    let detail = match &envelope.result {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    eyre!("explorer {} failed: {} ({})", action, envelope.message, detail)
}
