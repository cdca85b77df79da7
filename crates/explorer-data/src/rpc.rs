//! Minimal JSON-RPC client for read-only contract calls.
//!
//! Only `eth_chainId` (connectivity check) and `eth_call` are needed, so the
//! client posts raw JSON-RPC payloads and decodes the hex results itself.

use std::time::Duration;

use alloy::hex;
use alloy::primitives::Address;
use eyre::{eyre, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::source::ContractCaller;
use crate::types::FunctionDescriptor;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// JSON-RPC client bound to one endpoint.
#[derive(Clone, Debug)]
pub struct RpcClient {
    client: reqwest::Client,
    rpc_url: reqwest::Url,
}

impl RpcClient {
    /// Creates a client for `rpc_url` without contacting it.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url = reqwest::Url::parse(rpc_url).wrap_err("invalid RPC URL format")?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client")?;
        Ok(Self { client, rpc_url })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.rpc_url.clone())
            .json(&payload)
            .send()
            .await
            .wrap_err_with(|| format!("{method} request failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre!("{} HTTP status: {}", method, status));
        }

        let rpc: RpcResponse<T> = response
            .json()
            .await
            .wrap_err_with(|| format!("failed to decode {method} response"))?;

        if let Some(error) = rpc.error {
            return Err(eyre!(
                "{} RPC error {}: {}",
                method,
                error.code,
                error.message
            ));
        }

        rpc.result.ok_or_else(|| eyre!("{} missing result", method))
    }

    /// Returns the endpoint's chain id.
    ///
    /// # Errors
    /// Returns error if the endpoint is unreachable or answers garbage.
    #[tracing::instrument(skip_all, fields(rpc_url = %self.rpc_url))]
    pub async fn chain_id(&self) -> Result<u64> {
        let hex_id: String = self
            .request("eth_chainId", serde_json::json!([]))
            .await?;
        let digits = hex_id.trim_start_matches("0x");
        u64::from_str_radix(digits, 16)
            .wrap_err_with(|| format!("invalid eth_chainId result: {hex_id}"))
    }

    /// Executes `eth_call` against the latest block and returns the raw return data.
    ///
    /// # Errors
    /// Returns error on transport failure, reverts, or non-hex results.
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": format!("{to:#x}"),
                "data": hex::encode_prefixed(data),
            },
            "latest"
        ]);
        let result: String = self.request("eth_call", params).await?;
        hex::decode(&result).wrap_err_with(|| format!("eth_call returned non-hex data: {result}"))
    }
}

impl ContractCaller for RpcClient {
    #[tracing::instrument(skip(self, function), fields(function = %function.name))]
    async fn call_address(
        &self,
        contract: Address,
        function: &FunctionDescriptor,
    ) -> Result<Address> {
        if !function.inputs.is_empty() {
            return Err(eyre!(
                "{} takes {} arguments, only zero-argument calls are supported",
                function.name,
                function.inputs.len()
            ));
        }
        let output = self.eth_call(contract, &function.selector()).await?;
        decode_address_word(&output)
            .wrap_err_with(|| format!("failed to decode {}() return value", function.name))
    }
}

/// Decodes the first ABI word of `data` as an `address`.
///
/// The word must be 32 bytes with the upper 12 bytes zero.
///
/// # Errors
/// Returns error for empty/short data (e.g. calls to accounts without code)
/// and for words that are not valid addresses.
pub fn decode_address_word(data: &[u8]) -> Result<Address> {
    if data.len() < 32 {
        return Err(eyre!(
            "return data too short: expected 32 bytes, got {}",
            data.len()
        ));
    }
    let word = &data[..32];
    if word[..12].iter().any(|byte| *byte != 0) {
        return Err(eyre!("return word is not an ABI-encoded address"));
    }
    Ok(Address::from_slice(&word[12..]))
}
