//! Network profiles and credential loading.
//!
//! A profile bundles the RPC endpoint and block-explorer credentials for one
//! supported network. Values come from the process environment, optionally
//! seeded from a `.env` file:
//!
//! | Network  | RPC              | Explorer URL          | Explorer key          |
//! |----------|------------------|-----------------------|-----------------------|
//! | Ethereum | `ETHERSCAN_RPC`  | `ETHERSCAN_API_URL`   | `ETHERSCAN_API_KEY`   |
//! | Gnosis   | `GNOSIS_RPC`     | `GNOSIS_API_URL`      | `GNOSIS_API_KEY`      |
//! | Polygon  | `POLYGON_RPC`    | `POLYGONSCAN_API_URL` | `POLYGONSCAN_API_KEY` |

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use eyre::{eyre, Context, Result};

use crate::etherscan::EtherscanClient;
use crate::rpc::RpcClient;

/// Supported networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    Ethereum,
    Gnosis,
    Polygon,
}

/// Environment variable names for one network.
struct EnvKeys {
    rpc: &'static str,
    api_url: &'static str,
    api_key: &'static str,
}

impl Network {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Gnosis => "gnosis",
            Self::Polygon => "polygon",
        }
    }

    /// Gnosis and Polygon are proof-of-authority chains with oversized `extraData`.
    pub fn is_poa(self) -> bool {
        matches!(self, Self::Gnosis | Self::Polygon)
    }

    fn env_keys(self) -> EnvKeys {
        match self {
            Self::Ethereum => EnvKeys {
                rpc: "ETHERSCAN_RPC",
                api_url: "ETHERSCAN_API_URL",
                api_key: "ETHERSCAN_API_KEY",
            },
            Self::Gnosis => EnvKeys {
                rpc: "GNOSIS_RPC",
                api_url: "GNOSIS_API_URL",
                api_key: "GNOSIS_API_KEY",
            },
            Self::Polygon => EnvKeys {
                rpc: "POLYGON_RPC",
                api_url: "POLYGONSCAN_API_URL",
                api_key: "POLYGONSCAN_API_KEY",
            },
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Endpoints and credentials for the selected network.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub network: Network,
    pub rpc_url: String,
    pub explorer_api_url: String,
    pub explorer_api_key: String,
    /// Proof-of-authority header compatibility.
    pub poa: bool,
}

// Keeps the API key out of logs.
impl fmt::Debug for NetworkProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkProfile")
            .field("network", &self.network)
            .field("rpc_url", &self.rpc_url)
            .field("explorer_api_url", &self.explorer_api_url)
            .field("explorer_api_key", &"<redacted>")
            .field("poa", &self.poa)
            .finish()
    }
}

impl NetworkProfile {
    /// Builds the profile for `network` from an environment snapshot.
    ///
    /// # Errors
    /// Returns error naming the first missing or empty variable.
    pub fn from_env(network: Network, env: &HashMap<String, String>) -> Result<Self> {
        let keys = network.env_keys();
        let lookup = |key: &str| -> Result<String> {
            env.get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| eyre!("{key} is required for the {network} network"))
        };

        Ok(Self {
            network,
            rpc_url: lookup(keys.rpc)?,
            explorer_api_url: lookup(keys.api_url)?,
            explorer_api_key: lookup(keys.api_key)?,
            poa: network.is_poa(),
        })
    }

    /// Creates the explorer and RPC clients for this profile.
    ///
    /// # Errors
    /// Returns error if either URL is malformed.
    pub fn clients(&self) -> Result<(EtherscanClient, RpcClient)> {
        let explorer = EtherscanClient::new(&self.explorer_api_url, &self.explorer_api_key)
            .wrap_err_with(|| format!("invalid explorer configuration for {}", self.network))?;
        let rpc = RpcClient::new(&self.rpc_url)
            .wrap_err_with(|| format!("invalid RPC configuration for {}", self.network))?;
        Ok((explorer, rpc))
    }
}

/// Loads `dotenv_path` (or `./.env` when `None`) into the process environment
/// and returns a snapshot of all variables.
///
/// Variables already set in the environment win over the file. A missing
/// default `.env` is not an error; a missing explicit path is.
///
/// # Errors
/// Returns error if an explicitly given file cannot be read or parsed.
pub fn load_env(dotenv_path: Option<&Path>) -> Result<HashMap<String, String>> {
    match dotenv_path {
        Some(path) => {
            dotenvy::from_path(path)
                .wrap_err_with(|| format!("failed to load {}", path.display()))?;
        }
        None => match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => tracing::debug!("no .env file found"),
            Err(err) => return Err(err).wrap_err("failed to parse .env"),
        },
    }
    Ok(std::env::vars().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn ethereum_profile_from_env() {
        let vars = env(&[
            ("ETHERSCAN_RPC", "https://eth.llamarpc.com"),
            ("ETHERSCAN_API_URL", "https://api.etherscan.io"),
            ("ETHERSCAN_API_KEY", "KEY"),
        ]);
        let profile = NetworkProfile::from_env(Network::Ethereum, &vars).unwrap();
        assert_eq!(profile.rpc_url, "https://eth.llamarpc.com");
        assert_eq!(profile.explorer_api_key, "KEY");
        assert!(!profile.poa);
        assert!(profile.clients().is_ok());
    }

    #[test]
    fn poa_flag_for_side_chains() {
        assert!(Network::Gnosis.is_poa());
        assert!(Network::Polygon.is_poa());
        assert!(!Network::Ethereum.is_poa());
    }

    #[test]
    fn missing_key_is_named_in_error() {
        let vars = env(&[
            ("POLYGON_RPC", "https://polygon-rpc.com"),
            ("POLYGONSCAN_API_URL", "https://api.polygonscan.com"),
            ("POLYGONSCAN_API_KEY", "   "),
        ]);
        let err = NetworkProfile::from_env(Network::Polygon, &vars).unwrap_err();
        assert!(err.to_string().contains("POLYGONSCAN_API_KEY"));
    }

    #[test]
    fn profiles_do_not_share_keys() {
        let vars = env(&[
            ("ETHERSCAN_RPC", "https://eth.llamarpc.com"),
            ("ETHERSCAN_API_URL", "https://api.etherscan.io"),
            ("ETHERSCAN_API_KEY", "KEY"),
        ]);
        assert!(NetworkProfile::from_env(Network::Gnosis, &vars).is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let vars = env(&[
            ("GNOSIS_RPC", "https://rpc.gnosischain.com"),
            ("GNOSIS_API_URL", "https://api.gnosisscan.io"),
            ("GNOSIS_API_KEY", "SECRET"),
        ]);
        let profile = NetworkProfile::from_env(Network::Gnosis, &vars).unwrap();
        assert!(!format!("{profile:?}").contains("SECRET"));
    }

    #[test]
    fn invalid_url_fails_client_construction() {
        let vars = env(&[
            ("ETHERSCAN_RPC", "not-a-url"),
            ("ETHERSCAN_API_URL", "https://api.etherscan.io"),
            ("ETHERSCAN_API_KEY", "KEY"),
        ]);
        let profile = NetworkProfile::from_env(Network::Ethereum, &vars).unwrap();
        assert!(profile.clients().is_err());
    }
}
