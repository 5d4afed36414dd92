//! Environment-driven configuration for the deployment script.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use optisubs::artifact::DEFAULT_ARTIFACT_PATH;
use url::Url;

pub const DEFAULT_RPC_URL: &str = "https://rpc.ankr.com/optimism";

/// Deploys the subscription contract and runs one subscribe/unsubscribe cycle.
///
/// Every setting comes from the environment; command-line arguments are not read.
#[derive(Parser, Debug)]
#[command(name = "optisubs-deploy")]
pub struct Config {
    /// Hex-encoded private key of the signing account
    #[arg(long, env = "PRIVATEKEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// JSON-RPC endpoint
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Compiled contract artifact holding the creation bytecode
    #[arg(long, env = "OPTISUBS_ARTIFACT", default_value = DEFAULT_ARTIFACT_PATH)]
    pub artifact: PathBuf,

    /// Interval between receipt polls, in milliseconds
    #[arg(long, env = "OPTISUBS_POLL_INTERVAL_MS", default_value = "2000")]
    pub poll_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::try_parse_from([env!("CARGO_PKG_NAME")]).context("Invalid configuration")
    }

    pub fn private_key(&self) -> Result<&str> {
        self.private_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .context("PRIVATEKEY is not set")
    }

    pub fn rpc_url(&self) -> Result<Url> {
        Url::parse(&self.rpc_url).with_context(|| format!("Invalid RPC URL '{}'", self.rpc_url))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(rpc_url: &str, private_key: Option<&str>) -> Config {
        Config {
            private_key: private_key.map(str::to_string),
            rpc_url: rpc_url.to_string(),
            artifact: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            poll_interval_ms: 0,
        }
    }

    #[test]
    fn test_missing_private_key() {
        assert!(config(DEFAULT_RPC_URL, None).private_key().is_err());
        assert!(config(DEFAULT_RPC_URL, Some("")).private_key().is_err());
        assert_eq!(config(DEFAULT_RPC_URL, Some("0xabc")).private_key().unwrap(), "0xabc");
    }

    #[test]
    fn test_rpc_url_is_validated() {
        assert!(config(DEFAULT_RPC_URL, None).rpc_url().is_ok());
        assert!(config("not a url", None).rpc_url().is_err());
    }

    #[test]
    fn test_poll_interval_never_zero() {
        assert_eq!(config(DEFAULT_RPC_URL, None).poll_interval(), Duration::from_millis(1));
    }
}
