//! Application context for read-only chain access.
//!
//! Holds the provider the live readers query. Nothing here signs or sends
//! transactions: live mode only observes.

use alloy::{
    network::Ethereum,
    providers::{Provider, ProviderBuilder, RootProvider},
};
use eyre::Result;
use log::info;
use url::Url;

use crate::config::LiveConfig;

/// Application context holding the shared network provider.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// HTTP connection to the configured node
    pub provider: RootProvider<Ethereum>,
}

impl AppContext {
    /// Creates a context connected to `rpc_url`.
    ///
    /// # Arguments
    /// * `rpc_url` - HTTP endpoint of the node
    #[must_use]
    pub fn new(rpc_url: Url) -> Self {
        info!("utils::app_context: connecting to {}", rpc_url.host_str().unwrap_or("node"));
        let provider = ProviderBuilder::new().on_http(rpc_url);
        Self {
            provider: (*provider.root()).clone(),
        }
    }

    /// Creates a context from the live configuration.
    ///
    /// # Errors
    /// * If the RPC URL is not an HTTP(S) endpoint
    pub fn from_config(config: &LiveConfig) -> Result<Self> {
        match config.rpc_url.scheme() {
            "http" | "https" => Ok(Self::new(config.rpc_url.clone())),
            scheme => Err(eyre::eyre!("unsupported RPC scheme {scheme}, expected http(s)")),
        }
    }

    /// Latest block number, as a connectivity check.
    ///
    /// # Errors
    /// * If the node cannot be reached
    pub async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }
}
