use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chain::ClientConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chain whose fee market base fee drives gas prices, and whose wallet answers
    /// support checks.
    pub primary_chain_id: String,
    // Proxies posting { restEndpoint, tx_bytes }; the node's own routes when unset
    #[serde(default)]
    pub broadcast_url: Option<String>,
    #[serde(default)]
    pub simulate_url: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
    #[serde(default)]
    pub chain_name: String,
    pub rest: String,
    pub rpc: String,
    pub bech32_prefix: String,
    #[serde(default)]
    pub fee_tokens: Vec<FeeToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeToken {
    pub denom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_gas_price: Option<f64>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                primary_chain_id: "localnet-1".to_string(),
                broadcast_url: None,
                simulate_url: None,
                request_timeout_secs: default_request_timeout(),
                connect_timeout_secs: default_connect_timeout(),
            },
            chains: vec![ChainConfig {
                chain_id: "localnet-1".to_string(),
                chain_name: "localosmosis".to_string(),
                rest: "http://localhost:1317".to_string(),
                rpc: "http://localhost:26657".to_string(),
                bech32_prefix: "osmo".to_string(),
                fee_tokens: vec![FeeToken {
                    denom: "uosmo".to_string(),
                    average_gas_price: Some(0.025),
                }],
            }],
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Look up a chain by id or by name.
    pub fn chain(&self, chain_name_or_id: &str) -> Option<&ChainConfig> {
        self.chains
            .iter()
            .find(|chain| chain.chain_id == chain_name_or_id || chain.chain_name == chain_name_or_id)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            simulate_url: self.engine.simulate_url.clone(),
            broadcast_url: self.engine.broadcast_url.clone(),
            connection_timeout: self.engine.connect_timeout_secs,
            request_timeout: self.engine.request_timeout_secs,
        }
    }
}
