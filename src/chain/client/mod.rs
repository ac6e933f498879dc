use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::chain::account_types::{Account, AccountInfo};
use crate::chain::remove_last_slash;
use crate::error::ApiError;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Proxy that simulates on behalf of the caller. Posts `{ restEndpoint, tx_bytes }`.
    /// When unset the node's own `/cosmos/tx/v1beta1/simulate` route is used.
    pub simulate_url: Option<String>,
    /// Proxy that broadcasts on behalf of the caller. Posts `{ restEndpoint, tx_bytes, mode }`.
    pub broadcast_url: Option<String>,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            simulate_url: None,
            broadcast_url: None,
            connection_timeout: 10,
            request_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastMode {
    #[default]
    Sync,
}

impl BroadcastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastMode::Sync => "BROADCAST_MODE_SYNC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GasInfo {
    #[serde(default, deserialize_with = "string_or_number")]
    pub gas_used: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gas_wanted: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateResponse {
    pub gas_info: GasInfo,
}

/// Synchronous broadcast result (check-tx only).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub height: String,
    #[serde(default)]
    pub txhash: String,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gas_wanted: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gas_used: String,
}

/// Node access needed by the transaction pipeline.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// `Ok(None)` when the node has no such account.
    async fn account(&self, rest: &str, address: &str) -> Result<Option<AccountInfo>, ApiError>;

    async fn simulate(&self, rest: &str, tx_bytes: &[u8]) -> Result<SimulateResponse, ApiError>;

    async fn broadcast(
        &self,
        rest: &str,
        tx_bytes: &[u8],
        mode: BroadcastMode,
    ) -> Result<TxResponse, ApiError>;

    /// Raw `latest_block_height` from the RPC status endpoint, if the node reported one.
    async fn latest_block_height(&self, rpc: &str) -> Result<Option<String>, ApiError>;

    /// Current EIP-1559 style base fee from the osmosis txfees module.
    async fn base_fee(&self, rest: &str) -> Result<String, ApiError>;
}

#[derive(Serialize)]
struct SimulateRequest<'a> {
    #[serde(rename = "restEndpoint", skip_serializing_if = "Option::is_none")]
    rest_endpoint: Option<&'a str>,
    tx_bytes: String,
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    #[serde(rename = "restEndpoint", skip_serializing_if = "Option::is_none")]
    rest_endpoint: Option<&'a str>,
    tx_bytes: String,
    mode: &'static str,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[derive(Deserialize)]
struct AccountResponse {
    account: Account,
}

#[derive(Deserialize)]
struct BaseFeeResponse {
    base_fee: String,
}

/// REST/RPC client over reqwest.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: ClientConfig,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        log::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        log::debug!("POST {}", url);
        let response = self.http.post(url).json(body).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl ChainApi for RestClient {
    async fn account(&self, rest: &str, address: &str) -> Result<Option<AccountInfo>, ApiError> {
        let url = format!(
            "{}/cosmos/auth/v1beta1/accounts/{}",
            remove_last_slash(rest),
            address
        );

        let response: AccountResponse = match self.get_json(&url).await {
            Ok(response) => response,
            Err(ApiError::Status { status: 404, .. }) => {
                log::info!("Account {} not found on {}", address, rest);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        log::debug!("Decoded account type: {}", response.account.account_type());
        response.account.account_info().map(Some).ok_or_else(|| {
            ApiError::Decode(format!(
                "account type {} carries no base account",
                response.account.account_type()
            ))
        })
    }

    async fn simulate(&self, rest: &str, tx_bytes: &[u8]) -> Result<SimulateResponse, ApiError> {
        let rest = remove_last_slash(rest);
        let tx_bytes = BASE64.encode(tx_bytes);
        match &self.config.simulate_url {
            Some(proxy) => {
                let body = SimulateRequest {
                    rest_endpoint: Some(rest),
                    tx_bytes,
                };
                self.post_json(proxy, &body).await
            }
            None => {
                let body = SimulateRequest {
                    rest_endpoint: None,
                    tx_bytes,
                };
                self.post_json(&format!("{}/cosmos/tx/v1beta1/simulate", rest), &body)
                    .await
            }
        }
    }

    async fn broadcast(
        &self,
        rest: &str,
        tx_bytes: &[u8],
        mode: BroadcastMode,
    ) -> Result<TxResponse, ApiError> {
        let rest = remove_last_slash(rest);
        log::info!("Broadcasting {} bytes to {}", tx_bytes.len(), rest);
        let tx_bytes = BASE64.encode(tx_bytes);
        let (url, rest_endpoint) = match &self.config.broadcast_url {
            Some(proxy) => (proxy.clone(), Some(rest)),
            None => (format!("{}/cosmos/tx/v1beta1/txs", rest), None),
        };
        let body = BroadcastRequest {
            rest_endpoint,
            tx_bytes,
            mode: mode.as_str(),
        };
        let response: BroadcastResponse = self.post_json(&url, &body).await?;
        Ok(response.tx_response)
    }

    async fn latest_block_height(&self, rpc: &str) -> Result<Option<String>, ApiError> {
        let status: Value = self
            .get_json(&format!("{}/status", remove_last_slash(rpc)))
            .await?;
        Ok(latest_height_from_status(&status))
    }

    async fn base_fee(&self, rest: &str) -> Result<String, ApiError> {
        let url = format!(
            "{}/osmosis/txfees/v1beta1/cur_eip_base_fee",
            remove_last_slash(rest)
        );
        let response: BaseFeeResponse = self.get_json(&url).await?;
        Ok(response.base_fee)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(status_error(status.as_u16(), &text));
    }

    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Cosmos gateways answer errors with `{ "code": n, "message": "..." }`.
pub(crate) fn status_error(status: u16, body: &str) -> ApiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        code: Option<i64>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            code,
            message: Some(message),
        }) => ApiError::Status {
            status,
            code,
            message,
        },
        _ => ApiError::Status {
            status,
            code: None,
            message: body.to_string(),
        },
    }
}

/// Tendermint wraps JSON-RPC results in `result`, some proxies strip it.
fn latest_height_from_status(status: &Value) -> Option<String> {
    let sync_info = status
        .pointer("/result/sync_info")
        .or_else(|| status.get("sync_info"))?;
    match sync_info.get("latest_block_height")? {
        Value::String(height) => Some(height.clone()),
        Value::Number(height) => Some(height.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
