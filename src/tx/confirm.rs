use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::chain::TracerConnector;
use crate::error::ConfirmationError;

/// Outcome of an included transaction. A non-zero `code` means it failed during execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliverTxResponse {
    /// Lower-case hex
    pub transaction_hash: String,
    pub code: u32,
    pub height: u64,
    pub raw_log: String,
    #[serde(default)]
    pub events: Vec<Value>,
    pub gas_used: u64,
    pub gas_wanted: u64,
}

impl DeliverTxResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Flattens a traced result. Fields are read from the top level first and from the nested
/// `tx_result` second; numbers may arrive as JSON numbers or strings.
pub fn normalize_tx_result(tx_hash: &[u8], result: &Value) -> DeliverTxResponse {
    let nested = result.get("tx_result");
    let field = |name: &str| -> Option<&Value> {
        result
            .get(name)
            .filter(|value| !value.is_null())
            .or_else(|| nested.and_then(|nested| nested.get(name)))
            .filter(|value| !value.is_null())
    };

    DeliverTxResponse {
        transaction_hash: hex::encode(tx_hash),
        // A code that does not fit is still a failure
        code: field("code")
            .and_then(as_u64)
            .map(|code| u32::try_from(code).unwrap_or(u32::MAX))
            .unwrap_or(0),
        height: field("height").and_then(as_u64).unwrap_or(0),
        raw_log: field("log")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        events: field("events")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        gas_used: field("gas_used").and_then(as_u64).unwrap_or(0),
        gas_wanted: field("gas_wanted").and_then(as_u64).unwrap_or(0),
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Waits for inclusion over a fresh tracer connection per transaction.
#[derive(Clone)]
pub struct ConfirmationTracer {
    connector: Arc<dyn TracerConnector>,
}

impl ConfirmationTracer {
    pub fn new(connector: Arc<dyn TracerConnector>) -> Self {
        Self { connector }
    }

    pub async fn confirm(
        &self,
        rpc_endpoint: Option<&str>,
        tx_hash: &[u8],
    ) -> Result<DeliverTxResponse, ConfirmationError> {
        let rpc = rpc_endpoint
            .filter(|rpc| !rpc.is_empty())
            .ok_or(ConfirmationError::MissingEndpoint)?;

        let mut tracer = self.connector.connect(rpc).await?;
        let traced = tracer.trace_tx(tx_hash).await;
        tracer.close().await;

        let response = normalize_tx_result(tx_hash, &traced?);
        if response.is_success() {
            log::info!(
                "Transaction {} included at height {}",
                response.transaction_hash,
                response.height
            );
        } else {
            log::warn!(
                "Transaction {} failed with code {}: {}",
                response.transaction_hash,
                response.code,
                response.raw_log
            );
        }
        Ok(response)
    }
}
