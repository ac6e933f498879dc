/// Websocket tracing of transaction inclusion over the Tendermint/CometBFT RPC.
///
/// Two requests go out on one connection: a `subscribe` for the transaction's hash and a
/// one-shot `tx` lookup. Whichever yields a result first wins, so a transaction that was
/// already included before the subscription landed still resolves.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::ConfirmationError;

#[async_trait]
pub trait TxTracer: Send {
    /// Resolve with the raw execution result of `tx_hash` once it is included. The result is
    /// either flat (`code`, `log`, ...) or nested under `tx_result`, depending on which
    /// request answered.
    async fn trace_tx(&mut self, tx_hash: &[u8]) -> Result<Value, ConfirmationError>;

    async fn close(&mut self);
}

#[async_trait]
pub trait TracerConnector: Send + Sync {
    async fn connect(&self, rpc_endpoint: &str) -> Result<Box<dyn TxTracer>, ConfirmationError>;
}

/// Connects [`WsTracer`]s to `{rpc}/websocket`.
#[derive(Debug, Clone, Default)]
pub struct WsTracerConnector;

#[async_trait]
impl TracerConnector for WsTracerConnector {
    async fn connect(&self, rpc_endpoint: &str) -> Result<Box<dyn TxTracer>, ConfirmationError> {
        let url = websocket_url(rpc_endpoint)?;
        log::debug!("Connecting tx tracer to {}", url);
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ConfirmationError::Connection(e.to_string()))?;
        Ok(Box::new(WsTracer { ws: Some(ws) }))
    }
}

pub struct WsTracer {
    ws: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[async_trait]
impl TxTracer for WsTracer {
    async fn trace_tx(&mut self, tx_hash: &[u8]) -> Result<Value, ConfirmationError> {
        let ws = self.ws.as_mut().ok_or(ConfirmationError::Closed)?;

        let subscribe_id = uuid::Uuid::new_v4().to_string();
        let query_id = uuid::Uuid::new_v4().to_string();
        let hash_hex = hex::encode_upper(tx_hash);

        let subscribe = json!({
            "jsonrpc": "2.0",
            "method": "subscribe",
            "id": subscribe_id,
            "params": { "query": format!("tm.event='Tx' AND tx.hash='{}'", hash_hex) },
        });
        let query = json!({
            "jsonrpc": "2.0",
            "method": "tx",
            "id": query_id,
            "params": { "hash": BASE64.encode(tx_hash) },
        });

        for request in [subscribe, query] {
            ws.send(Message::Text(request.to_string().into()))
                .await
                .map_err(|e| ConfirmationError::Connection(e.to_string()))?;
        }
        log::debug!("Tracing tx {}", hash_hex);

        while let Some(message) = ws.next().await {
            let message = message.map_err(|e| ConfirmationError::Connection(e.to_string()))?;
            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => return Err(ConfirmationError::Closed),
                _ => continue,
            };
            let frame: Value = match serde_json::from_str(text.as_str()) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Ignoring malformed websocket frame: {}", e);
                    continue;
                }
            };

            match classify_frame(&frame, &subscribe_id, &query_id) {
                Frame::Included(result) => return Ok(result),
                Frame::SubscriptionFailed(reason) => {
                    return Err(ConfirmationError::Subscription(reason))
                }
                Frame::Pending => {}
            }
        }

        Err(ConfirmationError::Closed)
    }

    async fn close(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            if let Err(e) = ws.close(None).await {
                log::debug!("Tx tracer close: {}", e);
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Frame {
    Included(Value),
    SubscriptionFailed(String),
    Pending,
}

fn classify_frame(frame: &Value, subscribe_id: &str, query_id: &str) -> Frame {
    let id = frame.get("id").and_then(Value::as_str).unwrap_or_default();
    let result = frame.get("result");

    // Tendermint 0.34 tags events with "<id>#event", newer versions reuse the id.
    if id == query_id {
        // "tx not found" just means it is not included yet.
        return match result {
            Some(result) if result.get("tx_result").is_some() => Frame::Included(result.clone()),
            _ => Frame::Pending,
        };
    }

    if !id.starts_with(subscribe_id) {
        return Frame::Pending;
    }

    if let Some(error) = frame.get("error") {
        let reason = error
            .get("data")
            .or_else(|| error.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Frame::SubscriptionFailed(reason);
    }

    match result.and_then(|result| result.pointer("/data/value/TxResult")) {
        Some(tx_result) => {
            let mut included = tx_result.get("result").cloned().unwrap_or_else(|| json!({}));
            if let (Some(map), Some(height)) = (included.as_object_mut(), tx_result.get("height")) {
                map.insert("height".to_string(), height.clone());
            }
            Frame::Included(included)
        }
        // Subscription acknowledgement.
        None => Frame::Pending,
    }
}

/// `http(s)://host/path` to `ws(s)://host/path/websocket`.
pub fn websocket_url(rpc_endpoint: &str) -> Result<Url, ConfirmationError> {
    let invalid = |reason: String| ConfirmationError::InvalidEndpoint {
        endpoint: rpc_endpoint.to_string(),
        reason,
    };

    if rpc_endpoint.is_empty() {
        return Err(ConfirmationError::MissingEndpoint);
    }

    let mut url = Url::parse(rpc_endpoint).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme {}", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| invalid(format!("cannot switch to {}", scheme)))?;

    let path = format!("{}/websocket", url.path().trim_end_matches('/'));
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url() {
        assert_eq!(
            websocket_url("https://rpc.osmosis.zone/").unwrap().as_str(),
            "wss://rpc.osmosis.zone/websocket"
        );
        assert_eq!(
            websocket_url("http://localhost:26657").unwrap().as_str(),
            "ws://localhost:26657/websocket"
        );
        assert!(matches!(
            websocket_url("ftp://rpc"),
            Err(ConfirmationError::InvalidEndpoint { .. })
        ));
        assert!(matches!(websocket_url(""), Err(ConfirmationError::MissingEndpoint)));
    }

    #[test]
    fn test_subscription_event_is_flattened() {
        let frame = json!({
            "jsonrpc": "2.0",
            "id": "sub#event",
            "result": {
                "query": "tm.event='Tx'",
                "data": {
                    "type": "tendermint/event/Tx",
                    "value": {
                        "TxResult": {
                            "height": "101",
                            "tx": "...",
                            "result": { "code": 0, "log": "[]", "gas_used": "90000" },
                        }
                    }
                }
            }
        });
        match classify_frame(&frame, "sub", "query") {
            Frame::Included(result) => {
                assert_eq!(result["height"], "101");
                assert_eq!(result["gas_used"], "90000");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_ack_and_missing_tx_are_pending() {
        let ack = json!({ "jsonrpc": "2.0", "id": "sub", "result": {} });
        assert_eq!(classify_frame(&ack, "sub", "query"), Frame::Pending);

        let not_found = json!({
            "jsonrpc": "2.0",
            "id": "query",
            "error": { "code": -32603, "message": "Internal error", "data": "tx (AB) not found" },
        });
        assert_eq!(classify_frame(&not_found, "sub", "query"), Frame::Pending);
    }

    #[test]
    fn test_query_result_kept_nested() {
        let frame = json!({
            "id": "query",
            "result": { "height": "7", "tx_result": { "code": 3, "log": "out of gas" } },
        });
        match classify_frame(&frame, "sub", "query") {
            Frame::Included(result) => assert_eq!(result["tx_result"]["code"], 3),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_subscription_error() {
        let frame = json!({
            "id": "sub",
            "error": { "code": -32603, "message": "Internal error", "data": "max subscriptions" },
        });
        assert_eq!(
            classify_frame(&frame, "sub", "query"),
            Frame::SubscriptionFailed("max subscriptions".to_string())
        );
    }
}
