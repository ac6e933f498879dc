//! Message registry: turns the JSON payload of an [`EncodeObject`] into protobuf `Any`
//! bytes and converts it to and from its legacy amino JSON form.

mod bank;
mod ibc;
mod staking;
mod wasm;

pub use bank::MsgSendCodec;
pub use ibc::MsgTransferCodec;
pub use staking::{MsgDelegateCodec, MsgUndelegateCodec, MsgWithdrawDelegatorRewardCodec};
pub use wasm::MsgExecuteContractCodec;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::amino::AminoMsg;
use crate::chain::proto::Any;
use crate::error::MsgError;

/// One action to put in a transaction body: a protobuf type url and its JSON payload
/// (snake_case field names, the same shape the REST gateway prints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeObject {
    pub type_url: String,
    pub value: Value,
}

impl EncodeObject {
    pub fn new(type_url: impl Into<String>, value: Value) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// The message level `memo` field some messages carry (ibc transfers).
    pub fn memo(&self) -> Option<&str> {
        self.value
            .get("memo")
            .and_then(Value::as_str)
            .filter(|memo| !memo.is_empty())
    }
}

/// Encoding and amino conversion for a single message type.
pub trait MsgCodec: Send + Sync {
    fn type_url(&self) -> &'static str;

    fn amino_type(&self) -> &'static str;

    /// Protobuf encoding of the payload.
    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError>;

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError>;

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError>;
}

#[derive(Clone)]
pub struct MsgRegistry {
    codecs: HashMap<&'static str, Arc<dyn MsgCodec>>,
    amino_types: HashMap<&'static str, &'static str>,
}

impl MsgRegistry {
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
            amino_types: HashMap::new(),
        }
    }

    pub fn register(&mut self, codec: Arc<dyn MsgCodec>) {
        self.amino_types.insert(codec.amino_type(), codec.type_url());
        self.codecs.insert(codec.type_url(), codec);
    }

    pub fn is_registered(&self, type_url: &str) -> bool {
        self.codecs.contains_key(type_url)
    }

    fn codec(&self, type_url: &str) -> Result<&Arc<dyn MsgCodec>, MsgError> {
        self.codecs
            .get(type_url)
            .ok_or_else(|| MsgError::UnknownTypeUrl(type_url.to_string()))
    }

    pub fn encode_as_any(&self, msg: &EncodeObject) -> Result<Any, MsgError> {
        let codec = self.codec(&msg.type_url)?;
        Ok(Any {
            type_url: msg.type_url.clone(),
            value: codec.encode(&msg.value)?,
        })
    }

    pub fn encode_all(&self, msgs: &[EncodeObject]) -> Result<Vec<Any>, MsgError> {
        msgs.iter().map(|msg| self.encode_as_any(msg)).collect()
    }

    pub fn to_amino(&self, msg: &EncodeObject) -> Result<AminoMsg, MsgError> {
        let codec = self.codec(&msg.type_url)?;
        Ok(AminoMsg {
            msg_type: codec.amino_type().to_string(),
            value: codec.to_amino(&msg.value)?,
        })
    }

    pub fn from_amino(&self, msg: &AminoMsg) -> Result<EncodeObject, MsgError> {
        let type_url = self
            .amino_types
            .get(msg.msg_type.as_str())
            .ok_or_else(|| MsgError::UnknownAminoType(msg.msg_type.clone()))?;
        let codec = self.codec(type_url)?;
        Ok(EncodeObject {
            type_url: type_url.to_string(),
            value: codec.from_amino(&msg.value)?,
        })
    }
}

impl Default for MsgRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(MsgSendCodec));
        registry.register(Arc::new(MsgDelegateCodec));
        registry.register(Arc::new(MsgUndelegateCodec));
        registry.register(Arc::new(MsgWithdrawDelegatorRewardCodec));
        registry.register(Arc::new(MsgExecuteContractCodec));
        registry.register(Arc::new(MsgTransferCodec));
        registry
    }
}

impl std::fmt::Debug for MsgRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut type_urls: Vec<_> = self.codecs.keys().collect();
        type_urls.sort();
        f.debug_struct("MsgRegistry").field("type_urls", &type_urls).finish()
    }
}

pub(crate) fn parse_value<T: DeserializeOwned>(type_url: &str, value: &Value) -> Result<T, MsgError> {
    serde_json::from_value(value.clone()).map_err(|e| MsgError::invalid(type_url, e))
}

pub(crate) fn to_value<T: Serialize>(type_url: &str, value: &T) -> Result<Value, MsgError> {
    serde_json::to_value(value).map_err(|e| MsgError::invalid(type_url, e))
}

/// u64 fields travel as decimal strings in JSON, but hand written payloads use numbers.
pub(crate) mod u64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNumber {
            String(String),
            Number(u64),
        }

        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) if s.is_empty() => Ok(0),
            StringOrNumber::String(s) => s.parse().map_err(de::Error::custom),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn send(to: &str) -> EncodeObject {
        EncodeObject::new(
            "/cosmos.bank.v1beta1.MsgSend",
            json!({
                "from_address": "cosmos1sender",
                "to_address": to,
                "amount": [{ "denom": "uosmo", "amount": "10" }],
            }),
        )
    }

    #[test]
    fn test_unknown_type_url() {
        let registry = MsgRegistry::default();
        let msg = EncodeObject::new("/unknown.Msg", json!({}));
        assert!(matches!(
            registry.encode_as_any(&msg),
            Err(MsgError::UnknownTypeUrl(url)) if url == "/unknown.Msg"
        ));
    }

    #[test]
    fn test_amino_lookup_by_amino_type() {
        let registry = MsgRegistry::default();
        let amino = registry.to_amino(&send("cosmos1receiver")).unwrap();
        assert_eq!(amino.msg_type, "cosmos-sdk/MsgSend");

        let back = registry.from_amino(&amino).unwrap();
        assert_eq!(back.type_url, "/cosmos.bank.v1beta1.MsgSend");
        assert_eq!(back.value["to_address"], "cosmos1receiver");

        let unknown = AminoMsg {
            msg_type: "cosmos-sdk/Nope".to_string(),
            value: json!({}),
        };
        assert!(matches!(
            registry.from_amino(&unknown),
            Err(MsgError::UnknownAminoType(_))
        ));
    }

    #[test]
    fn test_encode_all_keeps_order() {
        let registry = MsgRegistry::default();
        let msgs = vec![send("cosmos1a"), send("cosmos1b"), send("cosmos1c")];
        let encoded = registry.encode_all(&msgs).unwrap();
        assert_eq!(encoded.len(), 3);
        for (any, msg) in encoded.iter().zip(&msgs) {
            assert_eq!(any.value, registry.encode_as_any(msg).unwrap().value);
        }
    }

    #[test]
    fn test_memo_accessor_ignores_empty() {
        let mut msg = send("cosmos1a");
        assert_eq!(msg.memo(), None);
        msg.value["memo"] = json!("");
        assert_eq!(msg.memo(), None);
        msg.value["memo"] = json!("hello");
        assert_eq!(msg.memo(), Some("hello"));
    }
}
