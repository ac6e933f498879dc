use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{parse_value, u64_string, MsgCodec};
use crate::chain::proto;
use crate::chain::Coin;
use crate::error::MsgError;

const TYPE_URL: &str = "/ibc.applications.transfer.v1.MsgTransfer";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Height {
    #[serde(default, with = "u64_string")]
    pub revision_number: u64,
    #[serde(default, with = "u64_string")]
    pub revision_height: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgTransferValue {
    pub source_port: String,
    pub source_channel: String,
    pub token: Coin,
    pub sender: String,
    pub receiver: String,
    #[serde(default)]
    pub timeout_height: Height,
    #[serde(default, with = "u64_string")]
    pub timeout_timestamp: u64,
    #[serde(default)]
    pub memo: String,
}

/// ICS-20 transfer.
///
/// The amino conversion drops `memo` in both directions. The amino signing path
/// re-injects it on the way in and again on the way out.
pub struct MsgTransferCodec;

impl MsgCodec for MsgTransferCodec {
    fn type_url(&self) -> &'static str {
        TYPE_URL
    }

    fn amino_type(&self) -> &'static str {
        "cosmos-sdk/MsgTransfer"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError> {
        let msg: MsgTransferValue = parse_value(TYPE_URL, value)?;
        Ok(proto::MsgTransfer {
            source_port: msg.source_port,
            source_channel: msg.source_channel,
            token: Some((&msg.token).into()),
            sender: msg.sender,
            receiver: msg.receiver,
            timeout_height: Some(proto::IbcHeight {
                revision_number: msg.timeout_height.revision_number,
                revision_height: msg.timeout_height.revision_height,
            }),
            timeout_timestamp: msg.timeout_timestamp,
            memo: msg.memo,
        }
        .encode_to_vec())
    }

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError> {
        let msg: MsgTransferValue = parse_value(TYPE_URL, value)?;

        // Amino JSON omits zero values.
        let mut height = Map::new();
        if msg.timeout_height.revision_number != 0 {
            height.insert(
                "revision_number".into(),
                msg.timeout_height.revision_number.to_string().into(),
            );
        }
        if msg.timeout_height.revision_height != 0 {
            height.insert(
                "revision_height".into(),
                msg.timeout_height.revision_height.to_string().into(),
            );
        }

        let mut amino = Map::new();
        amino.insert("source_port".into(), msg.source_port.into());
        amino.insert("source_channel".into(), msg.source_channel.into());
        amino.insert(
            "token".into(),
            serde_json::to_value(&msg.token).map_err(|e| MsgError::invalid(TYPE_URL, e))?,
        );
        amino.insert("sender".into(), msg.sender.into());
        amino.insert("receiver".into(), msg.receiver.into());
        amino.insert("timeout_height".into(), Value::Object(height));
        if msg.timeout_timestamp != 0 {
            amino.insert(
                "timeout_timestamp".into(),
                msg.timeout_timestamp.to_string().into(),
            );
        }
        Ok(Value::Object(amino))
    }

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError> {
        let msg: MsgTransferValue = parse_value(TYPE_URL, amino)?;
        let mut value = serde_json::to_value(&msg).map_err(|e| MsgError::invalid(TYPE_URL, e))?;
        if let Some(map) = value.as_object_mut() {
            map.remove("memo");
        }
        Ok(value)
    }
}
