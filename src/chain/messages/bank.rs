use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_value, to_value, MsgCodec};
use crate::chain::proto;
use crate::chain::Coin;
use crate::error::MsgError;

const TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgSendValue {
    pub from_address: String,
    pub to_address: String,
    #[serde(default)]
    pub amount: Vec<Coin>,
}

pub struct MsgSendCodec;

impl MsgCodec for MsgSendCodec {
    fn type_url(&self) -> &'static str {
        TYPE_URL
    }

    fn amino_type(&self) -> &'static str {
        "cosmos-sdk/MsgSend"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError> {
        let msg: MsgSendValue = parse_value(TYPE_URL, value)?;
        Ok(proto::MsgSend {
            from_address: msg.from_address,
            to_address: msg.to_address,
            amount: msg.amount.iter().map(Into::into).collect(),
        }
        .encode_to_vec())
    }

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError> {
        let msg: MsgSendValue = parse_value(TYPE_URL, value)?;
        to_value(TYPE_URL, &msg)
    }

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError> {
        let msg: MsgSendValue = parse_value(TYPE_URL, amino)?;
        to_value(TYPE_URL, &msg)
    }
}
