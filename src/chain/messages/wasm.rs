use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_value, to_value, MsgCodec};
use crate::chain::proto;
use crate::chain::Coin;
use crate::error::MsgError;

const TYPE_URL: &str = "/cosmwasm.wasm.v1.MsgExecuteContract";

/// The contract `msg` stays structured JSON until protobuf encoding, where it becomes the
/// raw JSON bytes the contract parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MsgExecuteContractValue {
    pub sender: String,
    pub contract: String,
    pub msg: Value,
    #[serde(default)]
    pub funds: Vec<Coin>,
}

pub struct MsgExecuteContractCodec;

impl MsgCodec for MsgExecuteContractCodec {
    fn type_url(&self) -> &'static str {
        TYPE_URL
    }

    fn amino_type(&self) -> &'static str {
        "wasm/MsgExecuteContract"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError> {
        let msg: MsgExecuteContractValue = parse_value(TYPE_URL, value)?;
        let contract_msg = serde_json::to_vec(&msg.msg).map_err(|e| MsgError::invalid(TYPE_URL, e))?;
        Ok(proto::MsgExecuteContract {
            sender: msg.sender,
            contract: msg.contract,
            msg: contract_msg,
            funds: msg.funds.iter().map(Into::into).collect(),
        }
        .encode_to_vec())
    }

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError> {
        let msg: MsgExecuteContractValue = parse_value(TYPE_URL, value)?;
        to_value(TYPE_URL, &msg)
    }

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError> {
        let msg: MsgExecuteContractValue = parse_value(TYPE_URL, amino)?;
        to_value(TYPE_URL, &msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_msg_encoded_as_json_bytes() {
        let value = json!({
            "sender": "osmo1sender",
            "contract": "osmo1contract",
            "msg": { "swap": { "min_output": "10" } },
        });
        let bytes = MsgExecuteContractCodec.encode(&value).unwrap();
        let decoded = proto::MsgExecuteContract::decode(&bytes[..]).unwrap();
        let inner: Value = serde_json::from_slice(&decoded.msg).unwrap();
        assert_eq!(inner, json!({ "swap": { "min_output": "10" } }));
        assert!(decoded.funds.is_empty());
    }
}
