//! Legacy amino JSON signing documents.
//!
//! Amino signers hash the canonical JSON of a [`StdSignDoc`]: keys sorted at every level,
//! no whitespace, and `<`, `>`, `&` escaped the way Go's `encoding/json` does.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::Coin;

pub const SECP256K1_AMINO_PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AminoMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdSignDoc {
    pub chain_id: String,
    pub account_number: String,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_height: Option<String>,
    pub fee: StdFee,
    pub msgs: Vec<AminoMsg>,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AminoPubKey {
    #[serde(rename = "type")]
    pub key_type: String,
    /// Base64 of the compressed key.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: AminoPubKey,
    /// Base64 of the 64 byte compact signature.
    pub signature: String,
}

/// What a wallet hands back from `sign_amino`. The wallet may have changed the document
/// (fee or memo edited by the user), so callers must build the transaction from `signed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AminoSignResponse {
    pub signed: StdSignDoc,
    pub signature: StdSignature,
}

pub fn make_sign_doc_amino(
    msgs: Vec<AminoMsg>,
    fee: StdFee,
    chain_id: &str,
    memo: &str,
    account_number: u64,
    sequence: u64,
    timeout_height: u64,
) -> StdSignDoc {
    StdSignDoc {
        chain_id: chain_id.to_string(),
        account_number: account_number.to_string(),
        sequence: sequence.to_string(),
        timeout_height: (timeout_height != 0).then(|| timeout_height.to_string()),
        fee,
        msgs,
        memo: memo.to_string(),
    }
}

/// Canonical bytes to sign.
pub fn serialize_sign_doc(doc: &StdSignDoc) -> Result<Vec<u8>, serde_json::Error> {
    let value = serde_json::to_value(doc)?;
    let json = serde_json::to_string(&sort_value(value))?;
    Ok(escape_html(&json).into_bytes())
}

fn sort_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, sort_value(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}

// These characters never occur in JSON syntax, only inside strings.
fn escape_html(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            c => out.push(c),
        }
    }
    out
}
