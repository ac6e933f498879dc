/// Protobuf transaction assembly: bodies, auth info, sign docs and TxRaw envelopes.
///
/// Everything here is pure. Wallet interaction and network calls live in `crate::tx`.
use prost::Message;

use crate::chain::amino::StdFee;
use crate::chain::proto::{
    mode_info, Any, AuthInfo, Fee, ModeInfo, Secp256k1PubKey, SignDoc, SignMode, SignerInfo,
    TxBody, TxRaw, SECP256K1_PUBKEY_TYPE_URL,
};
use crate::chain::Coin;
use crate::error::FeeError;

/// Length of the placeholder signature attached to simulation transactions.
pub const SIMULATION_SIGNATURE_LEN: usize = 64;

/// Wrap a compressed secp256k1 key the way the auth module expects it.
pub fn encode_pubkey(compressed: &[u8]) -> Any {
    Any {
        type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
        value: Secp256k1PubKey {
            key: compressed.to_vec(),
        }
        .encode_to_vec(),
    }
}

pub fn parse_gas_limit(gas: &str) -> Result<u64, FeeError> {
    gas.trim()
        .parse::<u64>()
        .map_err(|_| FeeError::InvalidGasLimit(gas.to_string()))
}

pub fn proto_fee(fee: &StdFee) -> Result<Fee, FeeError> {
    Ok(Fee {
        amount: fee.amount.iter().map(Into::into).collect(),
        gas_limit: parse_gas_limit(&fee.gas)?,
        payer: fee.payer.clone().unwrap_or_default(),
        granter: fee.granter.clone().unwrap_or_default(),
    })
}

/// Auth info for a single signer.
pub fn make_auth_info_bytes(
    pubkey: Option<Any>,
    mode: SignMode,
    sequence: u64,
    fee: Fee,
) -> Vec<u8> {
    AuthInfo {
        signer_infos: vec![SignerInfo {
            public_key: pubkey,
            mode_info: Some(ModeInfo {
                sum: Some(mode_info::Sum::Single(mode_info::Single { mode: mode as i32 })),
            }),
            sequence,
        }],
        fee: Some(fee),
        tip: None,
    }
    .encode_to_vec()
}

pub fn encode_tx_body(messages: Vec<Any>, memo: &str, timeout_height: u64) -> Vec<u8> {
    TxBody {
        messages,
        memo: memo.to_string(),
        timeout_height,
        extension_options: vec![],
        non_critical_extension_options: vec![],
    }
    .encode_to_vec()
}

pub fn make_sign_doc(
    body_bytes: Vec<u8>,
    auth_info_bytes: Vec<u8>,
    chain_id: &str,
    account_number: u64,
) -> SignDoc {
    SignDoc {
        body_bytes,
        auth_info_bytes,
        chain_id: chain_id.to_string(),
        account_number,
    }
}

/// Unsigned transaction for gas simulation.
///
/// Nodes skip signature verification in simulate mode but still need one signer info per
/// signature, so the signer carries the current sequence, no public key and a zeroed
/// signature. The fee carries the candidate amount and no gas limit.
pub fn build_simulation_tx(
    messages: Vec<Any>,
    memo: &str,
    sequence: u64,
    fee_amount: &[Coin],
) -> Vec<u8> {
    let fee = Fee {
        amount: fee_amount.iter().map(Into::into).collect(),
        gas_limit: 0,
        payer: String::new(),
        granter: String::new(),
    };

    encode_tx_raw(&TxRaw {
        body_bytes: encode_tx_body(messages, memo, 0),
        auth_info_bytes: make_auth_info_bytes(None, SignMode::LegacyAminoJson, sequence, fee),
        signatures: vec![vec![0u8; SIMULATION_SIGNATURE_LEN]],
    })
}

pub fn encode_tx_raw(tx: &TxRaw) -> Vec<u8> {
    tx.encode_to_vec()
}

pub fn decode_tx_raw(bytes: &[u8]) -> Result<TxRaw, prost::DecodeError> {
    TxRaw::decode(bytes)
}
