pub mod account_types;
pub mod amino;
pub mod client;
pub mod messages;
pub mod proto;
pub mod tracer;
pub mod tx_builder;
pub mod wallet;

use serde::{Deserialize, Serialize};

pub use account_types::{Account, AccountInfo};
pub use amino::{AminoMsg, AminoSignResponse, StdFee, StdSignDoc, StdSignature};
pub use client::{BroadcastMode, ChainApi, ClientConfig, RestClient, SimulateResponse, TxResponse};
pub use messages::{EncodeObject, MsgRegistry};
pub use tracer::{TracerConnector, TxTracer, WsTracerConnector};
pub use wallet::{
    AccountData, DirectSignResponse, LocalKey, LocalWallet, OfflineSigner, SignCapabilities,
    SignOptions, Wallet, WalletClient, WalletProvider, WalletStatus,
};

/// A token amount as it appears in fees, messages and REST payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

impl From<&Coin> for proto::Coin {
    fn from(coin: &Coin) -> Self {
        proto::Coin {
            denom: coin.denom.clone(),
            amount: coin.amount.clone(),
        }
    }
}

impl From<proto::Coin> for Coin {
    fn from(coin: proto::Coin) -> Self {
        Coin {
            denom: coin.denom,
            amount: coin.amount,
        }
    }
}

/// Endpoints in chain registries often come with a trailing slash.
pub fn remove_last_slash(endpoint: &str) -> &str {
    endpoint.strip_suffix('/').unwrap_or(endpoint)
}
