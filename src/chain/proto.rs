/// Protobuf types for cosmos transactions.
/// Cosmos SDK types come from `cosmos-sdk-proto`; ibc-go's MsgTransfer is declared here
/// because that crate no longer ships the ibc modules.

pub use cosmos_sdk_proto::cosmos::bank::v1beta1::MsgSend;
pub use cosmos_sdk_proto::cosmos::base::v1beta1::Coin;
pub use cosmos_sdk_proto::cosmos::crypto::secp256k1::PubKey as Secp256k1PubKey;
pub use cosmos_sdk_proto::cosmos::distribution::v1beta1::MsgWithdrawDelegatorReward;
pub use cosmos_sdk_proto::cosmos::staking::v1beta1::{MsgDelegate, MsgUndelegate};
pub use cosmos_sdk_proto::cosmos::tx::signing::v1beta1::SignMode;
pub use cosmos_sdk_proto::cosmos::tx::v1beta1::{
    mode_info, AuthInfo, Fee, ModeInfo, SignDoc, SignerInfo, TxBody, TxRaw,
};
pub use cosmos_sdk_proto::cosmwasm::wasm::v1::MsgExecuteContract;
pub use prost_types::Any;

pub const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// ibc.core.client.v1.Height
#[derive(Clone, PartialEq, prost::Message)]
pub struct IbcHeight {
    #[prost(uint64, tag = "1")]
    pub revision_number: u64,

    #[prost(uint64, tag = "2")]
    pub revision_height: u64,
}

/// ibc.applications.transfer.v1.MsgTransfer
#[derive(Clone, PartialEq, prost::Message)]
pub struct MsgTransfer {
    #[prost(string, tag = "1")]
    pub source_port: String,

    #[prost(string, tag = "2")]
    pub source_channel: String,

    #[prost(message, optional, tag = "3")]
    pub token: Option<Coin>,

    #[prost(string, tag = "4")]
    pub sender: String,

    #[prost(string, tag = "5")]
    pub receiver: String,

    #[prost(message, optional, tag = "6")]
    pub timeout_height: Option<IbcHeight>,

    #[prost(uint64, tag = "7")]
    pub timeout_timestamp: u64,

    /// Optional memo, added in ibc-go v5.
    #[prost(string, tag = "8")]
    pub memo: String,
}
