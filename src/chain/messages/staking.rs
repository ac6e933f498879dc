use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_value, to_value, MsgCodec};
use crate::chain::proto;
use crate::chain::Coin;
use crate::error::MsgError;

const DELEGATE_TYPE_URL: &str = "/cosmos.staking.v1beta1.MsgDelegate";
const UNDELEGATE_TYPE_URL: &str = "/cosmos.staking.v1beta1.MsgUndelegate";
const WITHDRAW_REWARD_TYPE_URL: &str = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward";

/// Shared payload of MsgDelegate and MsgUndelegate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationValue {
    pub delegator_address: String,
    pub validator_address: String,
    pub amount: Coin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRewardValue {
    pub delegator_address: String,
    pub validator_address: String,
}

pub struct MsgDelegateCodec;

impl MsgCodec for MsgDelegateCodec {
    fn type_url(&self) -> &'static str {
        DELEGATE_TYPE_URL
    }

    fn amino_type(&self) -> &'static str {
        "cosmos-sdk/MsgDelegate"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError> {
        let msg: DelegationValue = parse_value(DELEGATE_TYPE_URL, value)?;
        Ok(proto::MsgDelegate {
            delegator_address: msg.delegator_address,
            validator_address: msg.validator_address,
            amount: Some((&msg.amount).into()),
        }
        .encode_to_vec())
    }

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError> {
        let msg: DelegationValue = parse_value(DELEGATE_TYPE_URL, value)?;
        to_value(DELEGATE_TYPE_URL, &msg)
    }

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError> {
        let msg: DelegationValue = parse_value(DELEGATE_TYPE_URL, amino)?;
        to_value(DELEGATE_TYPE_URL, &msg)
    }
}

pub struct MsgUndelegateCodec;

impl MsgCodec for MsgUndelegateCodec {
    fn type_url(&self) -> &'static str {
        UNDELEGATE_TYPE_URL
    }

    fn amino_type(&self) -> &'static str {
        "cosmos-sdk/MsgUndelegate"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError> {
        let msg: DelegationValue = parse_value(UNDELEGATE_TYPE_URL, value)?;
        Ok(proto::MsgUndelegate {
            delegator_address: msg.delegator_address,
            validator_address: msg.validator_address,
            amount: Some((&msg.amount).into()),
        }
        .encode_to_vec())
    }

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError> {
        let msg: DelegationValue = parse_value(UNDELEGATE_TYPE_URL, value)?;
        to_value(UNDELEGATE_TYPE_URL, &msg)
    }

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError> {
        let msg: DelegationValue = parse_value(UNDELEGATE_TYPE_URL, amino)?;
        to_value(UNDELEGATE_TYPE_URL, &msg)
    }
}

pub struct MsgWithdrawDelegatorRewardCodec;

impl MsgCodec for MsgWithdrawDelegatorRewardCodec {
    fn type_url(&self) -> &'static str {
        WITHDRAW_REWARD_TYPE_URL
    }

    // The amino name predates the protobuf rename and never changed.
    fn amino_type(&self) -> &'static str {
        "cosmos-sdk/MsgWithdrawDelegationReward"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, MsgError> {
        let msg: WithdrawRewardValue = parse_value(WITHDRAW_REWARD_TYPE_URL, value)?;
        Ok(proto::MsgWithdrawDelegatorReward {
            delegator_address: msg.delegator_address,
            validator_address: msg.validator_address,
        }
        .encode_to_vec())
    }

    fn to_amino(&self, value: &Value) -> Result<Value, MsgError> {
        let msg: WithdrawRewardValue = parse_value(WITHDRAW_REWARD_TYPE_URL, value)?;
        to_value(WITHDRAW_REWARD_TYPE_URL, &msg)
    }

    fn from_amino(&self, amino: &Value) -> Result<Value, MsgError> {
        let msg: WithdrawRewardValue = parse_value(WITHDRAW_REWARD_TYPE_URL, amino)?;
        to_value(WITHDRAW_REWARD_TYPE_URL, &msg)
    }
}
