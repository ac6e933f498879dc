/// Polymorphic account decoding for the auth module REST response.
///
/// `GET /cosmos/auth/v1beta1/accounts/{address}` returns the account wrapped in a JSON
/// `Any` whose `@type` selects the concrete shape. Vesting and module accounts nest the
/// base account one or two levels deep, Ethermint style chains use `EthAccount`.
use serde::{de, Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct BaseAccount {
    #[serde(default)]
    pub address: String,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub account_number: u64,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub sequence: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BaseVestingAccount {
    pub base_account: Option<BaseAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedVestingAccount {
    pub base_vesting_account: Option<BaseVestingAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrappedBaseAccount {
    pub base_account: Option<BaseAccount>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "@type")]
pub enum Account {
    #[serde(rename = "/cosmos.auth.v1beta1.BaseAccount")]
    Base(BaseAccount),

    #[serde(rename = "/cosmos.auth.v1beta1.ModuleAccount")]
    Module(WrappedBaseAccount),

    #[serde(rename = "/cosmos.vesting.v1beta1.BaseVestingAccount")]
    BaseVesting(WrappedBaseAccount),

    #[serde(rename = "/cosmos.vesting.v1beta1.ContinuousVestingAccount")]
    ContinuousVesting(NestedVestingAccount),

    #[serde(rename = "/cosmos.vesting.v1beta1.DelayedVestingAccount")]
    DelayedVesting(NestedVestingAccount),

    #[serde(rename = "/cosmos.vesting.v1beta1.PeriodicVestingAccount")]
    PeriodicVesting(NestedVestingAccount),

    #[serde(rename = "/cosmos.vesting.v1beta1.PermanentLockedAccount")]
    PermanentLocked(NestedVestingAccount),

    #[serde(
        rename = "/ethermint.types.v1.EthAccount",
        alias = "/injective.types.v1beta1.EthAccount"
    )]
    Eth(WrappedBaseAccount),

    #[serde(other)]
    Unsupported,
}

/// Account number and sequence of a signer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: String,
    pub sequence: u64,
    pub account_number: u64,
}

impl From<&BaseAccount> for AccountInfo {
    fn from(base: &BaseAccount) -> Self {
        AccountInfo {
            address: base.address.clone(),
            sequence: base.sequence,
            account_number: base.account_number,
        }
    }
}

impl Account {
    /// Returns None if the account type doesn't carry a base account.
    pub fn account_info(&self) -> Option<AccountInfo> {
        match self {
            Account::Base(base) => Some(base.into()),
            Account::Module(acc) | Account::BaseVesting(acc) | Account::Eth(acc) => {
                acc.base_account.as_ref().map(Into::into)
            }
            Account::ContinuousVesting(acc)
            | Account::DelayedVesting(acc)
            | Account::PeriodicVesting(acc)
            | Account::PermanentLocked(acc) => acc
                .base_vesting_account
                .as_ref()
                .and_then(|bva| bva.base_account.as_ref())
                .map(Into::into),
            Account::Unsupported => None,
        }
    }

    pub fn account_type(&self) -> &'static str {
        match self {
            Account::Base(_) => "BaseAccount",
            Account::Module(_) => "ModuleAccount",
            Account::BaseVesting(_) => "BaseVestingAccount",
            Account::ContinuousVesting(_) => "ContinuousVestingAccount",
            Account::DelayedVesting(_) => "DelayedVestingAccount",
            Account::PeriodicVesting(_) => "PeriodicVestingAccount",
            Account::PermanentLocked(_) => "PermanentLockedAccount",
            Account::Eth(_) => "EthAccount",
            Account::Unsupported => "UnsupportedAccount",
        }
    }
}

// Gateways print uint64 as strings, some proxies re-encode them as numbers.
fn u64_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(u64),
        Null(Option<()>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::String(s) if s.is_empty() => Ok(0),
        Raw::String(s) => s.parse().map_err(de::Error::custom),
        Raw::Number(n) => Ok(n),
        Raw::Null(_) => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_account_with_string_numbers() {
        let account: Account = serde_json::from_value(json!({
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "cosmos1test",
            "pub_key": null,
            "account_number": "12",
            "sequence": "5",
        }))
        .unwrap();
        let info = account.account_info().unwrap();
        assert_eq!(info.account_number, 12);
        assert_eq!(info.sequence, 5);
        assert_eq!(info.address, "cosmos1test");
    }

    #[test]
    fn test_vesting_account_nested_base() {
        let account: Account = serde_json::from_value(json!({
            "@type": "/cosmos.vesting.v1beta1.ContinuousVestingAccount",
            "base_vesting_account": {
                "base_account": {
                    "address": "cosmos1vest",
                    "account_number": 3,
                    "sequence": "0",
                },
                "original_vesting": [],
            },
            "start_time": "0",
        }))
        .unwrap();
        assert_eq!(account.account_type(), "ContinuousVestingAccount");
        assert_eq!(account.account_info().unwrap().account_number, 3);
    }

    #[test]
    fn test_eth_account() {
        let account: Account = serde_json::from_value(json!({
            "@type": "/injective.types.v1beta1.EthAccount",
            "base_account": { "address": "inj1x", "account_number": "9", "sequence": "2" },
            "code_hash": "xyz",
        }))
        .unwrap();
        assert_eq!(account.account_info().unwrap().sequence, 2);
    }

    #[test]
    fn test_unsupported_account() {
        let account: Account = serde_json::from_value(json!({
            "@type": "/unknown.Account",
            "whatever": 1,
        }))
        .unwrap();
        assert!(account.account_info().is_none());
        assert_eq!(account.account_type(), "UnsupportedAccount");
    }
}
