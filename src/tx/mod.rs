//! Transaction pipeline stages.
//!
//! Each stage is a small struct over the [`ChainApi`](crate::chain::ChainApi) seam so the
//! orchestrator can run them in order and tests can run them alone.

pub mod broadcast;
pub mod confirm;
pub mod estimate;
pub mod gas_price;
pub mod sequence;
pub mod sign;
pub mod timeout;

pub use broadcast::Broadcaster;
pub use confirm::{normalize_tx_result, ConfirmationTracer, DeliverTxResponse};
pub use estimate::FeeEstimator;
pub use gas_price::GasPriceResolver;
pub use sequence::SequenceResolver;
pub use sign::{select_sign_mode, SignMode, TxSigner};
pub use timeout::TimeoutHeightResolver;

use serde::{Deserialize, Serialize};

use crate::chain::amino::StdFee;
use crate::chain::Coin;

/// Buffer applied to simulated gas, and to the primary chain's base fee.
pub const GAS_MULTIPLIER: f64 = 1.5;

/// Fee for a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxFee {
    /// Gas limit as a decimal string. Empty when unknown.
    #[serde(default)]
    pub gas: String,
    #[serde(default)]
    pub amount: Vec<Coin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Use the fee as given and skip simulation.
    #[serde(default)]
    pub force: bool,
}

impl TxFee {
    pub fn new(gas: impl Into<String>, amount: Vec<Coin>) -> Self {
        Self {
            gas: gas.into(),
            amount,
            ..Self::default()
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

impl From<&TxFee> for StdFee {
    fn from(fee: &TxFee) -> Self {
        StdFee {
            amount: fee.amount.clone(),
            gas: fee.gas.clone(),
            granter: fee.granter.clone(),
            payer: fee.payer.clone(),
        }
    }
}
