use cosmwasm_std::Decimal;
use moka::future::Cache;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::GAS_MULTIPLIER;
use crate::chain::tx_builder::parse_gas_limit;
use crate::chain::{ChainApi, Coin};
use crate::config::ChainConfig;
use crate::error::{ApiError, FeeError};

/// Gas price used when neither the fee market nor the chain registry has one.
pub const DEFAULT_GAS_PRICE: &str = "0.025";

const PRIMARY_GAS_PRICE_KEY: &str = "primary-gas-price";
const GAS_PRICE_TTL: Duration = Duration::from_secs(15 * 60);
const GAS_PRICE_CACHE_CAPACITY: u64 = 30;

const DECIMAL_FRACTIONAL: u128 = 1_000_000_000_000_000_000;

/// Turns a gas limit into a fee amount for chains whose wallets don't pick one.
#[derive(Clone)]
pub struct GasPriceResolver {
    api: Arc<dyn ChainApi>,
    chains: Arc<Vec<ChainConfig>>,
    primary_chain_id: String,
    cache: Cache<String, Decimal>,
}

impl GasPriceResolver {
    pub fn new(
        api: Arc<dyn ChainApi>,
        chains: Arc<Vec<ChainConfig>>,
        primary_chain_id: impl Into<String>,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(GAS_PRICE_CACHE_CAPACITY)
            .time_to_live(GAS_PRICE_TTL)
            .build();

        Self {
            api,
            chains,
            primary_chain_id: primary_chain_id.into(),
            cache,
        }
    }

    /// `ceil(gas price * gas limit)` in the chain's first fee denom.
    pub async fn fee_amount(&self, gas_limit: &str, chain_id: &str) -> Result<Coin, FeeError> {
        let chain = self
            .chains
            .iter()
            .find(|chain| chain.chain_id == chain_id)
            .ok_or_else(|| FeeError::ChainNotFound(chain_id.to_string()))?;
        let fee_token = chain
            .fee_tokens
            .first()
            .ok_or_else(|| FeeError::NoFeeCurrency(chain_id.to_string()))?;

        let mut gas_price = None;
        if chain_id == self.primary_chain_id {
            match self.primary_gas_price(&chain.rest).await {
                Ok(price) => gas_price = Some(price),
                Err(e) => log::warn!(
                    "Failed to fetch {} gas price, using default gas price: {}",
                    chain_id,
                    e
                ),
            }
        }

        let gas_price = gas_price
            .or_else(|| fee_token.average_gas_price.and_then(decimal_from_f64))
            .unwrap_or_else(default_gas_price);

        let gas = parse_gas_limit(gas_limit)?;
        let amount = mul_ceil(gas_price, gas)
            .ok_or_else(|| FeeError::InvalidGasLimit(gas_limit.to_string()))?;

        Ok(Coin::new(amount.to_string(), &fee_token.denom))
    }

    /// Fee market base fee times the gas multiplier. The base fee is cached.
    async fn primary_gas_price(&self, rest: &str) -> Result<Decimal, Arc<ApiError>> {
        let base_fee = self
            .cache
            .try_get_with(PRIMARY_GAS_PRICE_KEY.to_string(), async {
                let base_fee = self.api.base_fee(rest).await?;
                Decimal::from_str(base_fee.trim())
                    .map_err(|e| ApiError::Decode(format!("base fee {:?}: {}", base_fee, e)))
            })
            .await?;

        base_fee
            .checked_mul(gas_multiplier())
            .map_err(|e| Arc::new(ApiError::Decode(e.to_string())))
    }
}

fn gas_multiplier() -> Decimal {
    Decimal::percent((GAS_MULTIPLIER * 100.0).round() as u64)
}

fn default_gas_price() -> Decimal {
    // A literal, always parses
    Decimal::from_str(DEFAULT_GAS_PRICE).unwrap_or_else(|_| Decimal::permille(25))
}

fn decimal_from_f64(price: f64) -> Option<Decimal> {
    if !price.is_finite() || price < 0.0 {
        return None;
    }
    Decimal::from_str(&price.to_string()).ok()
}

fn mul_ceil(price: Decimal, gas: u64) -> Option<u128> {
    let scaled = price.atomics().u128().checked_mul(gas as u128)?;
    Some(scaled.div_ceil(DECIMAL_FRACTIONAL))
}
