use std::sync::Arc;

use super::{GasPriceResolver, SequenceResolver, TxFee, GAS_MULTIPLIER};
use crate::chain::tx_builder::build_simulation_tx;
use crate::chain::{ChainApi, EncodeObject, MsgRegistry, SignOptions, Wallet};
use crate::error::{ApiError, SequenceError, SimulationError};

/// Message of nodes (and proxies in front of them) that cannot simulate.
const SIMULATION_UNSUPPORTED: &str = "invalid empty tx";

/// Simulates a candidate transaction and returns a buffered fee.
#[derive(Clone)]
pub struct FeeEstimator {
    api: Arc<dyn ChainApi>,
    registry: Arc<MsgRegistry>,
    sequence: SequenceResolver,
    gas_price: GasPriceResolver,
}

impl FeeEstimator {
    pub fn new(
        api: Arc<dyn ChainApi>,
        registry: Arc<MsgRegistry>,
        gas_price: GasPriceResolver,
    ) -> Self {
        Self {
            sequence: SequenceResolver::new(api.clone()),
            api,
            registry,
            gas_price,
        }
    }

    /// `fallback` doubles as the candidate fee amount for the simulation, and is returned
    /// unchanged when the node cannot simulate and it carries a gas limit.
    pub async fn estimate(
        &self,
        wallet: &dyn Wallet,
        messages: &[EncodeObject],
        fallback: Option<&TxFee>,
        memo: &str,
        sign_options: &SignOptions,
    ) -> Result<TxFee, SimulationError> {
        let encoded = self.registry.encode_all(messages)?;
        let account = self.sequence.resolve(wallet).await?;
        let rest = wallet
            .rest_endpoint()
            .ok_or(SequenceError::MissingEndpoint)?;

        let candidate_amount = fallback.map(|fee| fee.amount.as_slice()).unwrap_or_default();
        let tx_bytes = build_simulation_tx(encoded, memo, account.sequence, candidate_amount);

        let response = match self.api.simulate(&rest, &tx_bytes).await {
            Ok(response) => response,
            Err(e) => return Self::recover(e, fallback),
        };

        let gas_used = response.gas_info.gas_used;
        let gas_used: u64 = gas_used
            .trim()
            .parse()
            .map_err(|_| SimulationError::InvalidGasValue(gas_used.clone()))?;
        let gas = ((gas_used as f64) * GAS_MULTIPLIER).round() as u64;
        let gas = gas.to_string();
        log::debug!("Simulated gas used {}, gas limit {}", gas_used, gas);

        let amount = if sign_options.prefer_no_set_fee {
            vec![self.gas_price.fee_amount(&gas, wallet.chain_id()).await?]
        } else {
            vec![]
        };

        Ok(TxFee::new(gas, amount))
    }

    fn recover(error: ApiError, fallback: Option<&TxFee>) -> Result<TxFee, SimulationError> {
        let ApiError::Status {
            status: 400,
            code,
            ref message,
        } = error
        else {
            return Err(error.into());
        };

        if message.contains(SIMULATION_UNSUPPORTED) {
            if let Some(fee) = fallback.filter(|fee| !fee.gas.is_empty()) {
                log::info!("Simulation unsupported, using fallback fee with gas {}", fee.gas);
                return Ok(fee.clone());
            }
        }

        match code {
            Some(code) if code != 0 => Err(SimulationError::Chain {
                code,
                message: message.clone(),
            }),
            _ => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::proto::AuthInfo;
    use crate::chain::tx_builder::decode_tx_raw;
    use crate::chain::{Coin, SignCapabilities};
    use crate::testing::{chain_config, FakeChainApi, FakeWallet, CHAIN_ID};
    use prost::Message;
    use serde_json::json;

    fn send() -> EncodeObject {
        EncodeObject::new(
            "/cosmos.bank.v1beta1.MsgSend",
            json!({
                "from_address": "osmo1from",
                "to_address": "osmo1to",
                "amount": [{ "denom": "uosmo", "amount": "1" }],
            }),
        )
    }

    fn estimator(api: Arc<FakeChainApi>) -> FeeEstimator {
        let gas_price = GasPriceResolver::new(
            api.clone(),
            Arc::new(vec![chain_config(CHAIN_ID, Some(0.025))]),
            "primary-1",
        );
        FeeEstimator::new(api, Arc::new(MsgRegistry::default()), gas_price)
    }

    #[tokio::test]
    async fn test_gas_is_buffered() {
        let api = Arc::new(FakeChainApi::default());
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let fee = estimator(api.clone())
            .estimate(&wallet, &[send()], None, "", &SignOptions::default())
            .await
            .unwrap();

        assert_eq!(fee.gas, "120000");
        assert!(fee.amount.is_empty());

        let simulated = api.simulated.lock().unwrap()[0].clone();
        let tx = decode_tx_raw(&simulated).unwrap();
        let auth_info = AuthInfo::decode(&tx.auth_info_bytes[..]).unwrap();
        assert_eq!(auth_info.signer_infos[0].sequence, 12);
        assert_eq!(tx.signatures, vec![vec![0u8; 64]]);
    }

    #[tokio::test]
    async fn test_multiplier_rounding() {
        let api = Arc::new(FakeChainApi::default());
        api.set_gas_used("100000");
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let fee = estimator(api.clone())
            .estimate(&wallet, &[send()], None, "", &SignOptions::default())
            .await
            .unwrap();
        assert_eq!(fee.gas, "150000");

        api.set_gas_used("3");
        let fee = estimator(api)
            .estimate(&wallet, &[send()], None, "", &SignOptions::default())
            .await
            .unwrap();
        // 4.5 rounds half away from zero
        assert_eq!(fee.gas, "5");
    }

    #[tokio::test]
    async fn test_prefer_no_set_fee_computes_amount() {
        let api = Arc::new(FakeChainApi::default());
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let options = SignOptions {
            prefer_no_set_fee: true,
            ..SignOptions::default()
        };
        let fee = estimator(api)
            .estimate(&wallet, &[send()], None, "", &options)
            .await
            .unwrap();
        // 120000 * 0.025
        assert_eq!(fee.amount, vec![Coin::new("3000", "uosmo")]);
    }

    #[tokio::test]
    async fn test_invalid_gas_value() {
        let api = Arc::new(FakeChainApi::default());
        api.set_gas_used("lots");
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let err = estimator(api)
            .estimate(&wallet, &[send()], None, "", &SignOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidGasValue(ref v) if v == "lots"));
    }

    #[tokio::test]
    async fn test_unsupported_simulation_returns_fallback() {
        let api = Arc::new(FakeChainApi::default());
        api.fail_simulation(400, None, "invalid empty tx: unknown");
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let fallback = TxFee::new("200000", vec![]);

        let fee = estimator(api.clone())
            .estimate(&wallet, &[send()], Some(&fallback), "", &SignOptions::default())
            .await
            .unwrap();
        assert_eq!(fee, fallback);

        // Without a fallback gas the error surfaces.
        let err = estimator(api)
            .estimate(&wallet, &[send()], Some(&TxFee::default()), "", &SignOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Api(ApiError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_chain_error_message_surfaces() {
        let api = Arc::new(FakeChainApi::default());
        api.fail_simulation(400, Some(5), "spendable balance 0uosmo is smaller than 1uosmo");
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let err = estimator(api)
            .estimate(&wallet, &[send()], None, "", &SignOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "spendable balance 0uosmo is smaller than 1uosmo");
        assert!(matches!(err, SimulationError::Chain { code: 5, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_not_recovered() {
        let api = Arc::new(FakeChainApi::default());
        api.fail_simulation(500, Some(2), "invalid empty tx");
        let wallet = FakeWallet::new(SignCapabilities::BOTH);
        let fallback = TxFee::new("200000", vec![]);
        let err = estimator(api)
            .estimate(&wallet, &[send()], Some(&fallback), "", &SignOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Api(ApiError::Status { status: 500, .. })));
    }
}
