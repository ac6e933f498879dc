//! Transaction Orchestrator - coordinates one sign-and-broadcast attempt per call
//!
//! Attempt lifecycle for a chain:
//! `Idle -> InProgress -> {Fulfilled, BroadcastFailed, PostBroadcastFailed} -> Idle`
//!
//! The chain is marked in progress before anything touches the network and is idle
//! again on every exit path. Failures before a fee is chosen (missing wallet, no
//! messages, no address) return without firing callbacks; anything later fires
//! `on_broadcast_failed` after the state was cleared.

mod events;
mod in_flight;
mod support;

pub use events::{BalanceRefresher, TxCallbacks, TxEventHooks};
pub use in_flight::{InFlightGuard, InFlightTxs};
pub use support::SupportChecks;

use futures::future::{BoxFuture, FutureExt};
use prost::Message;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use crate::chain::proto::{AuthInfo, TxRaw};
use crate::chain::tx_builder::encode_tx_raw;
use crate::chain::{
    ChainApi, EncodeObject, MsgRegistry, RestClient, TracerConnector, Wallet, WalletProvider,
    WalletStatus, WsTracerConnector,
};
use crate::config::{ChainConfig, Config};
use crate::error::{ApiError, TxError, WalletError};
use crate::tx::{
    Broadcaster, ConfirmationTracer, DeliverTxResponse, FeeEstimator, GasPriceResolver,
    SequenceResolver, TimeoutHeightResolver, TxFee, TxSigner,
};

type MessageProducer =
    Box<dyn FnOnce() -> BoxFuture<'static, Result<Vec<EncodeObject>, TxError>> + Send>;

/// Messages of a request, either known upfront or produced once the attempt started.
pub enum TxMessages {
    Ready(Vec<EncodeObject>),
    Deferred(MessageProducer),
}

impl TxMessages {
    pub fn deferred<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<EncodeObject>, TxError>> + Send + 'static,
    {
        TxMessages::Deferred(Box::new(move || producer().boxed()))
    }

    async fn resolve(self) -> Result<Vec<EncodeObject>, TxError> {
        match self {
            TxMessages::Ready(messages) => Ok(messages),
            TxMessages::Deferred(producer) => producer().await,
        }
    }
}

impl From<Vec<EncodeObject>> for TxMessages {
    fn from(messages: Vec<EncodeObject>) -> Self {
        TxMessages::Ready(messages)
    }
}

pub struct TxRequest {
    pub chain_id: String,
    /// Label reported by [`TxOrchestrator::tx_type_in_progress`] while outstanding.
    pub tx_type: String,
    pub messages: TxMessages,
    pub memo: String,
    /// A forced fee is used as is. Otherwise the fee is estimated and this one serves as
    /// the fallback for nodes that cannot simulate.
    pub fee: Option<TxFee>,
}

impl TxRequest {
    pub fn new(
        chain_id: impl Into<String>,
        tx_type: impl Into<String>,
        messages: impl Into<TxMessages>,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            tx_type: tx_type.into(),
            messages: messages.into(),
            memo: String::new(),
            fee: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_fee(mut self, fee: TxFee) -> Self {
        self.fee = Some(fee);
        self
    }
}

pub struct TxOrchestrator {
    wallets: Arc<dyn WalletProvider>,
    primary_chain_id: String,
    estimator: FeeEstimator,
    signer: TxSigner,
    broadcaster: Broadcaster,
    tracer: ConfirmationTracer,
    in_flight: InFlightTxs,
    support: SupportChecks,
    hooks: Option<Arc<dyn TxEventHooks>>,
    balances: Option<Arc<dyn BalanceRefresher>>,
}

impl TxOrchestrator {
    pub fn new(
        api: Arc<dyn ChainApi>,
        connector: Arc<dyn TracerConnector>,
        wallets: Arc<dyn WalletProvider>,
        chains: Arc<Vec<ChainConfig>>,
        primary_chain_id: impl Into<String>,
    ) -> Self {
        Self::with_registry(
            api,
            connector,
            wallets,
            chains,
            primary_chain_id,
            Arc::new(MsgRegistry::default()),
        )
    }

    pub fn with_registry(
        api: Arc<dyn ChainApi>,
        connector: Arc<dyn TracerConnector>,
        wallets: Arc<dyn WalletProvider>,
        chains: Arc<Vec<ChainConfig>>,
        primary_chain_id: impl Into<String>,
        registry: Arc<MsgRegistry>,
    ) -> Self {
        let primary_chain_id = primary_chain_id.into();
        let gas_price = GasPriceResolver::new(api.clone(), chains, primary_chain_id.clone());

        Self {
            wallets,
            estimator: FeeEstimator::new(api.clone(), registry.clone(), gas_price),
            signer: TxSigner::new(
                registry,
                SequenceResolver::new(api.clone()),
                TimeoutHeightResolver::new(api.clone()),
            ),
            broadcaster: Broadcaster::new(api),
            tracer: ConfirmationTracer::new(connector),
            primary_chain_id,
            in_flight: InFlightTxs::new(),
            support: SupportChecks::new(),
            hooks: None,
            balances: None,
        }
    }

    /// REST client and websocket tracer as configured.
    pub fn from_config(config: &Config, wallets: Arc<dyn WalletProvider>) -> Result<Self, ApiError> {
        let api = Arc::new(RestClient::new(config.client_config())?);
        Ok(Self::new(
            api,
            Arc::new(WsTracerConnector),
            wallets,
            Arc::new(config.chains.clone()),
            config.engine.primary_chain_id.clone(),
        ))
    }

    pub fn with_event_hooks(mut self, hooks: Arc<dyn TxEventHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_balance_refresher(mut self, balances: Arc<dyn BalanceRefresher>) -> Self {
        self.balances = Some(balances);
        self
    }

    /// Estimates, signs, broadcasts and waits for inclusion. A transaction that was
    /// included but failed execution resolves with its non-zero code.
    pub async fn sign_and_broadcast(
        &self,
        request: TxRequest,
        mut callbacks: TxCallbacks,
    ) -> Result<DeliverTxResponse, TxError> {
        let TxRequest {
            chain_id,
            tx_type,
            messages,
            memo,
            fee,
        } = request;

        let mut in_flight = self.in_flight.begin(&chain_id, &tx_type);
        log::info!("Starting {} transaction on {}", tx_type, chain_id);

        let wallet = self.connected_wallet(&chain_id)?;
        let messages = messages.resolve().await?;
        if messages.is_empty() {
            return Err(TxError::NoMessages);
        }
        let address = wallet.address().ok_or(TxError::AddressRequired)?;

        let (tx_hash, fee_denoms) = match self.submit(wallet.as_ref(), &messages, fee, &memo).await {
            Ok(submitted) => submitted,
            Err(e) => return Err(self.fail(&chain_id, &mut in_flight, &mut callbacks, e)),
        };

        if let Some(hooks) = &self.hooks {
            hooks.on_broadcasted(&chain_id, &tx_hash);
        }
        if let Some(on_broadcasted) = callbacks.on_broadcasted.take() {
            on_broadcasted(&tx_hash);
        }

        let tx = match self
            .tracer
            .confirm(wallet.rpc_endpoint().as_deref(), &tx_hash)
            .await
        {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(&chain_id, &mut in_flight, &mut callbacks, e.into())),
        };
        in_flight.clear();

        if let Some(balances) = &self.balances {
            for denom in &fee_denoms {
                balances.refresh_balance(&chain_id, &address, denom).await;
            }
        }

        if let Some(hooks) = &self.hooks {
            hooks.on_fulfill(&chain_id, &tx);
        }
        if let Some(on_fulfill) = callbacks.on_fulfill.take() {
            on_fulfill(&tx);
        }

        Ok(tx)
    }

    /// Fee, signature and broadcast. Returns the transaction hash and the denoms of the
    /// fee the signed transaction pays.
    async fn submit(
        &self,
        wallet: &dyn Wallet,
        messages: &[EncodeObject],
        fee: Option<TxFee>,
        memo: &str,
    ) -> Result<(Vec<u8>, BTreeSet<String>), TxError> {
        let fee = match fee {
            Some(fee) if fee.force => fee,
            fallback => {
                self.estimator
                    .estimate(wallet, messages, fallback.as_ref(), memo, &wallet.sign_options())
                    .await?
            }
        };

        let tx = self.signer.sign(wallet, messages, &fee, memo).await?;
        let fee_denoms = paid_fee_denoms(&tx);

        let tx_hash = self
            .broadcaster
            .broadcast(wallet.rest_endpoint().as_deref(), &encode_tx_raw(&tx))
            .await?;
        Ok((tx_hash, fee_denoms))
    }

    fn fail(
        &self,
        chain_id: &str,
        in_flight: &mut InFlightGuard<'_>,
        callbacks: &mut TxCallbacks,
        error: TxError,
    ) -> TxError {
        in_flight.clear();
        log::warn!("Transaction on {} failed: {}", chain_id, error);

        if let Some(hooks) = &self.hooks {
            hooks.on_broadcast_failed(chain_id, &error);
        }
        if let Some(on_broadcast_failed) = callbacks.on_broadcast_failed.take() {
            on_broadcast_failed(&error);
        }
        error
    }

    pub async fn estimate_fee(
        &self,
        chain_id: &str,
        messages: &[EncodeObject],
        fallback: Option<&TxFee>,
        memo: &str,
    ) -> Result<TxFee, TxError> {
        let wallet = self.connected_wallet(chain_id)?;
        if wallet.address().is_none() {
            return Err(TxError::AddressRequired);
        }
        Ok(self
            .estimator
            .estimate(wallet.as_ref(), messages, fallback, memo, &wallet.sign_options())
            .await?)
    }

    pub async fn sign(
        &self,
        chain_id: &str,
        messages: &[EncodeObject],
        fee: &TxFee,
        memo: &str,
    ) -> Result<TxRaw, TxError> {
        let wallet = self.connected_wallet(chain_id)?;
        self.signer.sign(wallet.as_ref(), messages, fee, memo).await
    }

    pub fn tx_type_in_progress(&self, chain_id: &str) -> Option<String> {
        self.in_flight.tx_type(chain_id)
    }

    /// Connected wallet with an address and nothing outstanding on the chain.
    pub fn is_ready_to_send_tx(&self, chain_id: &str) -> bool {
        self.in_flight.is_idle(chain_id)
            && self
                .wallets
                .wallet(chain_id)
                .map(|wallet| wallet.status() == WalletStatus::Connected && wallet.address().is_some())
                .unwrap_or(false)
    }

    /// Whether the wallet connected on the primary chain can serve `chain_id`. `None`
    /// when no wallet is connected there.
    pub async fn connected_wallet_supports_chain(&self, chain_id: &str) -> Option<bool> {
        let wallet = self
            .wallets
            .wallet(&self.primary_chain_id)
            .filter(|wallet| wallet.status() == WalletStatus::Connected)?;
        Some(self.support.supports(wallet, chain_id).await)
    }

    /// Standardized form of a raw wallet error message, if the chain's wallet knows it.
    pub fn match_error(&self, chain_id: &str, message: &str) -> Option<WalletError> {
        self.wallets.wallet(chain_id)?.match_error(message)
    }

    fn connected_wallet(&self, chain_id: &str) -> Result<Arc<dyn Wallet>, WalletError> {
        let wallet = self
            .wallets
            .wallet(chain_id)
            .ok_or_else(|| WalletError::NotProvided(chain_id.to_string()))?;
        if wallet.status() != WalletStatus::Connected {
            return Err(WalletError::NotConnected(chain_id.to_string()));
        }
        Ok(wallet)
    }
}

fn paid_fee_denoms(tx: &TxRaw) -> BTreeSet<String> {
    AuthInfo::decode(&tx.auth_info_bytes[..])
        .ok()
        .and_then(|auth_info| auth_info.fee)
        .map(|fee| fee.amount.into_iter().map(|coin| coin.denom).collect())
        .unwrap_or_default()
}
