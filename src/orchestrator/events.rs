//! Lifecycle notifications of a sign-and-broadcast attempt.
//!
//! [`TxEventHooks`] belong to the orchestrator and hear about every attempt, before the
//! per-call [`TxCallbacks`] of that attempt run. At most one terminal event
//! (`on_fulfill` or `on_broadcast_failed`) fires per attempt.

use async_trait::async_trait;

use crate::error::TxError;
use crate::tx::DeliverTxResponse;

type BroadcastedFn = Box<dyn FnOnce(&[u8]) + Send>;
type FulfillFn = Box<dyn FnOnce(&DeliverTxResponse) + Send>;
type BroadcastFailedFn = Box<dyn FnOnce(&TxError) + Send>;

/// Callbacks for a single attempt.
#[derive(Default)]
pub struct TxCallbacks {
    pub on_broadcasted: Option<BroadcastedFn>,
    pub on_fulfill: Option<FulfillFn>,
    pub on_broadcast_failed: Option<BroadcastFailedFn>,
}

impl TxCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fulfill_only(on_fulfill: impl FnOnce(&DeliverTxResponse) + Send + 'static) -> Self {
        Self::new().on_fulfill(on_fulfill)
    }

    /// Receives the raw transaction hash bytes.
    pub fn on_broadcasted(mut self, callback: impl FnOnce(&[u8]) + Send + 'static) -> Self {
        self.on_broadcasted = Some(Box::new(callback));
        self
    }

    pub fn on_fulfill(mut self, callback: impl FnOnce(&DeliverTxResponse) + Send + 'static) -> Self {
        self.on_fulfill = Some(Box::new(callback));
        self
    }

    pub fn on_broadcast_failed(mut self, callback: impl FnOnce(&TxError) + Send + 'static) -> Self {
        self.on_broadcast_failed = Some(Box::new(callback));
        self
    }
}

/// Orchestrator wide hooks, keyed by chain id.
pub trait TxEventHooks: Send + Sync {
    fn on_broadcasted(&self, _chain_id: &str, _tx_hash: &[u8]) {}

    fn on_fulfill(&self, _chain_id: &str, _tx: &DeliverTxResponse) {}

    fn on_broadcast_failed(&self, _chain_id: &str, _error: &TxError) {}
}

/// Told to refetch a balance after a confirmed transaction paid fees in `denom`.
#[async_trait]
pub trait BalanceRefresher: Send + Sync {
    async fn refresh_balance(&self, chain_id: &str, address: &str, denom: &str);
}
