// Library exports for cosmos_tx_engine

pub mod chain;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod tx;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use chain::{EncodeObject, LocalWallet, MsgRegistry, RestClient, Wallet, WalletProvider};
pub use config::Config;
pub use error::TxError;
pub use orchestrator::{TxCallbacks, TxMessages, TxOrchestrator, TxRequest};
pub use tx::{DeliverTxResponse, TxFee};
