//! Wallet seams of the transaction pipeline.
//!
//! A [`Wallet`] is the per-chain handle: address, status, endpoints and the signing
//! backends. Signing itself goes through an [`OfflineSigner`] (always present once
//! initialized) or the wallet's own [`WalletClient`], each of which declares the sign modes
//! it implements through [`SignCapabilities`].

mod keys;
mod local;
mod signer;

pub use keys::{bech32_address, LocalKey};
pub use local::{LocalSigner, LocalWallet};
pub use signer::TransactionSigner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::amino::{AminoSignResponse, StdSignDoc, StdSignature};
use crate::chain::proto::SignDoc;
use crate::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Disconnected,
    Connecting,
    Connected,
    Rejected,
    Error,
    NotExist,
}

/// Sign modes a backend implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignCapabilities {
    pub amino: bool,
    pub direct: bool,
}

impl SignCapabilities {
    pub const NONE: Self = Self {
        amino: false,
        direct: false,
    };
    pub const AMINO: Self = Self {
        amino: true,
        direct: false,
    };
    pub const DIRECT: Self = Self {
        amino: false,
        direct: true,
    };
    pub const BOTH: Self = Self {
        amino: true,
        direct: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountData {
    pub address: String,
    pub algo: String,
    /// Compressed secp256k1 public key
    pub pubkey: Vec<u8>,
}

/// Wallet specific signing preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOptions {
    /// The wallet does not pick a fee itself, so the estimator has to fill in an amount.
    #[serde(default)]
    pub prefer_no_set_fee: bool,
    #[serde(default)]
    pub prefer_no_set_memo: bool,
    #[serde(default)]
    pub disable_balance_check: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectSignResponse {
    /// Body and auth info bytes as signed. They go into the transaction verbatim.
    pub signed: SignDoc,
    pub signature: StdSignature,
}

#[async_trait]
pub trait OfflineSigner: Send + Sync {
    fn capabilities(&self) -> SignCapabilities;

    async fn get_accounts(&self) -> Result<Vec<AccountData>, WalletError>;

    async fn sign_amino(
        &self,
        _signer_address: &str,
        _sign_doc: StdSignDoc,
    ) -> Result<AminoSignResponse, WalletError> {
        Err(WalletError::UnsupportedSigningMode)
    }

    async fn sign_direct(
        &self,
        _signer_address: &str,
        _sign_doc: SignDoc,
    ) -> Result<DirectSignResponse, WalletError> {
        Err(WalletError::UnsupportedSigningMode)
    }
}

/// Signing entry points of the wallet application itself. They receive the chain id and
/// the wallet's sign options, which lets the application show its own approval flow.
#[async_trait]
pub trait WalletClient: Send + Sync {
    fn capabilities(&self) -> SignCapabilities;

    async fn sign_amino(
        &self,
        _chain_id: &str,
        _signer_address: &str,
        _sign_doc: StdSignDoc,
        _options: &SignOptions,
    ) -> Result<AminoSignResponse, WalletError> {
        Err(WalletError::UnsupportedSigningMode)
    }

    async fn sign_direct(
        &self,
        _chain_id: &str,
        _signer_address: &str,
        _sign_doc: SignDoc,
        _options: &SignOptions,
    ) -> Result<DirectSignResponse, WalletError> {
        Err(WalletError::UnsupportedSigningMode)
    }
}

#[async_trait]
pub trait Wallet: Send + Sync {
    fn wallet_name(&self) -> &str;

    fn chain_id(&self) -> &str;

    fn address(&self) -> Option<String>;

    fn status(&self) -> WalletStatus;

    fn rest_endpoint(&self) -> Option<String>;

    fn rpc_endpoint(&self) -> Option<String>;

    fn sign_options(&self) -> SignOptions {
        SignOptions::default()
    }

    fn client(&self) -> Option<Arc<dyn WalletClient>> {
        None
    }

    /// `None` until [`Wallet::init_offline_signer`] succeeded.
    fn offline_signer(&self) -> Option<Arc<dyn OfflineSigner>>;

    async fn init_offline_signer(&self) -> Result<(), WalletError>;

    async fn supports_chain(&self, chain_id: &str) -> Result<bool, WalletError>;

    /// Map a raw wallet error message to a standard error, if this wallet knows it.
    fn match_error(&self, _message: &str) -> Option<WalletError> {
        None
    }
}

/// Looks up the wallet handle for a chain.
pub trait WalletProvider: Send + Sync {
    fn wallet(&self, chain_id: &str) -> Option<Arc<dyn Wallet>>;
}

impl WalletProvider for HashMap<String, Arc<dyn Wallet>> {
    fn wallet(&self, chain_id: &str) -> Option<Arc<dyn Wallet>> {
        self.get(chain_id).cloned()
    }
}
