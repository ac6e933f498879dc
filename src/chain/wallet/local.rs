use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use prost::Message;
use std::sync::{Arc, OnceLock};

use super::{
    AccountData, DirectSignResponse, LocalKey, OfflineSigner, SignCapabilities, SignOptions,
    TransactionSigner, Wallet, WalletStatus,
};
use crate::chain::amino::{
    serialize_sign_doc, AminoPubKey, AminoSignResponse, StdSignDoc, StdSignature,
    SECP256K1_AMINO_PUBKEY_TYPE,
};
use crate::chain::proto::SignDoc;
use crate::config::ChainConfig;
use crate::error::WalletError;

/// Offline signer backed by a [`LocalKey`].
pub struct LocalSigner {
    key: Arc<LocalKey>,
    capabilities: SignCapabilities,
    signer: TransactionSigner,
}

impl LocalSigner {
    pub fn new(key: Arc<LocalKey>, capabilities: SignCapabilities) -> Self {
        Self {
            key,
            capabilities,
            signer: TransactionSigner::new(),
        }
    }

    fn check_signer(&self, signer_address: &str) -> Result<(), WalletError> {
        if signer_address != self.key.address {
            return Err(WalletError::AccountMismatch);
        }
        Ok(())
    }

    fn std_signature(&self, sign_bytes: &[u8]) -> Result<StdSignature, WalletError> {
        let signature = self.signer.sign_bytes(sign_bytes, &self.key.private_key()?)?;
        Ok(StdSignature {
            pub_key: AminoPubKey {
                key_type: SECP256K1_AMINO_PUBKEY_TYPE.to_string(),
                value: BASE64.encode(self.key.public_key_compressed()),
            },
            signature: BASE64.encode(signature),
        })
    }
}

#[async_trait]
impl OfflineSigner for LocalSigner {
    fn capabilities(&self) -> SignCapabilities {
        self.capabilities
    }

    async fn get_accounts(&self) -> Result<Vec<AccountData>, WalletError> {
        Ok(vec![AccountData {
            address: self.key.address.clone(),
            algo: "secp256k1".to_string(),
            pubkey: self.key.public_key_compressed().to_vec(),
        }])
    }

    async fn sign_amino(
        &self,
        signer_address: &str,
        sign_doc: StdSignDoc,
    ) -> Result<AminoSignResponse, WalletError> {
        if !self.capabilities.amino {
            return Err(WalletError::UnsupportedSigningMode);
        }
        self.check_signer(signer_address)?;

        let sign_bytes =
            serialize_sign_doc(&sign_doc).map_err(|e| WalletError::Backend(e.to_string()))?;
        let signature = self.std_signature(&sign_bytes)?;
        Ok(AminoSignResponse {
            signed: sign_doc,
            signature,
        })
    }

    async fn sign_direct(
        &self,
        signer_address: &str,
        sign_doc: SignDoc,
    ) -> Result<DirectSignResponse, WalletError> {
        if !self.capabilities.direct {
            return Err(WalletError::UnsupportedSigningMode);
        }
        self.check_signer(signer_address)?;

        let signature = self.std_signature(&sign_doc.encode_to_vec())?;
        Ok(DirectSignResponse {
            signed: sign_doc,
            signature,
        })
    }
}

/// Wallet handle over a mnemonic. Always connected; the offline signer is created on
/// first use like a browser wallet's.
pub struct LocalWallet {
    name: String,
    chain_id: String,
    rest: String,
    rpc: String,
    key: Arc<LocalKey>,
    capabilities: SignCapabilities,
    sign_options: SignOptions,
    signer: OnceLock<Arc<dyn OfflineSigner>>,
}

impl LocalWallet {
    pub fn new(
        key: LocalKey,
        chain_id: impl Into<String>,
        rest: impl Into<String>,
        rpc: impl Into<String>,
    ) -> Self {
        Self {
            name: "local".to_string(),
            chain_id: chain_id.into(),
            rest: rest.into(),
            rpc: rpc.into(),
            key: Arc::new(key),
            capabilities: SignCapabilities::BOTH,
            // No approval popup to pick a fee in, so the estimator has to fill one in.
            sign_options: SignOptions {
                prefer_no_set_fee: true,
                ..SignOptions::default()
            },
            signer: OnceLock::new(),
        }
    }

    pub fn from_mnemonic(mnemonic: &str, chain: &ChainConfig) -> Result<Self, WalletError> {
        let key = LocalKey::from_mnemonic(mnemonic, "", &chain.bech32_prefix)?;
        Ok(Self::new(key, &chain.chain_id, &chain.rest, &chain.rpc))
    }

    pub fn with_capabilities(mut self, capabilities: SignCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_sign_options(mut self, sign_options: SignOptions) -> Self {
        self.sign_options = sign_options;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    fn wallet_name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn address(&self) -> Option<String> {
        Some(self.key.address.clone())
    }

    fn status(&self) -> WalletStatus {
        WalletStatus::Connected
    }

    fn rest_endpoint(&self) -> Option<String> {
        Some(self.rest.clone()).filter(|rest| !rest.is_empty())
    }

    fn rpc_endpoint(&self) -> Option<String> {
        Some(self.rpc.clone()).filter(|rpc| !rpc.is_empty())
    }

    fn sign_options(&self) -> SignOptions {
        self.sign_options.clone()
    }

    fn offline_signer(&self) -> Option<Arc<dyn OfflineSigner>> {
        self.signer.get().cloned()
    }

    async fn init_offline_signer(&self) -> Result<(), WalletError> {
        self.signer.get_or_init(|| {
            log::debug!("Initializing local signer for {}", self.chain_id);
            Arc::new(LocalSigner::new(self.key.clone(), self.capabilities))
        });
        Ok(())
    }

    async fn supports_chain(&self, chain_id: &str) -> Result<bool, WalletError> {
        Ok(chain_id == self.chain_id)
    }
}
