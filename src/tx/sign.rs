use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;
use std::sync::Arc;

use super::{SequenceResolver, TimeoutHeightResolver, TxFee};
use crate::chain::amino::{make_sign_doc_amino, AminoMsg, StdFee, StdSignature};
use crate::chain::proto::{self, Any, TxRaw};
use crate::chain::tx_builder::{
    encode_pubkey, encode_tx_body, make_auth_info_bytes, make_sign_doc, proto_fee,
};
use crate::chain::{
    AccountInfo, EncodeObject, MsgRegistry, OfflineSigner, SignCapabilities, Wallet, WalletClient,
};
use crate::error::{SequenceError, TxError, WalletError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMode {
    Amino,
    Direct,
}

/// Amino wins whenever either backend offers it; hardware wallets only do amino and
/// amino sign docs are what wallets can render for review.
pub fn select_sign_mode(
    client: SignCapabilities,
    offline: SignCapabilities,
) -> Result<SignMode, WalletError> {
    if client.amino || offline.amino {
        Ok(SignMode::Amino)
    } else if client.direct || offline.direct {
        Ok(SignMode::Direct)
    } else {
        Err(WalletError::UnsupportedSigningMode)
    }
}

/// Where a signature request goes. The wallet client is asked first when it implements
/// the chosen mode.
enum Backend {
    Client(Arc<dyn WalletClient>),
    Offline(Arc<dyn OfflineSigner>),
}

struct SignerContext<'a> {
    wallet: &'a dyn Wallet,
    backend: Backend,
    address: String,
    chain_id: String,
    account: AccountInfo,
    pubkey: Any,
}

/// Builds and signs transactions through whichever sign mode the wallet supports.
#[derive(Clone)]
pub struct TxSigner {
    registry: Arc<MsgRegistry>,
    sequence: SequenceResolver,
    timeout: TimeoutHeightResolver,
}

impl TxSigner {
    pub fn new(
        registry: Arc<MsgRegistry>,
        sequence: SequenceResolver,
        timeout: TimeoutHeightResolver,
    ) -> Self {
        Self {
            registry,
            sequence,
            timeout,
        }
    }

    pub async fn sign(
        &self,
        wallet: &dyn Wallet,
        messages: &[EncodeObject],
        fee: &TxFee,
        memo: &str,
    ) -> Result<TxRaw, TxError> {
        let account = self.sequence.resolve(wallet).await?;

        let chain_id = wallet.chain_id().to_string();
        if chain_id.is_empty() {
            return Err(TxError::ChainIdMissing);
        }

        if wallet.offline_signer().is_none() {
            wallet.init_offline_signer().await?;
        }
        let offline = wallet
            .offline_signer()
            .ok_or(WalletError::SignerInitFailed)?;

        let client = wallet.client();
        let client_capabilities = client
            .as_ref()
            .map(|client| client.capabilities())
            .unwrap_or(SignCapabilities::NONE);
        let mode = select_sign_mode(client_capabilities, offline.capabilities())?;

        let address = wallet.address().ok_or(SequenceError::MissingAddress)?;
        let account_data = offline
            .get_accounts()
            .await?
            .into_iter()
            .find(|account| account.address == address)
            .ok_or(WalletError::AccountMismatch)?;

        let client_handles = match mode {
            SignMode::Amino => client_capabilities.amino,
            SignMode::Direct => client_capabilities.direct,
        };
        let backend = match client {
            Some(client) if client_handles => Backend::Client(client),
            _ => Backend::Offline(offline),
        };

        let ctx = SignerContext {
            wallet,
            backend,
            address,
            chain_id,
            account,
            pubkey: encode_pubkey(&account_data.pubkey),
        };

        log::debug!(
            "Signing {} message(s) for {} on {} with {:?}",
            messages.len(),
            ctx.address,
            ctx.chain_id,
            mode
        );

        match mode {
            SignMode::Amino => self.sign_amino(ctx, messages, fee, memo).await,
            SignMode::Direct => self.sign_direct(ctx, messages, fee, memo).await,
        }
    }

    async fn sign_amino(
        &self,
        ctx: SignerContext<'_>,
        messages: &[EncodeObject],
        fee: &TxFee,
        memo: &str,
    ) -> Result<TxRaw, TxError> {
        let msgs = messages
            .iter()
            .map(|msg| {
                let mut amino = self.registry.to_amino(msg)?;
                // The registry drops message memos; put them back.
                if let Some(memo) = msg.memo() {
                    set_memo(&mut amino.value, memo);
                }
                Ok(amino)
            })
            .collect::<Result<Vec<AminoMsg>, TxError>>()?;

        let timeout_height = self
            .timeout
            .resolve(ctx.wallet.rpc_endpoint().as_deref())
            .await;

        let sign_doc = make_sign_doc_amino(
            msgs,
            StdFee::from(fee),
            &ctx.chain_id,
            memo,
            ctx.account.account_number,
            ctx.account.sequence,
            timeout_height,
        );

        let response = match &ctx.backend {
            Backend::Client(client) => {
                client
                    .sign_amino(&ctx.chain_id, &ctx.address, sign_doc, &ctx.wallet.sign_options())
                    .await?
            }
            Backend::Offline(offline) => offline.sign_amino(&ctx.address, sign_doc).await?,
        };
        let signed = response.signed;

        // The wallet may have edited the document; the transaction follows what it signed.
        let signed_messages = signed
            .msgs
            .iter()
            .map(|amino| {
                let mut msg = self.registry.from_amino(amino)?;
                if let Some(memo) = amino.value.get("memo").and_then(Value::as_str) {
                    if !memo.is_empty() {
                        set_memo(&mut msg.value, memo);
                    }
                }
                Ok(msg)
            })
            .collect::<Result<Vec<EncodeObject>, TxError>>()?;

        let body_bytes = encode_tx_body(
            self.registry.encode_all(&signed_messages)?,
            &signed.memo,
            timeout_height,
        );

        let signed_sequence: u64 = signed.sequence.parse().map_err(|_| {
            TxError::InvalidSignResponse(format!("sequence {:?}", signed.sequence))
        })?;
        let auth_info_bytes = make_auth_info_bytes(
            Some(ctx.pubkey),
            proto::SignMode::LegacyAminoJson,
            signed_sequence,
            proto_fee(&signed.fee)?,
        );

        Ok(TxRaw {
            body_bytes,
            auth_info_bytes,
            signatures: vec![decode_signature(&response.signature)?],
        })
    }

    async fn sign_direct(
        &self,
        ctx: SignerContext<'_>,
        messages: &[EncodeObject],
        fee: &TxFee,
        memo: &str,
    ) -> Result<TxRaw, TxError> {
        let body_bytes = encode_tx_body(self.registry.encode_all(messages)?, memo, 0);
        let auth_info_bytes = make_auth_info_bytes(
            Some(ctx.pubkey),
            proto::SignMode::Direct,
            ctx.account.sequence,
            proto_fee(&StdFee::from(fee))?,
        );
        let sign_doc = make_sign_doc(
            body_bytes,
            auth_info_bytes,
            &ctx.chain_id,
            ctx.account.account_number,
        );

        let response = match &ctx.backend {
            Backend::Client(client) => {
                client
                    .sign_direct(&ctx.chain_id, &ctx.address, sign_doc, &ctx.wallet.sign_options())
                    .await?
            }
            Backend::Offline(offline) => offline.sign_direct(&ctx.address, sign_doc).await?,
        };

        Ok(TxRaw {
            body_bytes: response.signed.body_bytes,
            auth_info_bytes: response.signed.auth_info_bytes,
            signatures: vec![decode_signature(&response.signature)?],
        })
    }
}

fn set_memo(value: &mut Value, memo: &str) {
    if let Some(map) = value.as_object_mut() {
        map.insert("memo".to_string(), Value::String(memo.to_string()));
    }
}

fn decode_signature(signature: &StdSignature) -> Result<Vec<u8>, TxError> {
    BASE64
        .decode(&signature.signature)
        .map_err(|e| TxError::InvalidSignResponse(format!("signature: {}", e)))
}
