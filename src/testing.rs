//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::chain::amino::{AminoPubKey, AminoSignResponse, StdFee, StdSignDoc, StdSignature};
use crate::chain::proto::SignDoc;
use crate::chain::{
    AccountData, AccountInfo, BroadcastMode, ChainApi, DirectSignResponse, OfflineSigner,
    SignCapabilities, SignOptions, SimulateResponse, TracerConnector, TxResponse, TxTracer,
    Wallet, WalletClient, WalletProvider, WalletStatus,
};
use crate::chain::client::GasInfo;
use crate::config::{ChainConfig, FeeToken};
use crate::error::{ApiError, ConfirmationError, TxError, WalletError};
use crate::orchestrator::{BalanceRefresher, TxEventHooks};
use crate::tx::DeliverTxResponse;

pub const ADDRESS: &str = "osmo1testaddress";
pub const CHAIN_ID: &str = "osmosis-1";
pub const REST: &str = "http://rest.test";
pub const RPC: &str = "http://rpc.test";

pub fn chain_config(chain_id: &str, average_gas_price: Option<f64>) -> ChainConfig {
    ChainConfig {
        chain_id: chain_id.to_string(),
        chain_name: format!("{}-name", chain_id),
        rest: REST.to_string(),
        rpc: RPC.to_string(),
        bech32_prefix: "osmo".to_string(),
        fee_tokens: vec![FeeToken {
            denom: "uosmo".to_string(),
            average_gas_price,
        }],
    }
}

fn status_error(status: u16, code: Option<i64>, message: &str) -> ApiError {
    ApiError::Status {
        status,
        code,
        message: message.to_string(),
    }
}

/// Scripted node.
pub struct FakeChainApi {
    pub account: Mutex<Option<AccountInfo>>,
    pub gas_used: Mutex<String>,
    pub simulate_error: Mutex<Option<(u16, Option<i64>, String)>>,
    pub broadcast_response: Mutex<TxResponse>,
    pub latest_height: Mutex<Option<String>>,
    pub status_reachable: AtomicBool,
    pub base_fee: Mutex<Option<String>>,

    pub account_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub base_fee_calls: AtomicUsize,
    pub simulated: Mutex<Vec<Vec<u8>>>,
    pub broadcasted: Mutex<Vec<Vec<u8>>>,
}

impl Default for FakeChainApi {
    fn default() -> Self {
        Self {
            account: Mutex::new(Some(AccountInfo {
                address: ADDRESS.to_string(),
                sequence: 12,
                account_number: 5,
            })),
            gas_used: Mutex::new("80000".to_string()),
            simulate_error: Mutex::new(None),
            broadcast_response: Mutex::new(TxResponse {
                txhash: "ABCDEF0123".to_string(),
                ..TxResponse::default()
            }),
            latest_height: Mutex::new(Some("1000".to_string())),
            status_reachable: AtomicBool::new(true),
            base_fee: Mutex::new(None),
            account_calls: AtomicUsize::new(0),
            simulate_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            base_fee_calls: AtomicUsize::new(0),
            simulated: Mutex::new(vec![]),
            broadcasted: Mutex::new(vec![]),
        }
    }
}

impl FakeChainApi {
    pub fn set_gas_used(&self, gas_used: &str) {
        *self.gas_used.lock().unwrap() = gas_used.to_string();
    }

    pub fn fail_simulation(&self, status: u16, code: Option<i64>, message: &str) {
        *self.simulate_error.lock().unwrap() = Some((status, code, message.to_string()));
    }

    pub fn reject_broadcast(&self, code: u32, raw_log: &str) {
        let mut response = self.broadcast_response.lock().unwrap();
        response.code = code;
        response.codespace = "sdk".to_string();
        response.raw_log = raw_log.to_string();
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasted.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainApi for FakeChainApi {
    async fn account(&self, _rest: &str, _address: &str) -> Result<Option<AccountInfo>, ApiError> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.account.lock().unwrap().clone())
    }

    async fn simulate(&self, _rest: &str, tx_bytes: &[u8]) -> Result<SimulateResponse, ApiError> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        self.simulated.lock().unwrap().push(tx_bytes.to_vec());
        if let Some((status, code, message)) = self.simulate_error.lock().unwrap().clone() {
            return Err(status_error(status, code, &message));
        }
        Ok(SimulateResponse {
            gas_info: GasInfo {
                gas_used: self.gas_used.lock().unwrap().clone(),
                gas_wanted: String::new(),
            },
        })
    }

    async fn broadcast(
        &self,
        _rest: &str,
        tx_bytes: &[u8],
        _mode: BroadcastMode,
    ) -> Result<TxResponse, ApiError> {
        self.broadcasted.lock().unwrap().push(tx_bytes.to_vec());
        Ok(self.broadcast_response.lock().unwrap().clone())
    }

    async fn latest_block_height(&self, _rpc: &str) -> Result<Option<String>, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_reachable.load(Ordering::SeqCst) {
            return Err(status_error(503, None, "unreachable"));
        }
        Ok(self.latest_height.lock().unwrap().clone())
    }

    async fn base_fee(&self, _rest: &str) -> Result<String, ApiError> {
        self.base_fee_calls.fetch_add(1, Ordering::SeqCst);
        self.base_fee
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| status_error(501, Some(12), "not implemented"))
    }
}

/// Signing backend that records which mode was used. Usable as offline signer and as
/// wallet client.
pub struct FakeSigner {
    pub capabilities: SignCapabilities,
    pub accounts: Vec<AccountData>,
    pub amino_calls: AtomicUsize,
    pub direct_calls: AtomicUsize,
    /// Fee the "user" picks in the wallet popup.
    pub amino_fee_override: Mutex<Option<StdFee>>,
    pub amino_docs: Mutex<Vec<StdSignDoc>>,
    pub reject_with: Mutex<Option<String>>,
}

impl FakeSigner {
    pub fn new(capabilities: SignCapabilities) -> Self {
        Self {
            capabilities,
            accounts: vec![AccountData {
                address: ADDRESS.to_string(),
                algo: "secp256k1".to_string(),
                pubkey: vec![2u8; 33],
            }],
            amino_calls: AtomicUsize::new(0),
            direct_calls: AtomicUsize::new(0),
            amino_fee_override: Mutex::new(None),
            amino_docs: Mutex::new(vec![]),
            reject_with: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> (usize, usize) {
        (
            self.amino_calls.load(Ordering::SeqCst),
            self.direct_calls.load(Ordering::SeqCst),
        )
    }

    fn signature() -> StdSignature {
        StdSignature {
            pub_key: AminoPubKey {
                key_type: "tendermint/PubKeySecp256k1".to_string(),
                value: BASE64.encode([2u8; 33]),
            },
            signature: BASE64.encode([9u8; 64]),
        }
    }

    fn amino(&self, mut sign_doc: StdSignDoc) -> Result<AminoSignResponse, WalletError> {
        if !self.capabilities.amino {
            return Err(WalletError::UnsupportedSigningMode);
        }
        self.amino_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(WalletError::Rejected(reason));
        }
        self.amino_docs.lock().unwrap().push(sign_doc.clone());
        if let Some(fee) = self.amino_fee_override.lock().unwrap().clone() {
            sign_doc.fee = fee;
        }
        Ok(AminoSignResponse {
            signed: sign_doc,
            signature: Self::signature(),
        })
    }

    fn direct(&self, sign_doc: SignDoc) -> Result<DirectSignResponse, WalletError> {
        if !self.capabilities.direct {
            return Err(WalletError::UnsupportedSigningMode);
        }
        self.direct_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(WalletError::Rejected(reason));
        }
        Ok(DirectSignResponse {
            signed: sign_doc,
            signature: Self::signature(),
        })
    }
}

#[async_trait]
impl OfflineSigner for FakeSigner {
    fn capabilities(&self) -> SignCapabilities {
        self.capabilities
    }

    async fn get_accounts(&self) -> Result<Vec<AccountData>, WalletError> {
        Ok(self.accounts.clone())
    }

    async fn sign_amino(
        &self,
        _signer_address: &str,
        sign_doc: StdSignDoc,
    ) -> Result<AminoSignResponse, WalletError> {
        self.amino(sign_doc)
    }

    async fn sign_direct(
        &self,
        _signer_address: &str,
        sign_doc: SignDoc,
    ) -> Result<DirectSignResponse, WalletError> {
        self.direct(sign_doc)
    }
}

#[async_trait]
impl WalletClient for FakeSigner {
    fn capabilities(&self) -> SignCapabilities {
        self.capabilities
    }

    async fn sign_amino(
        &self,
        _chain_id: &str,
        _signer_address: &str,
        sign_doc: StdSignDoc,
        _options: &SignOptions,
    ) -> Result<AminoSignResponse, WalletError> {
        self.amino(sign_doc)
    }

    async fn sign_direct(
        &self,
        _chain_id: &str,
        _signer_address: &str,
        sign_doc: SignDoc,
        _options: &SignOptions,
    ) -> Result<DirectSignResponse, WalletError> {
        self.direct(sign_doc)
    }
}

pub struct FakeWallet {
    pub name: String,
    pub chain_id: String,
    pub address: Option<String>,
    pub status: WalletStatus,
    pub rest: Option<String>,
    pub rpc: Option<String>,
    pub sign_options: SignOptions,
    pub client: Option<Arc<FakeSigner>>,
    pub offline: Arc<FakeSigner>,
    pub init_fails: bool,
    pub initialized: AtomicBool,
    pub supported: bool,
    pub support_fails: bool,
    pub support_calls: AtomicUsize,
    pub error_matcher: Option<fn(&str) -> Option<WalletError>>,
}

impl FakeWallet {
    pub fn new(offline: SignCapabilities) -> Self {
        Self {
            name: "fake".to_string(),
            chain_id: CHAIN_ID.to_string(),
            address: Some(ADDRESS.to_string()),
            status: WalletStatus::Connected,
            rest: Some(REST.to_string()),
            rpc: Some(RPC.to_string()),
            sign_options: SignOptions::default(),
            client: None,
            offline: Arc::new(FakeSigner::new(offline)),
            init_fails: false,
            initialized: AtomicBool::new(false),
            supported: true,
            support_fails: false,
            support_calls: AtomicUsize::new(0),
            error_matcher: None,
        }
    }

    pub fn with_client(mut self, capabilities: SignCapabilities) -> Self {
        self.client = Some(Arc::new(FakeSigner::new(capabilities)));
        self
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    fn wallet_name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    fn address(&self) -> Option<String> {
        self.address.clone()
    }

    fn status(&self) -> WalletStatus {
        self.status
    }

    fn rest_endpoint(&self) -> Option<String> {
        self.rest.clone()
    }

    fn rpc_endpoint(&self) -> Option<String> {
        self.rpc.clone()
    }

    fn sign_options(&self) -> SignOptions {
        self.sign_options.clone()
    }

    fn client(&self) -> Option<Arc<dyn WalletClient>> {
        self.client
            .clone()
            .map(|client| client as Arc<dyn WalletClient>)
    }

    fn offline_signer(&self) -> Option<Arc<dyn OfflineSigner>> {
        if self.initialized.load(Ordering::SeqCst) {
            Some(self.offline.clone() as Arc<dyn OfflineSigner>)
        } else {
            None
        }
    }

    async fn init_offline_signer(&self) -> Result<(), WalletError> {
        if !self.init_fails {
            self.initialized.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn supports_chain(&self, _chain_id: &str) -> Result<bool, WalletError> {
        self.support_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.support_fails {
            return Err(WalletError::Backend("chain registry unavailable".to_string()));
        }
        Ok(self.supported)
    }

    fn match_error(&self, message: &str) -> Option<WalletError> {
        self.error_matcher.and_then(|matcher| matcher(message))
    }
}

#[derive(Default)]
pub struct FakeWallets(pub HashMap<String, Arc<FakeWallet>>);

impl FakeWallets {
    pub fn with(wallet: FakeWallet) -> (Self, Arc<FakeWallet>) {
        let wallet = Arc::new(wallet);
        let mut wallets = HashMap::new();
        wallets.insert(wallet.chain_id.clone(), wallet.clone());
        (Self(wallets), wallet)
    }
}

impl WalletProvider for FakeWallets {
    fn wallet(&self, chain_id: &str) -> Option<Arc<dyn Wallet>> {
        self.0
            .get(chain_id)
            .cloned()
            .map(|wallet| wallet as Arc<dyn Wallet>)
    }
}

/// Tracer answering every trace with a canned result.
#[derive(Default)]
pub struct FakeTracerConnector {
    pub result: Mutex<Option<Value>>,
    pub connects: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub traced: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakeTracerConnector {
    pub fn resolving(result: Value) -> Self {
        Self {
            result: Mutex::new(Some(result)),
            ..Self::default()
        }
    }
}

struct FakeTracer {
    result: Option<Value>,
    closed: Arc<AtomicUsize>,
    traced: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl TxTracer for FakeTracer {
    async fn trace_tx(&mut self, tx_hash: &[u8]) -> Result<Value, ConfirmationError> {
        self.traced.lock().unwrap().push(tx_hash.to_vec());
        self.result.clone().ok_or(ConfirmationError::Closed)
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TracerConnector for FakeTracerConnector {
    async fn connect(&self, _rpc_endpoint: &str) -> Result<Box<dyn TxTracer>, ConfirmationError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTracer {
            result: self.result.lock().unwrap().clone(),
            closed: self.closed.clone(),
            traced: self.traced.clone(),
        }))
    }
}

/// Records hook invocations and balance refreshes in order.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl TxEventHooks for EventLog {
    fn on_broadcasted(&self, chain_id: &str, tx_hash: &[u8]) {
        self.push(format!("hook:broadcasted:{}:{}", chain_id, hex::encode(tx_hash)));
    }

    fn on_fulfill(&self, chain_id: &str, tx: &DeliverTxResponse) {
        self.push(format!("hook:fulfill:{}:{}", chain_id, tx.code));
    }

    fn on_broadcast_failed(&self, chain_id: &str, error: &TxError) {
        self.push(format!("hook:failed:{}:{}", chain_id, error));
    }
}

#[async_trait]
impl BalanceRefresher for EventLog {
    async fn refresh_balance(&self, chain_id: &str, address: &str, denom: &str) {
        self.push(format!("refresh:{}:{}:{}", chain_id, address, denom));
    }
}
