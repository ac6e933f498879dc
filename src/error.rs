//! Error taxonomy for the transaction pipeline.
//!
//! Each pipeline stage has its own error enum so callers can tell a wallet problem from a
//! node that refused the transaction. [`TxError`] is what the orchestrator hands back.

use thiserror::Error;

/// Failures of an HTTP call against a node or a proxy in front of one.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The endpoint answered with a non-success status. `code` and `message` come from the
    /// `{ code, message }` error body cosmos REST gateways return, when present.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet for chain {0} is not provided.")]
    NotProvided(String),

    #[error("Wallet for chain {0} is not connected.")]
    NotConnected(String),

    #[error("Offline signer failed to initialize")]
    SignerInitFailed,

    #[error("Failed to retrieve account from signer")]
    AccountMismatch,

    #[error("Neither amino nor direct signing is available in wallet")]
    UnsupportedSigningMode,

    #[error("Wallet connection is already in progress")]
    ConnectionInProgress,

    #[error("Request rejected by wallet: {0}")]
    Rejected(String),

    #[error("Wallet error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("Account '{0}' does not exist on chain. Send some tokens there before trying to query sequence.")]
    AccountNotFound(String),

    #[error("Address is not provided")]
    MissingAddress,

    #[error("Endpoint is not provided")]
    MissingEndpoint,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors of the gas price / fee amount resolver.
#[derive(Debug, Error)]
pub enum FeeError {
    #[error("Chain ({0}) not found")]
    ChainNotFound(String),

    #[error("Chain ({0}) has no fee currency configured")]
    NoFeeCurrency(String),

    #[error("Invalid gas limit: {0}")]
    InvalidGasLimit(String),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid integer gas: {0}")]
    InvalidGasValue(String),

    /// The node ran the simulation and the transaction failed; `message` is the node's own.
    #[error("{message}")]
    Chain { code: i64, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Msg(#[from] MsgError),
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Broadcasting transaction failed with code {code} (codespace: {codespace}). Log: {raw_log}")]
    Rejected {
        code: u32,
        codespace: String,
        raw_log: String,
        tx_hash: String,
    },

    #[error("REST endpoint is not provided")]
    MissingEndpoint,

    #[error("Invalid tx hash in broadcast response: {0}")]
    InvalidHash(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Transport level failures while waiting for inclusion. A transaction that was included
/// but failed execution is not an error here, it comes back as a result with non-zero code.
#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("RPC endpoint is not provided")]
    MissingEndpoint,

    #[error("Invalid RPC endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Websocket connection failed: {0}")]
    Connection(String),

    #[error("Subscription failed: {0}")]
    Subscription(String),

    #[error("Websocket closed before the transaction was included")]
    Closed,
}

#[derive(Debug, Error)]
pub enum MsgError {
    #[error("Unregistered type url: {0}")]
    UnknownTypeUrl(String),

    #[error("Unregistered amino type: {0}")]
    UnknownAminoType(String),

    #[error("Invalid value for {type_url}: {reason}")]
    InvalidValue { type_url: String, reason: String },
}

impl MsgError {
    pub(crate) fn invalid(type_url: &str, reason: impl std::fmt::Display) -> Self {
        MsgError::InvalidValue {
            type_url: type_url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Error returned by a sign-and-broadcast attempt.
#[derive(Debug, Error)]
pub enum TxError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),

    #[error(transparent)]
    Msg(#[from] MsgError),

    #[error("There is no msg to send")]
    NoMessages,

    #[error("Address is required to estimate fee. Try connect to fetch address.")]
    AddressRequired,

    #[error("Chain ID is not provided")]
    ChainIdMissing,

    #[error("Invalid amino sign response: {0}")]
    InvalidSignResponse(String),
}

impl TxError {
    /// Raw log of a broadcast the node rejected at check time.
    pub fn broadcast_raw_log(&self) -> Option<&str> {
        match self {
            TxError::Broadcast(BroadcastError::Rejected { raw_log, .. }) => Some(raw_log),
            _ => None,
        }
    }
}
