use std::sync::Arc;

use crate::chain::{BroadcastMode, ChainApi};
use crate::error::BroadcastError;

/// Submits signed transaction bytes and returns the transaction hash.
#[derive(Clone)]
pub struct Broadcaster {
    api: Arc<dyn ChainApi>,
}

impl Broadcaster {
    pub fn new(api: Arc<dyn ChainApi>) -> Self {
        Self { api }
    }

    /// A response with a non-zero code means the node refused the transaction at check
    /// time. It never reached a block, so there is nothing to confirm.
    pub async fn broadcast(
        &self,
        rest_endpoint: Option<&str>,
        tx_bytes: &[u8],
    ) -> Result<Vec<u8>, BroadcastError> {
        let rest = rest_endpoint
            .filter(|rest| !rest.is_empty())
            .ok_or(BroadcastError::MissingEndpoint)?;

        let response = self.api.broadcast(rest, tx_bytes, BroadcastMode::Sync).await?;

        if response.code != 0 {
            log::error!(
                "Transaction {} rejected with code {} ({}): {}",
                response.txhash,
                response.code,
                response.codespace,
                response.raw_log
            );
            return Err(BroadcastError::Rejected {
                code: response.code,
                codespace: response.codespace,
                raw_log: response.raw_log,
                tx_hash: response.txhash,
            });
        }

        let tx_hash = hex::decode(&response.txhash)
            .map_err(|_| BroadcastError::InvalidHash(response.txhash.clone()))?;
        log::info!("Transaction broadcast: {}", response.txhash);
        Ok(tx_hash)
    }
}
