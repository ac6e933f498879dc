use std::sync::Arc;

use crate::chain::ChainApi;

/// Blocks after the latest height at which a signed transaction expires.
pub const NEXT_TX_TIMEOUT_HEIGHT_OFFSET: u64 = 75;

/// Timeout height that disables expiry.
pub const TIMEOUT_HEIGHT_DISABLED: u64 = 0;

#[derive(Clone)]
pub struct TimeoutHeightResolver {
    api: Arc<dyn ChainApi>,
}

impl TimeoutHeightResolver {
    pub fn new(api: Arc<dyn ChainApi>) -> Self {
        Self { api }
    }

    /// Latest height plus [`NEXT_TX_TIMEOUT_HEIGHT_OFFSET`]. Any failure disables the timeout
    /// instead of failing the transaction.
    pub async fn resolve(&self, rpc_endpoint: Option<&str>) -> u64 {
        let Some(rpc) = rpc_endpoint.filter(|rpc| !rpc.is_empty()) else {
            return TIMEOUT_HEIGHT_DISABLED;
        };

        let latest = match self.api.latest_block_height(rpc).await {
            Ok(Some(height)) => height,
            Ok(None) => return TIMEOUT_HEIGHT_DISABLED,
            Err(e) => {
                log::warn!("Chain status unavailable, timeout height disabled: {}", e);
                return TIMEOUT_HEIGHT_DISABLED;
            }
        };

        match latest.parse::<u64>() {
            Ok(TIMEOUT_HEIGHT_DISABLED) => TIMEOUT_HEIGHT_DISABLED,
            Ok(height) => height.saturating_add(NEXT_TX_TIMEOUT_HEIGHT_OFFSET),
            Err(_) => {
                log::warn!("Unparsable latest block height {:?}", latest);
                TIMEOUT_HEIGHT_DISABLED
            }
        }
    }
}
