use dashmap::DashMap;

/// Per-chain label of the transaction currently outstanding.
#[derive(Debug, Default)]
pub struct InFlightTxs {
    txs: DashMap<String, String>,
}

impl InFlightTxs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tx_type(&self, chain_id: &str) -> Option<String> {
        self.txs.get(chain_id).map(|entry| entry.value().clone())
    }

    pub fn is_idle(&self, chain_id: &str) -> bool {
        !self.txs.contains_key(chain_id)
    }

    /// Marks `chain_id` busy until the returned guard is cleared or dropped.
    pub fn begin(&self, chain_id: &str, tx_type: &str) -> InFlightGuard<'_> {
        self.txs.insert(chain_id.to_string(), tx_type.to_string());
        InFlightGuard {
            txs: self,
            chain_id: chain_id.to_string(),
            cleared: false,
        }
    }
}

/// Clears its chain's entry exactly once, at the latest on drop.
pub struct InFlightGuard<'a> {
    txs: &'a InFlightTxs,
    chain_id: String,
    cleared: bool,
}

impl InFlightGuard<'_> {
    pub fn clear(&mut self) {
        if !self.cleared {
            self.txs.txs.remove(&self.chain_id);
            self.cleared = true;
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_clears_once() {
        let txs = InFlightTxs::new();
        {
            let mut guard = txs.begin("osmosis-1", "send");
            assert_eq!(txs.tx_type("osmosis-1").as_deref(), Some("send"));
            assert!(txs.is_idle("juno-1"));

            guard.clear();
            assert!(txs.is_idle("osmosis-1"));

            txs.begin("juno-1", "delegate");
            // Dropped immediately
            assert!(txs.is_idle("juno-1"));
        }
        assert!(txs.is_idle("osmosis-1"));
    }
}
