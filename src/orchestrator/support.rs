use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::chain::Wallet;

type SupportCheck = Shared<BoxFuture<'static, Result<bool, String>>>;

/// Memoized `supports_chain` answers, one check per wallet and chain. Callers arriving
/// while a check runs await the same check. Failed checks are forgotten.
#[derive(Default)]
pub struct SupportChecks {
    checks: Mutex<HashMap<String, SupportCheck>>,
}

impl SupportChecks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SupportCheck>> {
        match self.checks.lock() {
            Ok(checks) => checks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub async fn supports(&self, wallet: Arc<dyn Wallet>, chain_id: &str) -> bool {
        let key = format!("{}_{}", wallet.wallet_name(), chain_id);

        let check = self
            .lock()
            .entry(key.clone())
            .or_insert_with(|| {
                let chain_id = chain_id.to_string();
                async move {
                    wallet
                        .supports_chain(&chain_id)
                        .await
                        .map_err(|e| e.to_string())
                }
                .boxed()
                .shared()
            })
            .clone();

        match check.clone().await {
            Ok(supported) => supported,
            Err(e) => {
                log::warn!("Chain support check {} failed: {}", key, e);
                self.forget(&key, &check);
                false
            }
        }
    }

    /// Drops `check` unless a newer one has already replaced it.
    fn forget(&self, key: &str, check: &SupportCheck) {
        let mut checks = self.lock();
        if checks.get(key).is_some_and(|current| current.ptr_eq(check)) {
            checks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::SignCapabilities;
    use crate::testing::FakeWallet;
    use std::sync::atomic::Ordering;

    fn failed_check() -> SupportCheck {
        async { Err::<bool, String>("unreachable".to_string()) }.boxed().shared()
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_check() {
        let wallet = Arc::new(FakeWallet::new(SignCapabilities::BOTH));
        let checks = SupportChecks::new();

        let (a, b) = tokio::join!(
            checks.supports(wallet.clone(), "juno-1"),
            checks.supports(wallet.clone(), "juno-1")
        );
        assert!(a && b);
        assert!(checks.supports(wallet.clone(), "juno-1").await);
        assert_eq!(wallet.support_calls.load(Ordering::SeqCst), 1);

        checks.supports(wallet.clone(), "stargaze-1").await;
        assert_eq!(wallet.support_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_check_is_retried() {
        let mut wallet = FakeWallet::new(SignCapabilities::BOTH);
        wallet.support_fails = true;
        let wallet = Arc::new(wallet);
        let checks = SupportChecks::new();

        let (a, b) = tokio::join!(
            checks.supports(wallet.clone(), "juno-1"),
            checks.supports(wallet.clone(), "juno-1")
        );
        assert!(!a && !b);
        assert_eq!(wallet.support_calls.load(Ordering::SeqCst), 1);
        assert!(checks.lock().is_empty());

        assert!(!checks.supports(wallet.clone(), "juno-1").await);
        assert_eq!(wallet.support_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_failure_keeps_newer_check() {
        let checks = SupportChecks::new();
        let stale = failed_check();
        let newer: SupportCheck = async { Ok(true) }.boxed().shared();
        checks.lock().insert("fake_juno-1".to_string(), newer.clone());

        checks.forget("fake_juno-1", &stale);
        assert!(checks.lock()["fake_juno-1"].ptr_eq(&newer));

        checks.forget("fake_juno-1", &newer);
        assert!(checks.lock().is_empty());
    }
}
