use std::sync::Arc;

use crate::chain::{AccountInfo, ChainApi, Wallet};
use crate::error::SequenceError;

/// Fetches account number and sequence right before use. Nothing is cached: a stale
/// sequence is the usual cause of "account sequence mismatch" rejections.
#[derive(Clone)]
pub struct SequenceResolver {
    api: Arc<dyn ChainApi>,
}

impl SequenceResolver {
    pub fn new(api: Arc<dyn ChainApi>) -> Self {
        Self { api }
    }

    pub async fn resolve(&self, wallet: &dyn Wallet) -> Result<AccountInfo, SequenceError> {
        let address = wallet.address().ok_or(SequenceError::MissingAddress)?;
        let rest = wallet
            .rest_endpoint()
            .filter(|rest| !rest.is_empty())
            .ok_or(SequenceError::MissingEndpoint)?;

        let account = self
            .api
            .account(&rest, &address)
            .await?
            .ok_or_else(|| SequenceError::AccountNotFound(address.clone()))?;

        log::debug!(
            "Account {}: number {}, sequence {}",
            address,
            account.account_number,
            account.sequence
        );
        Ok(account)
    }
}
