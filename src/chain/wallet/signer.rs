use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

use crate::error::WalletError;

/// Cosmos secp256k1 signing: sha256 of the sign bytes, 64 byte compact (r || s)
/// signature, low-S normalized.
pub struct TransactionSigner {
    secp: Secp256k1<secp256k1::All>,
}

impl TransactionSigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    pub fn sign_bytes(
        &self,
        sign_bytes: &[u8],
        private_key: &SecretKey,
    ) -> Result<[u8; 64], WalletError> {
        let message = digest(sign_bytes)?;
        let mut signature = self.secp.sign_ecdsa(&message, private_key);
        signature.normalize_s();
        Ok(signature.serialize_compact())
    }

    pub fn verify(&self, sign_bytes: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let (Ok(message), Ok(signature), Ok(public_key)) = (
            digest(sign_bytes),
            Signature::from_compact(signature),
            PublicKey::from_slice(public_key),
        ) else {
            return false;
        };
        self.secp.verify_ecdsa(&message, &signature, &public_key).is_ok()
    }
}

impl Default for TransactionSigner {
    fn default() -> Self {
        Self::new()
    }
}

fn digest(sign_bytes: &[u8]) -> Result<Message, WalletError> {
    let hash = Sha256::digest(sign_bytes);
    Message::from_digest_slice(&hash).map_err(|e| WalletError::Backend(e.to_string()))
}
