use bech32::Hrp;
use bip32::{ChildNumber, XPrv};
use bip39::Mnemonic;
use ripemd::Ripemd160;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::WalletError;

/// Cosmos Hub HD path m/44'/118'/0'/0/0
const COSMOS_HD_PATH: [(u32, bool); 5] = [(44, true), (118, true), (0, true), (0, false), (0, false)];

/// Mnemonic derived secp256k1 key.
/// Implements BIP32 HD derivation and zeroizes the secret on drop.
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct LocalKey {
    #[zeroize(skip)]
    pub address: String,

    private_key_bytes: [u8; 32],
    public_key_bytes: [u8; 33],
}

impl LocalKey {
    /// Create a key from a BIP39 mnemonic phrase, optional passphrase and bech32 prefix.
    pub fn from_mnemonic(
        mnemonic_str: &str,
        passphrase: &str,
        prefix: &str,
    ) -> Result<Self, WalletError> {
        let mnemonic = Mnemonic::parse(mnemonic_str)
            .map_err(|e| WalletError::Backend(format!("invalid mnemonic: {}", e)))?;
        let seed = mnemonic.to_seed(passphrase);

        let mut private_key = derive_private_key_bip32(&seed)?;

        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(&private_key)
            .map_err(|e| WalletError::Backend(format!("invalid private key: {}", e)))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        let public_key_bytes = public_key.serialize();

        let address = bech32_address(prefix, &public_key_bytes)?;

        let mut private_key_bytes = [0u8; 32];
        private_key_bytes.copy_from_slice(&private_key);
        private_key.zeroize();

        Ok(Self {
            address,
            private_key_bytes,
            public_key_bytes,
        })
    }

    /// Note: Caller is responsible for secure handling
    pub fn private_key(&self) -> Result<SecretKey, WalletError> {
        SecretKey::from_slice(&self.private_key_bytes)
            .map_err(|e| WalletError::Backend(format!("invalid private key: {}", e)))
    }

    /// Compressed public key (33 bytes)
    pub fn public_key_compressed(&self) -> [u8; 33] {
        self.public_key_bytes
    }
}

fn derive_private_key_bip32(seed: &[u8]) -> Result<[u8; 32], WalletError> {
    let derive_err = |e: bip32::Error| WalletError::Backend(format!("key derivation failed: {}", e));

    let mut xprv = XPrv::new(seed).map_err(derive_err)?;
    for (index, hardened) in COSMOS_HD_PATH {
        let child = ChildNumber::new(index, hardened).map_err(derive_err)?;
        xprv = xprv.derive_child(child).map_err(derive_err)?;
    }

    Ok(xprv.to_bytes())
}

/// bech32(prefix, ripemd160(sha256(compressed pubkey)))
pub fn bech32_address(prefix: &str, compressed_pubkey: &[u8]) -> Result<String, WalletError> {
    let sha = Sha256::digest(compressed_pubkey);
    let hash = Ripemd160::digest(sha);

    let hrp = Hrp::parse(prefix)
        .map_err(|e| WalletError::Backend(format!("invalid bech32 prefix {}: {}", prefix, e)))?;
    bech32::encode::<bech32::Bech32>(hrp, &hash)
        .map_err(|e| WalletError::Backend(format!("bech32 encoding failed: {}", e)))
}
