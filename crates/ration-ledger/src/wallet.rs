//! Addresses and signing authorities.
//!
//! Addresses are base58-encoded Ed25519 public keys; an [`Authority`] is
//! the keypair that signs mints and transfers. Malformed key material maps
//! to [`LedgerError::Configuration`], malformed addresses to
//! [`LedgerError::InvalidWallet`].

use crate::error::{LedgerError, Result};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A base58-encoded 32-byte ledger address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parse an address from a base58-encoded string.
    ///
    /// This is the well-formedness check distribution uses to decide
    /// whether a recipient's stored wallet address is usable.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidWallet`] if the string is not valid
    /// base58 or does not decode to 32 bytes.
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| LedgerError::invalid_wallet(format!("invalid base58: {e}")))?;

        if bytes.len() != 32 {
            return Err(LedgerError::invalid_wallet(format!(
                "address must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// Create an address from a 32-byte array. Infallible; used for
    /// derived addresses where the input length is fixed.
    #[must_use]
    pub fn from_array(bytes: [u8; 32]) -> Self {
        Self(bs58::encode(bytes).into_string())
    }

    /// Create an address from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidWallet`] if not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            LedgerError::invalid_wallet(format!("address must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_array(array))
    }

    /// Get the base58-encoded address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the raw bytes of the address.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        bs58::decode(&self.0).into_vec().unwrap_or_default()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A signing authority (Ed25519 keypair).
///
/// Used as mint authority and as the administrator that funds transfers.
pub struct Authority {
    signing_key: SigningKey,
    address: Address,
}

impl Authority {
    /// Generate a new random authority.
    ///
    /// Uses `OsRng` directly so key material comes from the operating
    /// system's CSPRNG rather than a userspace PRNG.
    ///
    /// # Errors
    ///
    /// Returns error if key derivation fails.
    pub fn generate() -> Result<Self> {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        Self::from_secret_key(&secret_bytes)
    }

    /// Create an authority from a 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if the key is malformed.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let secret_array: [u8; 32] = secret.try_into().map_err(|_| {
            LedgerError::configuration(format!(
                "secret key must be 32 bytes, got {}",
                secret.len()
            ))
        })?;

        let signing_key = SigningKey::from_bytes(&secret_array);
        let address = Address::from_array(signing_key.verifying_key().to_bytes());

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Create an authority from a base58-encoded secret key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if the key is malformed.
    pub fn from_base58_secret(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret)
            .into_vec()
            .map_err(|e| LedgerError::configuration(format!("invalid base58 secret: {e}")))?;
        Self::from_secret_key(&bytes)
    }

    /// Load an authority from a JSON keypair file (Solana CLI format:
    /// 64 bytes, secret followed by public).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if the file is missing or
    /// malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            LedgerError::configuration(format!("cannot read keypair file: {e}"))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| LedgerError::configuration(format!("malformed keypair file: {e}")))?;

        if bytes.len() != 64 {
            return Err(LedgerError::configuration(format!(
                "keypair file must contain 64 bytes, got {}",
                bytes.len()
            )));
        }

        Self::from_secret_key(&bytes[..32])
    }

    /// Save the authority to a JSON keypair file (Solana CLI format).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut bytes = Vec::with_capacity(64);
        bytes.extend_from_slice(self.signing_key.as_bytes());
        bytes.extend_from_slice(self.signing_key.verifying_key().as_bytes());

        let json = serde_json::to_string(&bytes)
            .map_err(|e| LedgerError::configuration(format!("cannot serialize keypair: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| LedgerError::configuration(format!("cannot write keypair file: {e}")))?;
        Ok(())
    }

    /// Get the authority's address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sign a message, returning the raw 64-byte signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authority")
            .field("address", &self.address)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
