//! Biovault - Key Context
//!
//! Holds the three domain-scoped 32-byte root keys (biometric, contact-info,
//! session) and the derivation/AEAD parameters, and hands out fresh salts
//! and nonces. Root keys are never used for encryption directly; the codec
//! derives a one-time per-record key from them.

use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::error::{BioVaultError, BioVaultResult};

/// Key length for AES-256
pub const KEY_LEN: usize = 32;

/// Nonce length for AES-GCM (96 bits)
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Default per-record salt length
pub const DEFAULT_SALT_LEN: usize = 32;

/// Minimum PBKDF2 iteration count
pub const MIN_ITERATIONS: u32 = 100_000;

/// AEAD algorithm identifier stored in every record
pub const AEAD_ALGORITHM: &str = "AES-256-GCM";

/// Key derivation algorithm identifier stored in every record
pub const KDF_ALGORITHM: &str = "PBKDF2-HMAC-SHA256";

/// Key domains with independent root keys
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyDomain {
    /// Biometric template encryption
    Biometric,
    /// Contact information encryption
    ContactInfo,
    /// Session token protection
    Session,
}

impl KeyDomain {
    /// Domain name as used in error messages and key provisioning
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyDomain::Biometric => "biometric",
            KeyDomain::ContactInfo => "contact_info",
            KeyDomain::Session => "session",
        }
    }
}

/// Secure root key wrapper with automatic zeroization
#[derive(Clone)]
pub struct RootKey {
    inner: Secret<[u8; KEY_LEN]>,
}

impl RootKey {
    /// Create a root key from bytes
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            inner: Secret::new(bytes),
        }
    }

    /// Create a root key from a slice, validating its length
    pub fn from_slice(domain: KeyDomain, bytes: &[u8]) -> BioVaultResult<Self> {
        let arr: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| BioVaultError::InvalidKeyLength {
                    domain: domain.as_str(),
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self::new(arr))
    }

    /// Expose the key bytes (use with caution)
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        self.inner.expose_secret()
    }

    /// Generate a random root key
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(bytes)
    }
}

/// External source of root key material.
///
/// The implementation is opaque to the vault core: environment variables,
/// a secret store, an HSM. Failures surface as configuration errors.
pub trait KeyProvider {
    /// Return the 32-byte root key for a domain
    fn root_key(&self, domain: KeyDomain) -> BioVaultResult<[u8; KEY_LEN]>;
}

/// Root keys exported as hex strings for deployment provisioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedKeys {
    pub biometric: String,
    pub contact_info: String,
    pub session: String,
}

/// Domain-scoped root keys plus derivation and AEAD parameters.
///
/// Constructor-injected into the store that owns it; no global instance.
pub struct KeyContext {
    biometric_key: RootKey,
    contact_info_key: RootKey,
    session_key: RootKey,
    salt_len: usize,
    iterations: u32,
}

impl KeyContext {
    /// Create a context with freshly generated random root keys
    pub fn generate() -> Self {
        Self {
            biometric_key: RootKey::generate(),
            contact_info_key: RootKey::generate(),
            session_key: RootKey::generate(),
            salt_len: DEFAULT_SALT_LEN,
            iterations: MIN_ITERATIONS,
        }
    }

    /// Create a context from an external key provider
    pub fn from_provider(provider: &dyn KeyProvider) -> BioVaultResult<Self> {
        Ok(Self {
            biometric_key: RootKey::new(provider.root_key(KeyDomain::Biometric)?),
            contact_info_key: RootKey::new(provider.root_key(KeyDomain::ContactInfo)?),
            session_key: RootKey::new(provider.root_key(KeyDomain::Session)?),
            salt_len: DEFAULT_SALT_LEN,
            iterations: MIN_ITERATIONS,
        })
    }

    /// Import root keys provisioned as hex strings
    pub fn from_hex(
        biometric: &str,
        contact_info: &str,
        session: &str,
    ) -> BioVaultResult<Self> {
        Ok(Self {
            biometric_key: decode_key(KeyDomain::Biometric, biometric)?,
            contact_info_key: decode_key(KeyDomain::ContactInfo, contact_info)?,
            session_key: decode_key(KeyDomain::Session, session)?,
            salt_len: DEFAULT_SALT_LEN,
            iterations: MIN_ITERATIONS,
        })
    }

    /// Override the PBKDF2 iteration count (floor enforced)
    pub fn with_iterations(mut self, iterations: u32) -> BioVaultResult<Self> {
        if iterations < MIN_ITERATIONS {
            return Err(BioVaultError::WeakIterationCount(iterations));
        }
        self.iterations = iterations;
        Ok(self)
    }

    /// Override the per-record salt length
    pub fn with_salt_len(mut self, salt_len: usize) -> Self {
        self.salt_len = salt_len;
        self
    }

    /// Root key for a domain
    pub fn key_for(&self, domain: KeyDomain) -> &RootKey {
        match domain {
            KeyDomain::Biometric => &self.biometric_key,
            KeyDomain::ContactInfo => &self.contact_info_key,
            KeyDomain::Session => &self.session_key,
        }
    }

    /// PBKDF2 iteration count
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Generate a fresh random salt for per-record key derivation
    pub fn generate_salt(&self) -> Vec<u8> {
        let mut salt = vec![0u8; self.salt_len];
        rand::thread_rng().fill_bytes(&mut salt);
        salt
    }

    /// Generate a fresh random AES-GCM nonce
    pub fn generate_nonce(&self) -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }

    /// Rotate all root keys atomically.
    ///
    /// One-way and destructive: records encrypted under the prior keys can
    /// no longer be decrypted. There is no alternate-key fallback anywhere
    /// in the codec.
    pub fn rotate(&mut self) {
        self.biometric_key = RootKey::generate();
        self.contact_info_key = RootKey::generate();
        self.session_key = RootKey::generate();
        log::info!("Root keys rotated for all domains");
    }

    /// Export root keys as hex strings for deployment configuration.
    ///
    /// Handle the result like key material, because it is.
    pub fn export_hex(&self) -> ExportedKeys {
        ExportedKeys {
            biometric: hex::encode(self.biometric_key.expose()),
            contact_info: hex::encode(self.contact_info_key.expose()),
            session: hex::encode(self.session_key.expose()),
        }
    }
}

fn decode_key(domain: KeyDomain, key_hex: &str) -> BioVaultResult<RootKey> {
    let bytes = hex::decode(key_hex).map_err(|e| BioVaultError::InvalidKeyFormat {
        domain: domain.as_str(),
        reason: e.to_string(),
    })?;
    RootKey::from_slice(domain, &bytes)
}
