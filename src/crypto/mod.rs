//! Biovault - Cryptographic Core
//!
//! Key management ([`keys`]) and the stateless template codec ([`codec`]).

pub mod codec;
pub mod keys;

pub use codec::{
    decrypt_template, derive_record_key, encrypt_template, secure_erase, verify_integrity,
};
pub use keys::{
    KeyContext, KeyDomain, KeyProvider, RootKey, AEAD_ALGORITHM, DEFAULT_SALT_LEN,
    KDF_ALGORITHM, KEY_LEN, MIN_ITERATIONS, NONCE_LEN, TAG_LEN,
};
