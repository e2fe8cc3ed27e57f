//! # Biovault
//!
//! Encrypted biometric template vault: authenticated encryption, per-record
//! key derivation, tamper detection, and secure erasure for biometric
//! feature data.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       BIOVAULT                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────┐   │
//! │  │  TEMPLATE    │  │  CODEC       │  │  STORE        │   │
//! │  │  validated   │─▶│  AES-256-GCM │─▶│  id + owner   │   │
//! │  │  plaintext   │◀─│  PBKDF2 keys │◀─│  indexes      │   │
//! │  └──────────────┘  └──────┬───────┘  └───────────────┘   │
//! │                           │                              │
//! │  ┌────────────────────────┴───────────────────────────┐  │
//! │  │                    KEY CONTEXT                     │  │
//! │  │   biometric / contact_info / session root keys     │  │
//! │  │   salts, nonces, iteration policy, rotation        │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Templates are validated at construction; nothing invalid reaches the cipher
//! - Every record gets its own PBKDF2-derived key, salt, and nonce
//! - AES-256-GCM tag covers the full canonical template; the owner id is
//!   bound in as associated data
//! - Decryption fails closed; there is no alternate-key retry
//! - Deletion overwrites the envelope before dropping it (best-effort)
//! - Plaintext and derived keys are zeroized on drop
//!
//! ## Example
//!
//! ```
//! use biovault::{BiometricTemplate, KeyContext, TemplateKind, TemplateStore};
//! use uuid::Uuid;
//!
//! let store = TemplateStore::new(KeyContext::generate());
//!
//! let template = BiometricTemplate::new(
//!     Uuid::new_v4(),
//!     TemplateKind::FacialRecognition,
//!     vec![0x5a; 256],
//!     0.95,
//!     "arcface_v2",
//! )?;
//!
//! let id = store.put(&template)?;
//! let decrypted = store.get(id)?;
//! assert_eq!(decrypted.feature_vector, template.feature_vector);
//!
//! assert!(store.delete(id));
//! # Ok::<(), biovault::BioVaultError>(())
//! ```

pub mod crypto;
pub mod error;
pub mod record;
pub mod store;
pub mod template;

pub use crypto::{
    decrypt_template, encrypt_template, secure_erase, verify_integrity, KeyContext, KeyDomain,
    KeyProvider, RootKey,
};
pub use error::{BioVaultError, BioVaultResult};
pub use record::SecureRecord;
pub use store::{StoreStats, TemplateStore};
pub use template::{BiometricTemplate, TemplateKind};

/// Biovault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
