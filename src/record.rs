//! Biovault - Encrypted Record Envelope
//!
//! [`SecureRecord`] is the at-rest form of a biometric template: the
//! AES-256-GCM ciphertext plus everything needed to decrypt it again
//! (nonce, tag, per-record salt) and the lifecycle timestamps. Its serde
//! field layout is the only cross-version compatibility surface a durable
//! backing store depends on, so it must remain stable.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Encrypted biometric record.
///
/// The four sensitive buffers (ciphertext, nonce, tag, salt) are jointly
/// populated by [`crate::crypto::encrypt_template`] and jointly cleared by
/// [`crate::crypto::secure_erase`]; there is no state with only some of
/// them present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecureRecord {
    /// Unique record identifier
    pub record_id: Uuid,
    /// Owner of the underlying template (immutable after creation)
    pub owner_id: Uuid,
    /// AEAD ciphertext (tag stored separately)
    pub ciphertext: Vec<u8>,
    /// AES-GCM nonce, unique per encryption
    pub nonce: Vec<u8>,
    /// GCM authentication tag
    pub tag: Vec<u8>,
    /// Per-record salt used for key derivation
    pub salt: Vec<u8>,
    /// AEAD algorithm identifier
    pub encryption_algorithm: String,
    /// Key derivation algorithm identifier
    pub key_derivation_algorithm: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last successful decrypt/verify, if any
    pub last_accessed: Option<DateTime<Utc>>,
}

impl SecureRecord {
    /// Whether this record has been securely erased
    pub fn is_erased(&self) -> bool {
        self.ciphertext.is_empty()
            && self.nonce.is_empty()
            && self.tag.is_empty()
            && self.salt.is_empty()
    }

    /// Total storage size of the encrypted components in bytes.
    ///
    /// Note: ciphertext length approximates the plaintext feature-vector
    /// size, a residual side channel the envelope does not hide.
    pub fn storage_size(&self) -> usize {
        self.ciphertext.len() + self.nonce.len() + self.tag.len() + self.salt.len()
    }

    /// Age of the record
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Whether the record has exceeded the given retention period
    pub fn is_expired(&self, retention: Duration) -> bool {
        self.age() > retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SecureRecord {
        SecureRecord {
            record_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            ciphertext: vec![1; 272],
            nonce: vec![2; 12],
            tag: vec![3; 16],
            salt: vec![4; 32],
            encryption_algorithm: "AES-256-GCM".into(),
            key_derivation_algorithm: "PBKDF2-HMAC-SHA256".into(),
            created_at: Utc::now(),
            last_accessed: None,
        }
    }

    #[test]
    fn test_storage_size_sums_all_components() {
        let record = sample_record();
        assert_eq!(record.storage_size(), 272 + 12 + 16 + 32);
    }

    #[test]
    fn test_retention_boundary() {
        let mut record = sample_record();

        record.created_at = Utc::now() - Duration::days(29);
        assert!(!record.is_expired(Duration::days(30)));

        record.created_at = Utc::now() - Duration::days(31);
        assert!(record.is_expired(Duration::days(30)));
    }

    #[test]
    fn test_envelope_layout_is_stable() {
        // A durable backing store round-trips the envelope verbatim.
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let restored: SecureRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.record_id, record.record_id);
        assert_eq!(restored.owner_id, record.owner_id);
        assert_eq!(restored.ciphertext, record.ciphertext);
        assert_eq!(restored.nonce, record.nonce);
        assert_eq!(restored.tag, record.tag);
        assert_eq!(restored.salt, record.salt);
        assert_eq!(restored.created_at, record.created_at);
        assert_eq!(restored.last_accessed, record.last_accessed);
    }
}
