//! Biovault - Error Types

use thiserror::Error;
use uuid::Uuid;

/// Result type for vault operations
pub type BioVaultResult<T> = Result<T, BioVaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum BioVaultError {
    // ═══════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid key length for {domain} domain: expected {expected}, got {actual}")]
    InvalidKeyLength {
        domain: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid key format for {domain} domain: {reason}")]
    InvalidKeyFormat {
        domain: &'static str,
        reason: String,
    },

    #[error("Key provider unavailable: {0}")]
    KeyProviderUnavailable(String),

    #[error("Iteration count {0} below the minimum of {min}", min = crate::crypto::MIN_ITERATIONS)]
    WeakIterationCount(u32),

    // ═══════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Feature vector is required and cannot be empty")]
    EmptyFeatureVector,

    #[error("Quality score must be between 0.0 and 1.0, got {0}")]
    QualityScoreOutOfRange(f64),

    #[error("Owner ID is required for biometric template")]
    MissingOwner,

    // ═══════════════════════════════════════════════════════════════
    // CRYPTO ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Record has been securely erased")]
    RecordErased,

    // ═══════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Template not found: {0}")]
    TemplateNotFound(Uuid),

    // ═══════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BioVaultError {
    /// Check if this is a security-critical error
    pub fn is_security_critical(&self) -> bool {
        matches!(
            self,
            BioVaultError::DecryptionFailed(_) | BioVaultError::RecordErased
        )
    }

    /// Check if this error blocks encryption outright
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BioVaultError::EmptyFeatureVector
                | BioVaultError::QualityScoreOutOfRange(_)
                | BioVaultError::MissingOwner
        )
    }
}

impl From<serde_json::Error> for BioVaultError {
    fn from(e: serde_json::Error) -> Self {
        BioVaultError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(BioVaultError::DecryptionFailed("tag mismatch".into()).is_security_critical());
        assert!(BioVaultError::RecordErased.is_security_critical());
        assert!(!BioVaultError::EmptyFeatureVector.is_security_critical());

        assert!(BioVaultError::QualityScoreOutOfRange(1.5).is_validation());
        assert!(!BioVaultError::TemplateNotFound(Uuid::new_v4()).is_validation());
    }

    #[test]
    fn test_messages_never_echo_key_material() {
        let err = BioVaultError::InvalidKeyFormat {
            domain: "biometric",
            reason: "odd number of digits".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("biometric"));
        assert!(!msg.is_empty());
    }
}
