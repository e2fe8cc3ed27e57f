//! Biovault - Plaintext Biometric Templates
//!
//! A [`BiometricTemplate`] is the validated plaintext form of a biometric
//! record. It is transient: it only exists in memory between feature
//! extraction and encryption (or between decryption and matching), and its
//! sensitive fields are zeroized on drop. It is never persisted as-is.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroizing, ZeroizeOnDrop};

use crate::error::{BioVaultError, BioVaultResult};

/// Kind of biometric template
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Facial recognition features
    FacialRecognition,
    /// Fingerprint minutiae
    Fingerprint,
    /// Iris pattern
    Iris,
    /// Voice print
    Voice,
}

impl Default for TemplateKind {
    fn default() -> Self {
        TemplateKind::FacialRecognition
    }
}

/// Raw biometric template before encryption.
///
/// Construction goes through [`BiometricTemplate::new`], which rejects
/// invalid field values before the template exists. No partially valid
/// template ever reaches the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ZeroizeOnDrop)]
pub struct BiometricTemplate {
    /// Unique template identifier
    #[zeroize(skip)]
    pub template_id: Uuid,
    /// Owner of the biometric data
    #[zeroize(skip)]
    pub owner_id: Uuid,
    /// Template kind
    #[zeroize(skip)]
    pub kind: TemplateKind,
    /// Extracted biometric features (opaque, non-empty)
    pub feature_vector: Vec<u8>,
    /// Quality assessment of the template, in [0.0, 1.0]
    pub quality_score: f64,
    /// Algorithm used for feature extraction
    pub extraction_algorithm: String,
    /// Creation timestamp
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    /// Free-form metadata (BTreeMap keeps the canonical encoding stable)
    #[zeroize(skip)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl BiometricTemplate {
    /// Create a validated template. Fails before any invalid value exists.
    pub fn new(
        owner_id: Uuid,
        kind: TemplateKind,
        feature_vector: Vec<u8>,
        quality_score: f64,
        extraction_algorithm: impl Into<String>,
    ) -> BioVaultResult<Self> {
        let template = Self {
            template_id: Uuid::new_v4(),
            owner_id,
            kind,
            feature_vector,
            quality_score,
            extraction_algorithm: extraction_algorithm.into(),
            created_at: Utc::now(),
            metadata: BTreeMap::new(),
        };

        template.validate()?;
        Ok(template)
    }

    /// Attach a metadata entry (builder style)
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validate template invariants
    pub fn validate(&self) -> BioVaultResult<()> {
        if self.owner_id.is_nil() {
            return Err(BioVaultError::MissingOwner);
        }

        if self.feature_vector.is_empty() {
            return Err(BioVaultError::EmptyFeatureVector);
        }

        // NaN fails the range check as well
        if !(0.0..=1.0).contains(&self.quality_score) {
            return Err(BioVaultError::QualityScoreOutOfRange(self.quality_score));
        }

        Ok(())
    }

    /// Canonical byte encoding for integrity-protected encryption.
    ///
    /// Field order follows the struct declaration and metadata keys are
    /// sorted, so the same template always encodes to the same bytes and
    /// the AEAD tag covers every field.
    pub fn canonical_bytes(&self) -> BioVaultResult<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(serde_json::to_vec(self)?))
    }

    /// Reconstruct a template from its canonical encoding
    pub fn from_canonical(bytes: &[u8]) -> BioVaultResult<Self> {
        let template: Self = serde_json::from_slice(bytes)?;
        template.validate()?;
        Ok(template)
    }
}
