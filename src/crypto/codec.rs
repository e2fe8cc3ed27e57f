//! Biovault - Template Codec
//!
//! Stateless transform between plaintext templates and encrypted records:
//! fresh salt and nonce per encryption, PBKDF2 per-record key derivation
//! over the biometric root key, AES-256-GCM over the template's canonical
//! bytes with the owner id as associated data. Decryption fails closed;
//! secure erasure overwrites before clearing.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use chrono::Utc;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::keys::{
    KeyContext, KeyDomain, RootKey, AEAD_ALGORITHM, KDF_ALGORITHM, KEY_LEN, NONCE_LEN, TAG_LEN,
};
use crate::error::{BioVaultError, BioVaultResult};
use crate::record::SecureRecord;
use crate::template::BiometricTemplate;

/// Derive a one-time per-record key from a root key and salt.
///
/// PBKDF2-HMAC-SHA256 with the context's iteration count. The random salt
/// makes every record's key unique, so a single derived key never protects
/// more than one ciphertext.
pub fn derive_record_key(
    root: &RootKey,
    salt: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(root.expose(), salt, iterations, &mut *key);
    key
}

/// Encrypt a biometric template into a [`SecureRecord`].
///
/// Encrypting the same template twice yields different ciphertext, nonce,
/// and salt each time.
pub fn encrypt_template(
    template: &BiometricTemplate,
    ctx: &KeyContext,
) -> BioVaultResult<SecureRecord> {
    // No partially valid template reaches the cipher
    template.validate()?;

    let salt = ctx.generate_salt();
    let nonce_bytes = ctx.generate_nonce();
    let key = derive_record_key(ctx.key_for(KeyDomain::Biometric), &salt, ctx.iterations());

    let plaintext = template.canonical_bytes()?;

    let cipher = Aes256Gcm::new_from_slice(&*key)
        .map_err(|e| BioVaultError::EncryptionFailed(e.to_string()))?;

    // AAD binds the ciphertext to its owner
    let payload = Payload {
        msg: &plaintext,
        aad: template.owner_id.as_bytes(),
    };

    let mut ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), payload)
        .map_err(|_| BioVaultError::EncryptionFailed("AEAD encryption failed".into()))?;

    let tag = ciphertext.split_off(ciphertext.len() - TAG_LEN);

    Ok(SecureRecord {
        record_id: Uuid::new_v4(),
        owner_id: template.owner_id,
        ciphertext,
        nonce: nonce_bytes.to_vec(),
        tag,
        salt,
        encryption_algorithm: AEAD_ALGORITHM.to_string(),
        key_derivation_algorithm: KDF_ALGORITHM.to_string(),
        created_at: Utc::now(),
        last_accessed: None,
    })
}

/// Decrypt a [`SecureRecord`] back into its template.
///
/// Fails closed on tag mismatch, corrupted ciphertext, wrong key, or an
/// erased record; no partial plaintext is ever returned. On success the
/// record's `last_accessed` timestamp is updated.
pub fn decrypt_template(
    record: &mut SecureRecord,
    ctx: &KeyContext,
) -> BioVaultResult<BiometricTemplate> {
    if record.is_erased() {
        return Err(BioVaultError::RecordErased);
    }

    if record.nonce.len() != NONCE_LEN {
        return Err(BioVaultError::DecryptionFailed("invalid nonce length".into()));
    }

    if record.tag.len() != TAG_LEN {
        return Err(BioVaultError::DecryptionFailed("invalid tag length".into()));
    }

    let key = derive_record_key(
        ctx.key_for(KeyDomain::Biometric),
        &record.salt,
        ctx.iterations(),
    );

    let cipher = Aes256Gcm::new_from_slice(&*key)
        .map_err(|e| BioVaultError::DecryptionFailed(e.to_string()))?;

    // The aes-gcm crate expects the tag appended to the ciphertext
    let mut joined = Vec::with_capacity(record.ciphertext.len() + record.tag.len());
    joined.extend_from_slice(&record.ciphertext);
    joined.extend_from_slice(&record.tag);

    let payload = Payload {
        msg: &joined,
        aad: record.owner_id.as_bytes(),
    };

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&record.nonce), payload)
            .map_err(|_| {
                BioVaultError::DecryptionFailed(
                    "authentication failed - wrong key or corrupted data".into(),
                )
            })?,
    );

    let template = BiometricTemplate::from_canonical(&plaintext)?;

    record.last_accessed = Some(Utc::now());

    Ok(template)
}

/// Verify record integrity, reporting success or failure as a boolean.
///
/// Reuses the decrypt path, so the plaintext exists transiently inside the
/// call in zeroizing buffers; nothing beyond the boolean reaches the caller.
pub fn verify_integrity(record: &mut SecureRecord, ctx: &KeyContext) -> bool {
    decrypt_template(record, ctx).is_ok()
}

/// Securely erase a record's sensitive fields.
///
/// Overwrites ciphertext, nonce, tag, and salt each with fresh random bytes
/// of equal length, then clears all four together. Idempotent. Best-effort
/// under managed memory: it prevents trivial recovery through the data
/// structure, not physical memory forensics.
pub fn secure_erase(record: &mut SecureRecord) {
    if record.is_erased() {
        return;
    }

    use rand::RngCore;
    let mut rng = rand::thread_rng();

    for buf in [
        &mut record.ciphertext,
        &mut record.nonce,
        &mut record.tag,
        &mut record.salt,
    ] {
        rng.fill_bytes(buf.as_mut_slice());
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateKind;
    use rand::RngCore;

    fn sample_template(owner: Uuid) -> BiometricTemplate {
        let mut features = vec![0u8; 256];
        rand::thread_rng().fill_bytes(&mut features);

        BiometricTemplate::new(
            owner,
            TemplateKind::FacialRecognition,
            features,
            0.95,
            "arcface_v2",
        )
        .unwrap()
        .with_metadata("capture_device", "kiosk-01")
    }

    fn fast_ctx() -> KeyContext {
        // Minimum allowed iteration count keeps the tests responsive
        KeyContext::generate()
    }

    #[test]
    fn test_roundtrip_reproduces_every_field() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        let decrypted = decrypt_template(&mut record, &ctx).unwrap();

        assert_eq!(decrypted, template);
    }

    #[test]
    fn test_record_fields_populated() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let record = encrypt_template(&template, &ctx).unwrap();

        assert_eq!(record.owner_id, template.owner_id);
        assert!(!record.ciphertext.is_empty());
        assert_eq!(record.nonce.len(), NONCE_LEN);
        assert_eq!(record.tag.len(), TAG_LEN);
        assert_eq!(record.salt.len(), 32);
        assert_eq!(record.encryption_algorithm, AEAD_ALGORITHM);
        assert_eq!(record.key_derivation_algorithm, KDF_ALGORITHM);
        assert!(record.last_accessed.is_none());
    }

    #[test]
    fn test_encrypting_twice_differs() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let a = encrypt_template(&template, &ctx).unwrap();
        let b = encrypt_template(&template, &ctx).unwrap();

        assert_ne!(a.ciphertext, b.ciphertext);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn test_tampered_ciphertext_detected() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        record.ciphertext[0] ^= 0x01;

        assert!(matches!(
            decrypt_template(&mut record, &ctx),
            Err(BioVaultError::DecryptionFailed(_))
        ));
        assert!(!verify_integrity(&mut record, &ctx));
        // Failed decrypt never touches last_accessed
        assert!(record.last_accessed.is_none());
    }

    #[test]
    fn test_tampered_tag_detected() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        record.tag[7] ^= 0x80;

        assert!(decrypt_template(&mut record, &ctx).is_err());
        assert!(!verify_integrity(&mut record, &ctx));
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let ctx = fast_ctx();
        let other_ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();

        assert!(matches!(
            decrypt_template(&mut record, &other_ctx),
            Err(BioVaultError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_rotation_invalidates_prior_records() {
        let mut ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());
        let mut record = encrypt_template(&template, &ctx).unwrap();

        ctx.rotate();

        assert!(decrypt_template(&mut record, &ctx).is_err());
        assert!(!verify_integrity(&mut record, &ctx));
    }

    #[test]
    fn test_owner_binding_via_aad() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        record.owner_id = Uuid::new_v4();

        assert!(decrypt_template(&mut record, &ctx).is_err());
    }

    #[test]
    fn test_verify_integrity_updates_last_accessed() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        assert!(verify_integrity(&mut record, &ctx));
        assert!(record.last_accessed.is_some());
    }

    #[test]
    fn test_secure_erase_clears_all_fields() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        assert!(!record.is_erased());

        secure_erase(&mut record);

        assert!(record.is_erased());
        assert!(record.ciphertext.is_empty());
        assert!(record.nonce.is_empty());
        assert!(record.tag.is_empty());
        assert!(record.salt.is_empty());
        assert_eq!(record.storage_size(), 0);

        // Repeating is a safe no-op
        secure_erase(&mut record);
        assert!(record.is_erased());
    }

    #[test]
    fn test_erased_record_cannot_be_decrypted() {
        let ctx = fast_ctx();
        let template = sample_template(Uuid::new_v4());

        let mut record = encrypt_template(&template, &ctx).unwrap();
        secure_erase(&mut record);

        assert!(matches!(
            decrypt_template(&mut record, &ctx),
            Err(BioVaultError::RecordErased)
        ));
        assert!(!verify_integrity(&mut record, &ctx));
    }

    #[test]
    fn test_derived_keys_depend_on_salt() {
        let ctx = fast_ctx();
        let root = ctx.key_for(KeyDomain::Biometric);

        let k1 = derive_record_key(root, b"salt-one", ctx.iterations());
        let k2 = derive_record_key(root, b"salt-two", ctx.iterations());
        let k1_again = derive_record_key(root, b"salt-one", ctx.iterations());

        assert_ne!(*k1, *k2);
        assert_eq!(*k1, *k1_again);
    }
}
