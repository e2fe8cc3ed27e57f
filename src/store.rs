//! Biovault - Template Store
//!
//! Owns the encrypted record collection: a primary id index and a secondary
//! owner index, kept mutually consistent under a single coarse lock. Every
//! read decrypts on demand; plaintext is never cached between calls.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::crypto::{self, KeyContext};
use crate::error::{BioVaultError, BioVaultResult};
use crate::record::SecureRecord;
use crate::template::BiometricTemplate;

/// Storage statistics for monitoring and capacity planning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of stored records
    pub total_records: usize,
    /// Summed ciphertext + nonce + tag + salt bytes
    pub total_bytes: usize,
    /// Number of owners with at least one record
    pub distinct_owners: usize,
    /// Average record size in bytes (0.0 when empty)
    pub avg_record_bytes: f64,
}

struct StoreInner {
    keys: KeyContext,
    /// Primary index: record id -> encrypted record
    records: HashMap<Uuid, SecureRecord>,
    /// Secondary index: owner id -> record ids
    by_owner: HashMap<Uuid, HashSet<Uuid>>,
}

/// Encrypted biometric template store.
///
/// All state, including the [`KeyContext`], lives behind one write lock:
/// index mutation is mutually exclusive, readers never observe a record
/// mid-erase, and key rotation is serialized against in-flight
/// encrypt/decrypt calls (an operation already holding the lock finishes
/// under the pre-rotation keys; later calls fail closed).
pub struct TemplateStore {
    inner: RwLock<StoreInner>,
}

impl TemplateStore {
    /// Create a store around a constructor-injected key context
    pub fn new(keys: KeyContext) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                keys,
                records: HashMap::new(),
                by_owner: HashMap::new(),
            }),
        }
    }

    /// Encrypt and store a template, returning the new record id
    pub fn put(&self, template: &BiometricTemplate) -> BioVaultResult<Uuid> {
        let mut inner = self.inner.write();

        let record = crypto::encrypt_template(template, &inner.keys)?;
        let record_id = record.record_id;
        let owner_id = record.owner_id;

        inner.records.insert(record_id, record);
        inner.by_owner.entry(owner_id).or_default().insert(record_id);

        log::debug!("Stored encrypted template {record_id} for owner {owner_id}");
        Ok(record_id)
    }

    /// Decrypt and return the template for a record id.
    ///
    /// Decrypts on demand; the plaintext is handed to the caller and never
    /// retained by the store.
    pub fn get(&self, record_id: Uuid) -> BioVaultResult<BiometricTemplate> {
        let mut inner = self.inner.write();
        let StoreInner { keys, records, .. } = &mut *inner;

        let record = records
            .get_mut(&record_id)
            .ok_or(BioVaultError::TemplateNotFound(record_id))?;

        crypto::decrypt_template(record, keys)
    }

    /// Decrypt every template belonging to an owner.
    ///
    /// A single corrupted or undecryptable record is skipped and logged;
    /// it never aborts the remaining listing.
    pub fn list_by_owner(&self, owner_id: Uuid) -> Vec<BiometricTemplate> {
        let mut inner = self.inner.write();
        let StoreInner {
            keys,
            records,
            by_owner,
        } = &mut *inner;

        let Some(ids) = by_owner.get(&owner_id) else {
            return Vec::new();
        };

        let mut templates = Vec::with_capacity(ids.len());
        for record_id in ids.iter() {
            let Some(record) = records.get_mut(record_id) else {
                continue;
            };
            match crypto::decrypt_template(record, keys) {
                Ok(template) => templates.push(template),
                Err(e) => {
                    log::warn!("Skipping undecryptable record {record_id} for owner {owner_id}: {e}");
                }
            }
        }

        templates
    }

    /// Securely erase and remove a record from both indexes.
    ///
    /// Returns false if the id is absent.
    pub fn delete(&self, record_id: Uuid) -> bool {
        let mut inner = self.inner.write();
        let deleted = remove_record(&mut inner, record_id);
        if deleted {
            log::info!("Deleted record {record_id}");
        }
        deleted
    }

    /// Delete all records for an owner, returning the count actually removed
    pub fn delete_by_owner(&self, owner_id: Uuid) -> usize {
        let mut inner = self.inner.write();

        let ids: Vec<Uuid> = inner
            .by_owner
            .get(&owner_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        let mut deleted = 0;
        for record_id in ids {
            if remove_record(&mut inner, record_id) {
                deleted += 1;
            }
        }

        if deleted > 0 {
            log::info!("Deleted {deleted} records for owner {owner_id}");
        }
        deleted
    }

    /// Delete every record whose age exceeds the caller-supplied retention
    /// period, returning the count removed
    pub fn cleanup_expired(&self, retention: Duration) -> usize {
        let mut inner = self.inner.write();

        let expired: Vec<Uuid> = inner
            .records
            .iter()
            .filter(|(_, record)| record.is_expired(retention))
            .map(|(id, _)| *id)
            .collect();

        let mut deleted = 0;
        for record_id in expired {
            if remove_record(&mut inner, record_id) {
                deleted += 1;
            }
        }

        if deleted > 0 {
            log::info!("Retention cleanup removed {deleted} expired records");
        }
        deleted
    }

    /// Run integrity verification over every record.
    ///
    /// The only side effect is the `last_accessed` update on successfully
    /// verified records; a bad record never aborts the batch.
    pub fn verify_all(&self) -> HashMap<Uuid, bool> {
        let mut inner = self.inner.write();
        let StoreInner { keys, records, .. } = &mut *inner;

        let mut status = HashMap::with_capacity(records.len());
        for (record_id, record) in records.iter_mut() {
            let ok = crypto::verify_integrity(record, keys);
            if !ok {
                log::warn!("Integrity audit failed for record {record_id}");
            }
            status.insert(*record_id, ok);
        }

        status
    }

    /// Storage statistics
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();

        let total_records = inner.records.len();
        let total_bytes: usize = inner.records.values().map(SecureRecord::storage_size).sum();

        StoreStats {
            total_records,
            total_bytes,
            distinct_owners: inner.by_owner.len(),
            avg_record_bytes: if total_records > 0 {
                total_bytes as f64 / total_records as f64
            } else {
                0.0
            },
        }
    }

    /// Rotate all root keys.
    ///
    /// One-way and destructive: every stored record becomes undecryptable.
    /// Serialized against in-flight encrypt/decrypt via the store lock.
    pub fn rotate_keys(&self) {
        let mut inner = self.inner.write();
        inner.keys.rotate();
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Backdate a record's creation time (retention tests)
    #[cfg(test)]
    fn backdate(&self, record_id: Uuid, age: Duration) {
        let mut inner = self.inner.write();
        if let Some(record) = inner.records.get_mut(&record_id) {
            record.created_at = chrono::Utc::now() - age;
        }
    }

    /// Check the primary/secondary index consistency invariant
    #[cfg(test)]
    fn indexes_consistent(&self) -> bool {
        let inner = self.inner.read();

        let forward = inner.by_owner.iter().all(|(owner, ids)| {
            ids.iter().all(|id| {
                inner
                    .records
                    .get(id)
                    .is_some_and(|record| record.owner_id == *owner)
            })
        });

        let backward = inner.records.values().all(|record| {
            inner
                .by_owner
                .get(&record.owner_id)
                .is_some_and(|ids| ids.contains(&record.record_id))
        });

        forward && backward
    }
}

/// Erase a record and drop it from both indexes. The erase and the index
/// removal happen under the same lock, so no reader can observe a
/// half-erased record or a dangling index entry.
fn remove_record(inner: &mut StoreInner, record_id: Uuid) -> bool {
    let Some(record) = inner.records.get_mut(&record_id) else {
        return false;
    };

    let owner_id = record.owner_id;
    crypto::secure_erase(record);
    inner.records.remove(&record_id);

    if let Some(ids) = inner.by_owner.get_mut(&owner_id) {
        ids.remove(&record_id);
        if ids.is_empty() {
            inner.by_owner.remove(&owner_id);
        }
    }

    true
}
