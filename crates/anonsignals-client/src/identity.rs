use anonsignals_crypto::{decrypt_secret, derive_identity, encrypt_secret, Identity};
use anonsignals_types::{AnonError, AnonResult, FieldElement};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::storage::{IdentityStore, StoredIdentity};

/// Recovers, persists and cross-checks per-user identities.
///
/// The identity for a user id is always the deterministic derivation; the
/// store is only a cache of it. A stored record that disagrees with the
/// derivation is drift, resolved against the membership store's commitment
/// for the user (the source of truth) when one is given.
#[derive(Clone)]
pub struct IdentityManager {
    store: Arc<dyn IdentityStore>,
}

enum Recovered {
    Consistent(Identity),
    Drifted { stored_commitment: FieldElement },
    Absent,
}

impl IdentityManager {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub fn derive(&self, user_id: &str) -> Identity {
        derive_identity(user_id)
    }

    pub fn load_or_create(
        &self,
        user_id: &str,
        source_of_truth: Option<&FieldElement>,
    ) -> AnonResult<Identity> {
        let derived = derive_identity(user_id);

        match self.recover(user_id, &derived)? {
            Recovered::Consistent(identity) => {
                if let Some(truth) = source_of_truth {
                    if truth != identity.commitment() {
                        warn!(
                            "Stored identity {} is not the member commitment {}",
                            identity.commitment(),
                            truth
                        );
                        return Err(mismatch(truth, &derived));
                    }
                }
                debug!("Recovered identity {}", identity.commitment());
                Ok(identity)
            }
            Recovered::Absent => {
                if let Some(truth) = source_of_truth {
                    if truth != derived.commitment() {
                        return Err(mismatch(truth, &derived));
                    }
                }
                self.persist(user_id, &derived)?;
                info!("Created identity {}", derived.commitment());
                Ok(derived)
            }
            Recovered::Drifted { stored_commitment } => {
                let truth = source_of_truth.copied().unwrap_or(stored_commitment);
                warn!(
                    "Identity drift: stored {}, derived {}, member {}",
                    stored_commitment,
                    derived.commitment(),
                    truth
                );
                if truth != *derived.commitment() {
                    return Err(mismatch(&truth, &derived));
                }
                self.persist(user_id, &derived)?;
                info!("Re-derived identity {} adopted and re-persisted", derived.commitment());
                Ok(derived)
            }
        }
    }

    /// Drops the stored record; the next `load_or_create` derives afresh.
    pub fn forget(&self, user_id: &str) -> AnonResult<bool> {
        let existed = self.store.remove(user_id)?;
        if existed {
            info!("Removed stored identity");
        }
        Ok(existed)
    }

    pub fn stored_commitment(&self, user_id: &str) -> AnonResult<Option<FieldElement>> {
        Ok(self.store.load(user_id)?.map(|r| r.commitment))
    }

    fn recover(&self, user_id: &str, derived: &Identity) -> AnonResult<Recovered> {
        let record = match self.store.load(user_id) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(Recovered::Absent),
            Err(AnonError::Serialization(e)) => {
                warn!("Unreadable identity record: {}", e);
                return Ok(Recovered::Drifted {
                    stored_commitment: *derived.commitment(),
                });
            }
            Err(e) => return Err(e),
        };

        let recovered = match decrypt_secret(&record.encrypted_secret, user_id) {
            Ok(secret) => Identity::from_secret(secret),
            Err(e) => {
                warn!("Stored secret could not be decrypted: {}", e);
                return Ok(Recovered::Drifted {
                    stored_commitment: record.commitment,
                });
            }
        };

        if recovered.commitment() == &record.commitment && recovered.commitment() == derived.commitment() {
            Ok(Recovered::Consistent(recovered))
        } else {
            Ok(Recovered::Drifted {
                stored_commitment: record.commitment,
            })
        }
    }

    fn persist(&self, user_id: &str, identity: &Identity) -> AnonResult<()> {
        let record = StoredIdentity {
            commitment: *identity.commitment(),
            encrypted_secret: encrypt_secret(identity.secret(), user_id),
        };
        self.store.store(user_id, &record)
    }
}

fn mismatch(stored: &FieldElement, derived: &Identity) -> AnonError {
    AnonError::IdentityMismatch {
        stored: stored.to_string(),
        derived: derived.commitment().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryIdentityStore;

    fn manager() -> (Arc<MemoryIdentityStore>, IdentityManager) {
        let store = Arc::new(MemoryIdentityStore::new());
        (store.clone(), IdentityManager::new(store))
    }

    #[test]
    fn test_first_load_derives_and_persists() {
        let (store, manager) = manager();
        let identity = manager.load_or_create("anon_abc123", None).unwrap();

        assert_eq!(identity.commitment(), derive_identity("anon_abc123").commitment());
        let record = store.load("anon_abc123").unwrap().unwrap();
        assert_eq!(record.commitment, *identity.commitment());
        assert!(!record.encrypted_secret.contains(&identity.secret().to_string()));
    }

    #[test]
    fn test_reload_is_stable() {
        let (_, manager) = manager();
        let first = manager.load_or_create("anon_abc123", None).unwrap();
        let second = manager.load_or_create("anon_abc123", Some(first.commitment())).unwrap();
        assert_eq!(first.commitment(), second.commitment());
        assert_eq!(first.secret(), second.secret());
    }

    #[test]
    fn test_drifted_record_readopted_when_member_matches() {
        let (store, manager) = manager();
        let derived = derive_identity("anon_1");
        store
            .store(
                "anon_1",
                &StoredIdentity {
                    commitment: FieldElement::from_u64(99),
                    encrypted_secret: encrypt_secret(&FieldElement::from_u64(5), "anon_1"),
                },
            )
            .unwrap();

        let identity = manager.load_or_create("anon_1", Some(derived.commitment())).unwrap();
        assert_eq!(identity.commitment(), derived.commitment());
        assert_eq!(store.load("anon_1").unwrap().unwrap().commitment, *derived.commitment());
    }

    #[test]
    fn test_drift_without_matching_member_fails() {
        let (store, manager) = manager();
        let stale = StoredIdentity {
            commitment: FieldElement::from_u64(99),
            encrypted_secret: encrypt_secret(&FieldElement::from_u64(5), "anon_1"),
        };
        store.store("anon_1", &stale).unwrap();

        let err = manager.load_or_create("anon_1", None).unwrap_err();
        assert!(matches!(err, AnonError::IdentityMismatch { ref stored, .. } if stored == "99"));
        assert_eq!(store.load("anon_1").unwrap(), Some(stale));
    }

    #[test]
    fn test_member_commitment_must_match_derivation() {
        let (store, manager) = manager();
        let other = FieldElement::from_u64(12345);

        let err = manager.load_or_create("anon_2", Some(&other)).unwrap_err();
        assert!(err.is_correctness_alarm());
        assert!(store.is_empty());

        manager.load_or_create("anon_2", None).unwrap();
        assert!(manager.load_or_create("anon_2", Some(&other)).is_err());
    }

    #[test]
    fn test_undecryptable_secret_recovered_from_derivation() {
        let (store, manager) = manager();
        let derived = derive_identity("anon_3");
        store
            .store(
                "anon_3",
                &StoredIdentity {
                    commitment: *derived.commitment(),
                    encrypted_secret: "%%%".into(),
                },
            )
            .unwrap();

        let identity = manager.load_or_create("anon_3", None).unwrap();
        assert_eq!(identity.secret(), derived.secret());
        let record = store.load("anon_3").unwrap().unwrap();
        assert_eq!(decrypt_secret(&record.encrypted_secret, "anon_3").unwrap(), *derived.secret());
    }

    #[test]
    fn test_forget() {
        let (_, manager) = manager();
        manager.load_or_create("anon_4", None).unwrap();
        assert!(manager.stored_commitment("anon_4").unwrap().is_some());
        assert!(manager.forget("anon_4").unwrap());
        assert!(!manager.forget("anon_4").unwrap());
        assert!(manager.stored_commitment("anon_4").unwrap().is_none());
    }
}
