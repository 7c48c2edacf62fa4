//! Deterministic anonymous identities.
//!
//! A user's secret is keccak256 of their anonymous user id reduced into the
//! scalar field; the commitment published to a group is `Poseidon(secret)`.
//! The same user id yields the same identity on every platform and run.

use crate::hasher::keccak256;
use crate::poseidon_canonical::{element_from_fr, fr_from_element, poseidon_hash};
use anonsignals_types::{AnonError, AnonResult, FieldElement};
use ark_bn254::Fr;
use ark_ff::PrimeField;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use zeroize::Zeroizing;

const STORAGE_KEY_CONTEXT: &str = "anonsignals 2024-06 identity storage keystream v1";

#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    secret: FieldElement,
    commitment: FieldElement,
}

impl Identity {
    /// Rebuilds an identity from a recovered secret. The secret is reduced
    /// into the field first so the commitment matches what the circuit sees.
    pub fn from_secret(secret: FieldElement) -> Self {
        let secret = element_from_fr(&fr_from_element(&secret));
        let commitment = poseidon_hash(&[secret]);
        Self { secret, commitment }
    }

    pub fn secret(&self) -> &FieldElement {
        &self.secret
    }

    pub fn commitment(&self) -> &FieldElement {
        &self.commitment
    }

    /// `Poseidon(external_nullifier, secret)`: stable per (identity, scope).
    pub fn nullifier(&self, external_nullifier: &FieldElement) -> FieldElement {
        poseidon_hash(&[*external_nullifier, self.secret])
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("secret", &"<redacted>")
            .field("commitment", &self.commitment)
            .finish()
    }
}

pub fn derive_identity(user_id: &str) -> Identity {
    let digest = Zeroizing::new(keccak256(user_id.as_bytes()));
    let secret = Fr::from_be_bytes_mod_order(&digest[..]);
    Identity::from_secret(element_from_fr(&secret))
}

fn keystream(user_id: &str, len: usize) -> Zeroizing<Vec<u8>> {
    let mut hasher = blake3::Hasher::new_derive_key(STORAGE_KEY_CONTEXT);
    hasher.update(user_id.as_bytes());
    let mut stream = Zeroizing::new(vec![0u8; len]);
    hasher.finalize_xof().fill(&mut stream);
    stream
}

/// Obfuscates the decimal secret for local storage.
///
/// The keystream is derived from the user id alone, so anyone holding the
/// stored record and the user id can recover the secret. This keeps the
/// secret out of casual view; it is not encryption at rest.
pub fn encrypt_secret(secret: &FieldElement, user_id: &str) -> String {
    let plaintext = Zeroizing::new(secret.to_string().into_bytes());
    let stream = keystream(user_id, plaintext.len());
    let ciphertext: Vec<u8> = plaintext
        .iter()
        .zip(stream.iter())
        .map(|(p, k)| p ^ k)
        .collect();
    STANDARD.encode(ciphertext)
}

pub fn decrypt_secret(ciphertext: &str, user_id: &str) -> AnonResult<FieldElement> {
    let bytes = STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| AnonError::Crypto(format!("Stored secret is not valid base64: {}", e)))?;
    let stream = keystream(user_id, bytes.len());
    let plaintext = Zeroizing::new(
        bytes
            .iter()
            .zip(stream.iter())
            .map(|(c, k)| c ^ k)
            .collect::<Vec<u8>>(),
    );
    let text = std::str::from_utf8(&plaintext)
        .map_err(|_| AnonError::Crypto("Stored secret did not decrypt to text".into()))?;
    FieldElement::from_dec_str(text)
        .map_err(|_| AnonError::Crypto("Stored secret did not decrypt to a field element".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_anon_user_commitment_is_stable() {
        let first = derive_identity("anon_abc123");
        let second = derive_identity("anon_abc123");
        assert_eq!(first, second);
        assert_eq!(first.commitment().to_string(), second.commitment().to_string());
    }

    #[test]
    fn test_secret_is_reduced_keccak_of_user_id() {
        let identity = derive_identity("anon_abc123");
        let digest = keccak256(b"anon_abc123");
        let expected = element_from_fr(&Fr::from_be_bytes_mod_order(&digest));
        assert_eq!(identity.secret(), &expected);
        assert_eq!(identity.commitment(), &poseidon_hash(&[expected]));
    }

    #[test]
    fn test_distinct_users_distinct_identities() {
        assert_ne!(
            derive_identity("anon_abc123").commitment(),
            derive_identity("anon_abc124").commitment()
        );
    }

    #[test]
    fn test_nullifier_depends_on_scope() {
        let identity = derive_identity("anon_abc123");
        let scope_a = FieldElement::from_u64(1);
        let scope_b = FieldElement::from_u64(2);
        assert_eq!(identity.nullifier(&scope_a), identity.nullifier(&scope_a));
        assert_ne!(identity.nullifier(&scope_a), identity.nullifier(&scope_b));
    }

    #[test]
    fn test_secret_round_trip_through_storage_cipher() {
        let identity = derive_identity("anon_abc123");
        let stored = encrypt_secret(identity.secret(), "anon_abc123");
        assert!(!stored.contains(&identity.secret().to_string()));
        let recovered = decrypt_secret(&stored, "anon_abc123").unwrap();
        assert_eq!(Identity::from_secret(recovered), identity);
    }

    #[test]
    fn test_wrong_user_id_does_not_recover_secret() {
        let identity = derive_identity("anon_abc123");
        let stored = encrypt_secret(identity.secret(), "anon_abc123");
        match decrypt_secret(&stored, "anon_other") {
            Ok(secret) => assert_ne!(&secret, identity.secret()),
            Err(e) => assert!(matches!(e, AnonError::Crypto(_))),
        }
        assert!(decrypt_secret("not base64!", "anon_abc123").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let identity = derive_identity("anon_abc123");
        let rendered = format!("{:?}", identity);
        assert!(!rendered.contains(&identity.secret().to_string()));
    }

    proptest! {
        #[test]
        fn prop_derivation_deterministic(user_id in "[a-zA-Z0-9_]{1,32}") {
            prop_assert_eq!(derive_identity(&user_id), derive_identity(&user_id));
        }
    }
}
