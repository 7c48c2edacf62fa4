//! Aggregation leaf (statement hash) recomputation.
//!
//! ```text
//! leaf = keccak256(PROVING_SYSTEM_ID || vk_hash || VERSION_HASH || keccak256(pubs))
//! pubs = rev(be32(s0)) || rev(be32(s1)) || ...
//! ```
//!
//! Each public signal is written as a 32-byte big-endian word and then
//! byte-reversed: the aggregation contract stores public inputs
//! little-endian. Skipping the reversal yields a well-formed but wrong leaf.

use anonsignals_types::{AnonError, AnonResult, Bytes32, FieldElement, PROOF_TYPE_GROTH16};
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::hasher::keccak256;

/// `keccak256("groth16")`
pub fn proving_system_id() -> [u8; 32] {
    keccak256(PROOF_TYPE_GROTH16.as_bytes())
}

/// `sha256("")`: the verifier has no version tag.
pub fn version_hash() -> [u8; 32] {
    Sha256::digest(b"").into()
}

pub fn public_inputs_hash(signals: &[FieldElement]) -> [u8; 32] {
    let mut packed = Vec::with_capacity(signals.len() * 32);
    for signal in signals {
        let mut word = signal.to_be_bytes();
        word.reverse();
        packed.extend_from_slice(&word);
    }
    keccak256(&packed)
}

/// Leaf the aggregator stores for one proof. Membership proofs carry
/// exactly four public signals; any non-empty list is accepted because
/// externally produced proofs (email proofs) carry their own signal count.
pub fn compute_leaf(public_signals: &[FieldElement], vk_hash: &Bytes32) -> AnonResult<Bytes32> {
    if public_signals.is_empty() {
        return Err(AnonError::InvalidSignal(
            "Cannot compute an aggregation leaf without public signals".into(),
        ));
    }

    let mut preimage = Vec::with_capacity(128);
    preimage.extend_from_slice(&proving_system_id());
    preimage.extend_from_slice(vk_hash.as_bytes());
    preimage.extend_from_slice(&version_hash());
    preimage.extend_from_slice(&public_inputs_hash(public_signals));

    Ok(Bytes32(keccak256(&preimage)))
}

/// Compares a recomputed leaf with the relayer's, ignoring hex case.
pub fn check_leaf(computed: &Bytes32, reported: &str) -> AnonResult<()> {
    if computed.matches_hex(reported) {
        debug!("Aggregation leaf matches relayer: {}", computed);
        return Ok(());
    }
    error!(
        "Aggregation leaf mismatch: computed {}, relayer reported {}",
        computed, reported
    );
    Err(AnonError::AggregationMismatch {
        computed: computed.to_hex(),
        reported: reported.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> Vec<FieldElement> {
        (1..=4).map(FieldElement::from_u64).collect()
    }

    fn vk_hash() -> Bytes32 {
        Bytes32::from_hex("0x34dbbf93056bcae972f337f57a8283fce5f71cfd97de4241e0645c914a3e635f")
            .unwrap()
    }

    #[test]
    fn test_fixed_prefixes() {
        assert_eq!(
            hex::encode(version_hash()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(proving_system_id(), keccak256(b"groth16"));
    }

    #[test]
    fn test_signals_are_byte_reversed() {
        let one = FieldElement::from_u64(1);
        let mut expected = [0u8; 32];
        expected[0] = 1;
        assert_eq!(public_inputs_hash(&[one]), keccak256(&expected));
        assert_ne!(public_inputs_hash(&[one]), keccak256(&one.to_be_bytes()));
    }

    #[test]
    fn test_leaf_layout() {
        let s = signals();
        let leaf = compute_leaf(&s, &vk_hash()).unwrap();

        let mut preimage = Vec::new();
        preimage.extend_from_slice(&keccak256(b"groth16"));
        preimage.extend_from_slice(vk_hash().as_bytes());
        preimage.extend_from_slice(&Sha256::digest(b""));
        preimage.extend_from_slice(&public_inputs_hash(&s));
        assert_eq!(leaf.0, keccak256(&preimage));
    }

    #[test]
    fn test_leaf_deterministic_and_order_sensitive() {
        let s = signals();
        let leaf = compute_leaf(&s, &vk_hash()).unwrap();
        assert_eq!(leaf, compute_leaf(&s, &vk_hash()).unwrap());

        let mut swapped = s.clone();
        swapped.swap(1, 2);
        assert_ne!(leaf, compute_leaf(&swapped, &vk_hash()).unwrap());

        let other_vk = Bytes32([0x11; 32]);
        assert_ne!(leaf, compute_leaf(&s, &other_vk).unwrap());
    }

    #[test]
    fn test_empty_signals_rejected() {
        assert!(compute_leaf(&[], &vk_hash()).is_err());
    }

    #[test]
    fn test_external_signal_counts_accepted() {
        let two: Vec<FieldElement> = signals().into_iter().take(2).collect();
        let mut six = signals();
        six.extend([FieldElement::from_u64(5), FieldElement::from_u64(6)]);

        let leaf_two = compute_leaf(&two, &vk_hash()).unwrap();
        let leaf_six = compute_leaf(&six, &vk_hash()).unwrap();
        assert_ne!(leaf_two, leaf_six);
        assert_ne!(leaf_two, compute_leaf(&signals(), &vk_hash()).unwrap());
    }

    #[test]
    fn test_check_leaf_case_insensitive() {
        let leaf = compute_leaf(&signals(), &vk_hash()).unwrap();
        let upper = format!("0x{}", hex::encode(leaf.0).to_uppercase());
        assert!(check_leaf(&leaf, &upper).is_ok());

        let err = check_leaf(&leaf, &Bytes32([0u8; 32]).to_hex()).unwrap_err();
        assert!(err.is_correctness_alarm());
        assert!(matches!(err, AnonError::AggregationMismatch { .. }));
    }
}
