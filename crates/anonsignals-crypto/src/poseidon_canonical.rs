//! Canonical Poseidon over the BN254 scalar field.
//!
//! Identity commitments, nullifiers and every Merkle node in a group tree go
//! through this one configuration; the membership circuit uses the same
//! parameters through `PoseidonSpongeVar`.
//!
//! ## Parameters
//! - Field: BN254 Fr
//! - Width: 3 (rate=2, capacity=1)
//! - Full rounds: 8, partial rounds: 57
//! - S-box: x^5
//! - Round constants: Grain LFSR (arkworks `find_poseidon_ark_and_mds`)
//!
//! Output is the first squeezed element.

use anonsignals_types::{FieldElement, FIELD_BYTES};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::{BigInteger, PrimeField};
use std::sync::OnceLock;

static CANONICAL_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

pub fn canonical_config() -> &'static PoseidonConfig<Fr> {
    CANONICAL_CONFIG.get_or_init(|| {
        let rate = 2;
        let alpha = 5u64;
        let full_rounds = 8;
        let partial_rounds = 57;
        let field_bits = Fr::MODULUS_BIT_SIZE as u64;

        let (ark, mds) =
            find_poseidon_ark_and_mds::<Fr>(field_bits, rate, full_rounds, partial_rounds, 0);

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha,
            ark,
            mds,
            rate,
            capacity: 1,
        }
    })
}

pub fn poseidon_hash_fields(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(canonical_config());
    for input in inputs {
        sponge.absorb(input);
    }
    let output: Vec<Fr> = sponge.squeeze_field_elements(1);
    output[0]
}

pub fn poseidon_hash2_fields(left: Fr, right: Fr) -> Fr {
    poseidon_hash_fields(&[left, right])
}

/// Reduces a 256-bit value into the scalar field.
pub fn fr_from_element(value: &FieldElement) -> Fr {
    Fr::from_be_bytes_mod_order(&value.to_be_bytes())
}

pub fn element_from_fr(value: &Fr) -> FieldElement {
    let be = value.into_bigint().to_bytes_be();
    let mut bytes = [0u8; FIELD_BYTES];
    bytes[FIELD_BYTES - be.len()..].copy_from_slice(&be);
    FieldElement::from_be_bytes(bytes)
}

/// Poseidon over 256-bit values; inputs at or above the modulus are reduced.
pub fn poseidon_hash(inputs: &[FieldElement]) -> FieldElement {
    let fields: Vec<Fr> = inputs.iter().map(fr_from_element).collect();
    element_from_fr(&poseidon_hash_fields(&fields))
}

/// Whether the value is a canonical (already reduced) scalar field element.
pub fn is_canonical(value: &FieldElement) -> bool {
    element_from_fr(&fr_from_element(value)) == *value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic_and_ordered() {
        let a = Fr::from(12345u64);
        let b = Fr::from(67890u64);

        assert_eq!(poseidon_hash2_fields(a, b), poseidon_hash2_fields(a, b));
        assert_ne!(poseidon_hash2_fields(a, b), poseidon_hash2_fields(b, a));
    }

    #[test]
    fn test_arity_matters() {
        let a = Fr::from(7u64);
        assert_ne!(poseidon_hash_fields(&[a]), poseidon_hash_fields(&[a, Fr::from(0u64)]));
    }

    #[test]
    fn test_element_conversion() {
        let value = FieldElement::from_u64(0xdead_beef);
        assert_eq!(element_from_fr(&fr_from_element(&value)), value);
        assert!(is_canonical(&value));

        let too_big = FieldElement::from_be_bytes([0xff; 32]);
        assert!(!is_canonical(&too_big));
    }

    #[test]
    fn test_element_interface_matches_field_interface() {
        let a = FieldElement::from_u64(1);
        let b = FieldElement::from_u64(2);
        let expected = poseidon_hash2_fields(Fr::from(1u64), Fr::from(2u64));
        assert_eq!(poseidon_hash(&[a, b]), element_from_fr(&expected));
    }
}
