//! Canonical field hashing for messages and scopes.
//!
//! `hash = keccak256(bytes) >> 8`, so every output is below 2^248 and fits
//! inside the BN254 scalar field without reduction. Numbers are hashed from
//! their 32-byte big-endian encoding, text from its normalized UTF-8 bytes.

use anonsignals_types::{FieldElement, Signal, FIELD_BYTES};
use sha3::{Digest, Keccak256};
use unicode_normalization::UnicodeNormalization;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// keccak256 of raw bytes, shifted right by one byte.
pub fn hash_bytes(data: &[u8]) -> FieldElement {
    let digest = keccak256(data);
    let mut shifted = [0u8; FIELD_BYTES];
    shifted[1..].copy_from_slice(&digest[..FIELD_BYTES - 1]);
    FieldElement::from_be_bytes(shifted)
}

pub fn hash_field(value: &FieldElement) -> FieldElement {
    hash_bytes(&value.to_be_bytes())
}

/// NFKC, CRLF to LF, then trim.
pub fn normalize_text(s: &str) -> String {
    let composed: String = s.nfkc().collect();
    composed.replace("\r\n", "\n").trim().to_string()
}

pub fn hash_string(s: &str) -> FieldElement {
    hash_bytes(normalize_text(s).as_bytes())
}

pub fn hash_signal(signal: &Signal) -> FieldElement {
    match signal {
        Signal::Text(s) => hash_string(s),
        Signal::Number(n) => hash_field(n),
    }
}
