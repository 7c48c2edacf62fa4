use crate::error::{AnonError, AnonResult};
use ethers::types::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const FIELD_BYTES: usize = 32;

/// An unsigned 256-bit value as it travels between the prover, the relayer
/// and the aggregation contract. Decimal on the wire, big-endian in bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(pub U256);

impl FieldElement {
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub fn from_be_bytes(bytes: [u8; FIELD_BYTES]) -> Self {
        Self(U256::from_big_endian(&bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; FIELD_BYTES] {
        let mut out = [0u8; FIELD_BYTES];
        self.0.to_big_endian(&mut out);
        out
    }

    pub fn from_dec_str(s: &str) -> AnonResult<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AnonError::InvalidSignal(format!("Not a decimal integer: {:?}", s)));
        }
        U256::from_dec_str(s)
            .map(Self)
            .map_err(|e| AnonError::InvalidSignal(format!("Decimal value out of range: {:?}", e)))
    }

    pub fn from_hex(s: &str) -> AnonResult<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() || digits.len() > FIELD_BYTES * 2 {
            return Err(AnonError::InvalidSignal(format!("Invalid hex length: {:?}", s)));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AnonError::InvalidSignal(format!("Not a hex integer: {:?}", s)));
        }
        U256::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| AnonError::InvalidSignal(format!("Hex value out of range: {}", e)))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_be_bytes()))
    }

    pub fn as_u256(&self) -> &U256 {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<U256> for FieldElement {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for FieldElement {
    type Err = AnonError;

    /// Accepts decimal, or hex with a `0x` prefix.
    fn from_str(s: &str) -> AnonResult<Self> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = FieldElement;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal string, 0x-prefixed hex string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldElement, E> {
                Ok(FieldElement::from_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldElement, E> {
                FieldElement::from_str(v.trim()).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FieldVisitor)
    }
}

/// A fixed 32-byte value rendered as 0x-prefixed hex: vk hashes, aggregation
/// leaves and Merkle path nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    pub fn from_hex(s: &str) -> AnonResult<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| AnonError::Serialization(format!("Invalid hex {:?}: {}", s, e)))?;
        if bytes.len() != 32 {
            return Err(AnonError::Serialization(format!(
                "Expected 32 bytes, got {} in {:?}",
                bytes.len(),
                s
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Case-insensitive comparison against a hex string, with or without prefix.
    pub fn matches_hex(&self, other: &str) -> bool {
        let ours = hex::encode(self.0);
        let theirs = other
            .strip_prefix("0x")
            .or_else(|| other.strip_prefix("0X"))
            .unwrap_or(other);
        ours.eq_ignore_ascii_case(theirs)
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", self.to_hex())
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Bytes32::from_hex(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_and_hex_agree() {
        let dec = FieldElement::from_str("255").unwrap();
        let hex = FieldElement::from_str("0xff").unwrap();
        assert_eq!(dec, hex);
        assert_eq!(dec.to_string(), "255");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(FieldElement::from_str("").is_err());
        assert!(FieldElement::from_str("-1").is_err());
        assert!(FieldElement::from_str("1.5").is_err());
        assert!(FieldElement::from_str("0xzz").is_err());
        assert!(FieldElement::from_hex(&format!("0x{}", "f".repeat(65))).is_err());
    }

    #[test]
    fn test_be_bytes_layout() {
        let one = FieldElement::from_u64(1);
        let bytes = one.to_be_bytes();
        assert_eq!(bytes[31], 1);
        assert!(bytes[..31].iter().all(|b| *b == 0));
        assert_eq!(FieldElement::from_be_bytes(bytes), one);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let value = FieldElement::from_u64(42);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"42\"");

        let from_number: FieldElement = serde_json::from_str("42").unwrap();
        let from_hex: FieldElement = serde_json::from_str("\"0x2a\"").unwrap();
        assert_eq!(from_number, value);
        assert_eq!(from_hex, value);
    }

    #[test]
    fn test_bytes32_case_insensitive_match() {
        let b = Bytes32([0xab; 32]);
        assert!(b.matches_hex(&format!("0x{}", "AB".repeat(32))));
        assert!(b.matches_hex(&"ab".repeat(32)));
        assert!(!b.matches_hex(&"ac".repeat(32)));
        assert!(Bytes32::from_hex("0x1234").is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_decimal_and_hex_forms_agree(bytes in proptest::array::uniform32(proptest::prelude::any::<u8>())) {
            let value = FieldElement::from_be_bytes(bytes);
            let from_dec: FieldElement = value.to_string().parse().unwrap();
            let from_hex: FieldElement = value.to_hex().parse().unwrap();
            proptest::prop_assert_eq!(from_dec, value);
            proptest::prop_assert_eq!(from_hex, value);
            proptest::prop_assert_eq!(value.to_be_bytes(), bytes);
        }
    }
}
