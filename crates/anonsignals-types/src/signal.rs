use crate::error::{AnonError, AnonResult};
use crate::field::FieldElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A message or scope handed to the prover. Text is normalized and hashed
/// as UTF-8; numbers are hashed from their 32-byte big-endian encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Signal {
    Text(String),
    Number(FieldElement),
}

impl Signal {
    pub fn text(s: impl Into<String>) -> Self {
        Signal::Text(s.into())
    }
}

impl From<&str> for Signal {
    fn from(s: &str) -> Self {
        Signal::Text(s.to_string())
    }
}

impl From<String> for Signal {
    fn from(s: String) -> Self {
        Signal::Text(s)
    }
}

impl From<FieldElement> for Signal {
    fn from(value: FieldElement) -> Self {
        Signal::Number(value)
    }
}

impl From<u64> for Signal {
    fn from(value: u64) -> Self {
        Signal::Number(FieldElement::from_u64(value))
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Text(s) => write!(f, "{:?}", s),
            Signal::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Anything an external prover may hand back as a public signal.
///
/// Strings are trimmed and read as decimal or `0x` hex, integers are taken
/// as-is. Everything else is rejected rather than coerced.
pub trait NormalizableSignal {
    fn normalize_signal(&self) -> AnonResult<FieldElement>;
}

impl NormalizableSignal for str {
    fn normalize_signal(&self) -> AnonResult<FieldElement> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return Err(AnonError::InvalidSignal("Empty public signal value".into()));
        }
        trimmed.parse()
    }
}

impl NormalizableSignal for String {
    fn normalize_signal(&self) -> AnonResult<FieldElement> {
        self.as_str().normalize_signal()
    }
}

impl NormalizableSignal for u64 {
    fn normalize_signal(&self) -> AnonResult<FieldElement> {
        Ok(FieldElement::from_u64(*self))
    }
}

impl NormalizableSignal for FieldElement {
    fn normalize_signal(&self) -> AnonResult<FieldElement> {
        Ok(*self)
    }
}

impl NormalizableSignal for serde_json::Value {
    fn normalize_signal(&self) -> AnonResult<FieldElement> {
        match self {
            serde_json::Value::String(s) => s.normalize_signal(),
            serde_json::Value::Number(n) => n.as_u64().map(FieldElement::from_u64).ok_or_else(|| {
                AnonError::InvalidSignal(format!("Public signal is not an unsigned integer: {}", n))
            }),
            other => Err(AnonError::InvalidSignal(format!(
                "Unsupported public signal value: {}",
                other
            ))),
        }
    }
}

pub fn normalize_public_signals<T: NormalizableSignal>(signals: &[T]) -> AnonResult<Vec<FieldElement>> {
    signals
        .iter()
        .enumerate()
        .map(|(i, s)| {
            s.normalize_signal().map_err(|e| match e {
                AnonError::InvalidSignal(msg) => {
                    AnonError::InvalidSignal(format!("public signal #{}: {}", i, msg))
                }
                other => other,
            })
        })
        .collect()
}
