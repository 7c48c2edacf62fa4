use crate::field::FieldElement;
use serde::{Deserialize, Serialize};

pub const PUBLIC_SIGNAL_COUNT: usize = 4;

/// Groth16 proof points in the snarkjs JSON layout (decimal coordinates,
/// projective `"1"` suffix, G2 coordinates as `[c0, c1]` pairs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Points {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    pub protocol: String,
    pub curve: String,
}

/// A membership proof with its public signals, ready for relayer submission.
///
/// `public_signals` is always `[merkleRoot, nullifier, signalHash,
/// externalNullifier]`; the verifier reads them positionally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle {
    pub proof: Groth16Points,
    pub public_signals: [FieldElement; PUBLIC_SIGNAL_COUNT],
    pub merkle_tree_root: FieldElement,
    pub merkle_tree_depth: usize,
    pub nullifier: FieldElement,
    pub signal_hash: FieldElement,
    pub external_nullifier: FieldElement,
}

impl ProofBundle {
    pub fn new(
        proof: Groth16Points,
        merkle_tree_depth: usize,
        merkle_tree_root: FieldElement,
        nullifier: FieldElement,
        signal_hash: FieldElement,
        external_nullifier: FieldElement,
    ) -> Self {
        Self {
            proof,
            public_signals: [merkle_tree_root, nullifier, signal_hash, external_nullifier],
            merkle_tree_root,
            merkle_tree_depth,
            nullifier,
            signal_hash,
            external_nullifier,
        }
    }

    pub fn public_signal_strings(&self) -> Vec<String> {
        self.public_signals.iter().map(|s| s.to_string()).collect()
    }

    /// Named fields and the positional signals must describe the same values.
    pub fn is_consistent(&self) -> bool {
        self.public_signals
            == [
                self.merkle_tree_root,
                self.nullifier,
                self.signal_hash,
                self.external_nullifier,
            ]
    }
}
