#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod aggregation;
pub mod circuit;
pub mod generator;
pub mod group;
pub mod hasher;
pub mod identity;
pub mod poseidon_canonical;
pub mod prover;
pub mod snarkjs;

pub use aggregation::{check_leaf, compute_leaf, proving_system_id, version_hash};
pub use generator::ProofGenerator;
pub use group::{Group, GroupSnapshot, MerkleProof};
pub use hasher::{hash_bytes, hash_field, hash_signal, hash_string, keccak256, normalize_text};
pub use identity::{decrypt_secret, derive_identity, encrypt_secret, Identity};
pub use poseidon_canonical::{canonical_config, poseidon_hash, poseidon_hash_fields};
pub use prover::{Groth16MembershipProver, MembershipProof, MembershipProver};
