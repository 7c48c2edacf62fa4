#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod job;
pub mod proof;
pub mod signal;

pub use error::{AnonError, AnonResult};
pub use ethers::types::U256;
pub use field::{Bytes32, FieldElement, FIELD_BYTES};
pub use job::{AggregationArtifacts, JobStatus, SubmissionJob};
pub use proof::{Groth16Points, ProofBundle, PUBLIC_SIGNAL_COUNT};
pub use signal::{normalize_public_signals, NormalizableSignal, Signal};

/// Depth of every membership tree; fixed by the membership circuit.
pub const GROUP_TREE_DEPTH: usize = 20;

/// Maximum number of members a depth-20 tree can hold.
pub const GROUP_CAPACITY: usize = 1 << GROUP_TREE_DEPTH;

pub const PROOF_TYPE_GROTH16: &str = "groth16";

pub const PROOF_LIBRARY_SNARKJS: &str = "snarkjs";

pub const PROOF_CURVE_BN128: &str = "bn128";
