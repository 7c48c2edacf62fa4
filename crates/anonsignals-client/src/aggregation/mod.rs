mod artifacts;
mod bindings;
mod verifier;

pub use artifacts::extract_artifacts;
pub use bindings::ProofAggregation;
pub use verifier::{AggregationReport, AggregationVerifier, EthersInclusionChecker, InclusionChecker};
