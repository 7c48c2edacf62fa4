use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnonError {
    #[error("Identity mismatch: tracked commitment {stored} does not match derived commitment {derived}")]
    IdentityMismatch { stored: String, derived: String },

    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("Relayer rejected proof: {0}")]
    RelayerRejected(String),

    #[error("Verification timed out after {attempts} polling attempts")]
    VerificationTimeout { attempts: u32 },

    #[error("Aggregation leaf mismatch: computed {computed}, relayer reported {reported}")]
    AggregationMismatch { computed: String, reported: String },

    #[error("On-chain verification unavailable: {0}")]
    OnChainVerificationUnavailable(String),

    #[error("Aggregation artifacts missing: {0}")]
    MissingAggregationArtifacts(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Group is full (capacity {capacity})")]
    GroupFull { capacity: usize },

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnonError {
    /// Whether the failed stage may be retried as-is (re-poll, re-send).
    /// A rejected proof is never retryable with the same proof.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnonError::Network(_) | AnonError::VerificationTimeout { .. })
    }

    /// Errors that point at a hashing/determinism bug or tampering and must
    /// reach the user.
    pub fn is_correctness_alarm(&self) -> bool {
        matches!(
            self,
            AnonError::AggregationMismatch { .. }
                | AnonError::IdentityMismatch { .. }
                | AnonError::Crypto(_)
        )
    }
}

pub type AnonResult<T> = Result<T, AnonError>;
