use crate::field::Bytes32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relayer-side job state, plus the locally produced `TimedOut`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Any non-terminal relayer status; the raw string is kept for logging.
    Pending(String),
    Finalized,
    Aggregated,
    Failed,
    Rejected,
    TimedOut,
}

impl JobStatus {
    pub fn from_relayer(status: &str) -> Self {
        match status {
            "Finalized" => JobStatus::Finalized,
            "Aggregated" => JobStatus::Aggregated,
            "Failed" => JobStatus::Failed,
            "Rejected" => JobStatus::Rejected,
            other => JobStatus::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Finalized | JobStatus::Aggregated)
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Rejected)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending(raw) => write!(f, "Pending({})", raw),
            JobStatus::Finalized => write!(f, "Finalized"),
            JobStatus::Aggregated => write!(f, "Aggregated"),
            JobStatus::Failed => write!(f, "Failed"),
            JobStatus::Rejected => write!(f, "Rejected"),
            JobStatus::TimedOut => write!(f, "TimedOut"),
        }
    }
}

/// Local mirror of a relayer job. The relayer owns the state; this only
/// records what polling has observed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionJob {
    pub job_id: String,
    pub status: JobStatus,
    pub observations: u32,
}

impl SubmissionJob {
    pub fn submitted(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending("Submitted".into()),
            observations: 0,
        }
    }

    /// Records a polled status. Returns whether the status changed. Once a
    /// terminal status has been seen later observations are ignored.
    pub fn observe(&mut self, status: JobStatus) -> bool {
        self.observations += 1;
        if self.status.is_terminal() || self.status == status {
            return false;
        }
        self.status = status;
        true
    }
}

/// Merkle-aggregation metadata reported by the relayer for an `Aggregated` job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationArtifacts {
    pub aggregation_id: u64,
    pub domain_id: Option<u64>,
    pub leaf: Bytes32,
    pub merkle_path: Vec<Bytes32>,
    pub leaf_count: Option<u64>,
    pub index: Option<u64>,
    pub tree_depth: Option<u64>,
}

impl AggregationArtifacts {
    /// `(domain_id, leaf_count, index)`, present only when the payload
    /// carried everything the on-chain inclusion check takes.
    pub fn inclusion_inputs(&self) -> Option<(u64, u64, u64)> {
        Some((self.domain_id?, self.leaf_count?, self.index?))
    }
}
