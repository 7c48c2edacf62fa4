use anonsignals_types::{AnonError, AnonResult, JobStatus, SubmissionJob};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::transport::{JobStatusReply, RelayerTransport};
use crate::cancellation::CancellationToken;
use crate::config::PollingConfig;

/// Wait between poll attempts. Injected so tests need not sleep.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How a polled job ended. Relayer outcomes carry the final status payload.
#[derive(Clone, Debug)]
pub enum TerminalStatus {
    /// Accepted standalone, no aggregation.
    Finalized(JobStatusReply),
    /// Accepted and folded into an aggregation batch.
    Aggregated(JobStatusReply),
    Failed(JobStatusReply),
    Rejected(JobStatusReply),
    /// Attempts exhausted while the job was still pending; outcome unknown.
    TimedOut { attempts: u32 },
}

impl TerminalStatus {
    pub fn status(&self) -> JobStatus {
        match self {
            TerminalStatus::Finalized(_) => JobStatus::Finalized,
            TerminalStatus::Aggregated(_) => JobStatus::Aggregated,
            TerminalStatus::Failed(_) => JobStatus::Failed,
            TerminalStatus::Rejected(_) => JobStatus::Rejected,
            TerminalStatus::TimedOut { .. } => JobStatus::TimedOut,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    pub fn reply(&self) -> Option<&JobStatusReply> {
        match self {
            TerminalStatus::Finalized(r)
            | TerminalStatus::Aggregated(r)
            | TerminalStatus::Failed(r)
            | TerminalStatus::Rejected(r) => Some(r),
            TerminalStatus::TimedOut { .. } => None,
        }
    }
}

/// Polls `job` until the relayer reports a terminal status or
/// `policy.max_attempts` fetches have been made. Sleeps only between
/// attempts. Cancellation stops the loop at the next await point.
pub async fn poll_job(
    transport: &dyn RelayerTransport,
    delay: &dyn Delay,
    job: &mut SubmissionJob,
    policy: &PollingConfig,
    cancel: &CancellationToken,
) -> AnonResult<TerminalStatus> {
    let mut cancel = cancel.clone();
    let max_attempts = policy.max_attempts;

    for attempt in 1..=max_attempts {
        if cancel.is_cancelled() {
            info!("Polling for job {} cancelled", job.job_id);
            return Err(AnonError::Cancelled);
        }

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Polling for job {} cancelled", job.job_id);
                return Err(AnonError::Cancelled);
            }
            reply = transport.job_status(&job.job_id) => reply?,
        };

        info!(
            "Job {} status (attempt {}/{}): {}",
            job.job_id, attempt, max_attempts, reply.status
        );
        job.observe(reply.status.clone());

        match reply.status {
            JobStatus::Finalized => return Ok(TerminalStatus::Finalized(reply)),
            JobStatus::Aggregated => return Ok(TerminalStatus::Aggregated(reply)),
            JobStatus::Failed => return Ok(TerminalStatus::Failed(reply)),
            JobStatus::Rejected => return Ok(TerminalStatus::Rejected(reply)),
            JobStatus::Pending(_) | JobStatus::TimedOut => {}
        }

        if attempt < max_attempts {
            debug!("Next poll for job {} in {:?}", job.job_id, policy.interval());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Polling for job {} cancelled", job.job_id);
                    return Err(AnonError::Cancelled);
                }
                _ = delay.sleep(policy.interval()) => {}
            }
        }
    }

    warn!(
        "Job {} still pending after {} attempts",
        job.job_id, max_attempts
    );
    job.observe(JobStatus::TimedOut);
    Ok(TerminalStatus::TimedOut { attempts: max_attempts })
}
