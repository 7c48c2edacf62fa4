use anonsignals_crypto::{MembershipProver, ProofGenerator};
use anonsignals_types::{AnonError, AnonResult, Bytes32, FieldElement, JobStatus, ProofBundle, SubmissionJob};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use super::action::GroupAction;
use crate::aggregation::{AggregationReport, AggregationVerifier};
use crate::cancellation::CancellationToken;
use crate::identity::IdentityManager;
use crate::membership::{rebuild_group, MemberEntry};
use crate::relayer::{RelayerClient, SubmitOptions, TerminalStatus};

/// Inputs from the membership store for one action.
#[derive(Clone, Debug)]
pub struct ActionRequest {
    pub user_id: String,
    pub action: GroupAction,
    pub members: Vec<MemberEntry>,
    /// The user's commitment as recorded by the membership store, if any.
    pub member_commitment: Option<FieldElement>,
}

/// What the caller persists after a successful action.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReceipt {
    pub job_id: String,
    pub status: JobStatus,
    pub bundle: ProofBundle,
    pub vk_hash: Bytes32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationReport>,
}

/// identity → group → proof → submit → poll → (aggregation check), one
/// action at a time. Actions share nothing mutable except the relayer's
/// verifying-key cache.
pub struct ActionPipeline<P> {
    identities: IdentityManager,
    generator: Arc<ProofGenerator<P>>,
    relayer: RelayerClient,
    verifier: AggregationVerifier,
    vk_hash: Bytes32,
    options: SubmitOptions,
}

impl<P: MembershipProver + 'static> ActionPipeline<P> {
    pub fn new(
        identities: IdentityManager,
        generator: ProofGenerator<P>,
        relayer: RelayerClient,
        verifier: AggregationVerifier,
        vk_hash: Bytes32,
        options: SubmitOptions,
    ) -> Self {
        Self {
            identities,
            generator: Arc::new(generator),
            relayer,
            verifier,
            vk_hash,
            options,
        }
    }

    pub async fn run(&self, request: &ActionRequest, cancel: &CancellationToken) -> AnonResult<ActionReceipt> {
        info!("Running action: {}", request.action);

        let identity = self
            .identities
            .load_or_create(&request.user_id, request.member_commitment.as_ref())?;
        let group = rebuild_group(&request.members)?;
        let (message, scope) = request.action.signals(&group);

        let generator = self.generator.clone();
        let bundle = tokio::task::spawn_blocking(move || {
            generator.generate(&identity, &group, &message, &scope)
        })
        .await
        .map_err(|e| AnonError::Internal(format!("Proof task failed: {}", e)))??;

        if cancel.is_cancelled() {
            info!("Action cancelled before submission");
            return Err(AnonError::Cancelled);
        }

        let proof = serde_json::to_value(&bundle.proof)
            .map_err(|e| AnonError::Serialization(format!("Failed to encode proof: {}", e)))?;
        let job = self
            .relayer
            .submit(&proof, &bundle.public_signals, &self.vk_hash, self.options)
            .await?;

        self.await_job(job, bundle, cancel).await
    }

    /// Polls an already submitted job to completion. Also the way to retry
    /// after `VerificationTimeout`: same job, fresh attempt budget.
    pub async fn await_job(
        &self,
        mut job: SubmissionJob,
        bundle: ProofBundle,
        cancel: &CancellationToken,
    ) -> AnonResult<ActionReceipt> {
        let terminal = self.relayer.poll(&mut job, cancel).await?;
        conclude(&self.verifier, job, terminal, bundle, self.vk_hash).await
    }
}

/// Maps a terminal poll outcome onto the receipt or the matching error.
pub(crate) async fn conclude(
    verifier: &AggregationVerifier,
    job: SubmissionJob,
    terminal: TerminalStatus,
    bundle: ProofBundle,
    vk_hash: Bytes32,
) -> AnonResult<ActionReceipt> {
    let aggregation = match terminal {
        TerminalStatus::Finalized(_) => None,
        TerminalStatus::Aggregated(reply) => Some(
            verifier
                .verify(&reply.raw, &bundle.public_signals, &vk_hash)
                .await?,
        ),
        TerminalStatus::Failed(_) | TerminalStatus::Rejected(_) => {
            error!("Job {} ended {}", job.job_id, job.status);
            return Err(AnonError::RelayerRejected(format!(
                "Job {} ended with status {}",
                job.job_id, job.status
            )));
        }
        TerminalStatus::TimedOut { attempts } => {
            return Err(AnonError::VerificationTimeout { attempts });
        }
    };

    info!("Job {} verified ({})", job.job_id, job.status);
    Ok(ActionReceipt {
        job_id: job.job_id,
        status: job.status,
        bundle,
        vk_hash,
        aggregation,
    })
}
