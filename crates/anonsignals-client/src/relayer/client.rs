use anonsignals_types::{AnonError, AnonResult, Bytes32, FieldElement, SubmissionJob};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::http::HttpRelayer;
use super::poll::{poll_job, Delay, TerminalStatus, TokioDelay};
use super::transport::{
    optimistic_failure, JobStatusReply, RegisterVkReply, RegisterVkRequest, RelayerTransport,
    SubmitProofRequest,
};
use super::vk_cache::VkCache;
use crate::cancellation::CancellationToken;
use crate::config::{ClientConfig, PollingConfig};

#[derive(Clone, Copy, Debug, Default)]
pub struct SubmitOptions {
    /// Requests aggregation onto this chain.
    pub chain_id: Option<u64>,
}

#[derive(Clone)]
pub struct RelayerClient {
    transport: Arc<dyn RelayerTransport>,
    delay: Arc<dyn Delay>,
    vk_cache: VkCache,
    polling: PollingConfig,
}

impl RelayerClient {
    pub fn new(transport: Arc<dyn RelayerTransport>, vk_cache: VkCache, polling: PollingConfig) -> Self {
        Self {
            transport,
            delay: Arc::new(TokioDelay),
            vk_cache,
            polling,
        }
    }

    pub fn from_config(config: &ClientConfig, vk_cache: VkCache) -> AnonResult<Self> {
        config.require_api_key()?;
        let transport = HttpRelayer::from_config(&config.relayer)?;
        Ok(Self::new(Arc::new(transport), vk_cache, config.polling.clone()))
    }

    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn vk_cache(&self) -> &VkCache {
        &self.vk_cache
    }

    /// Registers `vk` once per `slug`. An "already registered" reply is
    /// treated as success and its hash cached like a fresh registration.
    pub async fn ensure_verification_key(&self, vk: &Value, slug: &str) -> AnonResult<Bytes32> {
        if let Some(hash) = self.vk_cache.get(slug) {
            debug!("Verifying key for {} cached: {}", slug, hash);
            return Ok(hash);
        }

        let reply = self
            .transport
            .register_vk(&RegisterVkRequest::groth16(vk.clone()))
            .await?;
        match reply {
            RegisterVkReply::Registered(hash) => {
                info!("Registered verifying key for {}: {}", slug, hash)
            }
            RegisterVkReply::AlreadyRegistered(hash) => {
                info!("Verifying key for {} already registered: {}", slug, hash)
            }
        }

        let hash = reply.vk_hash();
        self.vk_cache.insert(slug, hash);
        Ok(hash)
    }

    /// Submits a proof and checks the synchronous optimistic verdict. A
    /// non-success verdict fails here; the job is never polled.
    pub async fn submit(
        &self,
        proof: &Value,
        public_signals: &[FieldElement],
        vk_hash: &Bytes32,
        options: SubmitOptions,
    ) -> AnonResult<SubmissionJob> {
        let request = SubmitProofRequest::groth16(
            proof.clone(),
            public_signals.iter().map(|s| s.to_string()).collect(),
            *vk_hash,
            options.chain_id,
        );

        let reply = self.transport.submit_proof(&request).await?;
        if !reply.optimistic_success() {
            error!(
                "Optimistic verification failed for job {}: {:?}",
                reply.job_id, reply.optimistic_verify
            );
            return Err(AnonError::RelayerRejected(optimistic_failure(
                &reply.optimistic_verify,
                &reply.raw,
            )));
        }

        info!(
            "Proof submitted as job {} (aggregation: {})",
            reply.job_id,
            options.chain_id.map_or("none".to_string(), |c| format!("chain {}", c))
        );
        Ok(SubmissionJob::submitted(reply.job_id))
    }

    pub async fn poll(&self, job: &mut SubmissionJob, cancel: &CancellationToken) -> AnonResult<TerminalStatus> {
        self.poll_with(job, &self.polling, cancel).await
    }

    pub async fn poll_with(
        &self,
        job: &mut SubmissionJob,
        policy: &PollingConfig,
        cancel: &CancellationToken,
    ) -> AnonResult<TerminalStatus> {
        poll_job(self.transport.as_ref(), self.delay.as_ref(), job, policy, cancel).await
    }

    /// One status fetch, no polling.
    pub async fn status(&self, job_id: &str) -> AnonResult<JobStatusReply> {
        self.transport.job_status(job_id).await
    }
}
