use anonsignals_types::{
    AnonError, AnonResult, Bytes32, JobStatus, PROOF_CURVE_BN128, PROOF_LIBRARY_SNARKJS,
    PROOF_TYPE_GROTH16,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const REGISTER_VK_FAILED: &str = "REGISTER_VK_FAILED";
const ALREADY_REGISTERED: &str = "already registered";
const OPTIMISTIC_SUCCESS: &str = "success";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOptions {
    pub library: String,
    pub curve: String,
}

impl Default for ProofOptions {
    fn default() -> Self {
        Self {
            library: PROOF_LIBRARY_SNARKJS.into(),
            curve: PROOF_CURVE_BN128.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVkRequest {
    pub proof_type: String,
    pub proof_options: ProofOptions,
    pub vk: Value,
}

impl RegisterVkRequest {
    pub fn groth16(vk: Value) -> Self {
        Self {
            proof_type: PROOF_TYPE_GROTH16.into(),
            proof_options: ProofOptions::default(),
            vk,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofData {
    pub proof: Value,
    pub public_signals: Vec<String>,
    /// Hash of the already registered verifying key.
    pub vk: Bytes32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProofRequest {
    pub proof_type: String,
    pub vk_registered: bool,
    pub proof_options: ProofOptions,
    pub proof_data: ProofData,
    /// Present only when aggregation onto a chain is wanted; without it the
    /// relayer finalizes the proof standalone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl SubmitProofRequest {
    pub fn groth16(proof: Value, public_signals: Vec<String>, vk_hash: Bytes32, chain_id: Option<u64>) -> Self {
        Self {
            proof_type: PROOF_TYPE_GROTH16.into(),
            vk_registered: true,
            proof_options: ProofOptions::default(),
            proof_data: ProofData {
                proof,
                public_signals,
                vk: vk_hash,
            },
            chain_id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterVkReply {
    Registered(Bytes32),
    AlreadyRegistered(Bytes32),
}

impl RegisterVkReply {
    pub fn vk_hash(&self) -> Bytes32 {
        match self {
            RegisterVkReply::Registered(hash) | RegisterVkReply::AlreadyRegistered(hash) => *hash,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SubmitReply {
    pub job_id: String,
    pub optimistic_verify: String,
    pub raw: Value,
}

impl SubmitReply {
    pub fn optimistic_success(&self) -> bool {
        self.optimistic_verify == OPTIMISTIC_SUCCESS
    }
}

#[derive(Clone, Debug)]
pub struct JobStatusReply {
    pub job_id: String,
    pub status: JobStatus,
    pub raw: Value,
}

/// The three relayer calls. `HttpRelayer` is the real implementation; tests
/// substitute in-process fakes.
#[async_trait]
pub trait RelayerTransport: Send + Sync {
    async fn register_vk(&self, request: &RegisterVkRequest) -> AnonResult<RegisterVkReply>;

    async fn submit_proof(&self, request: &SubmitProofRequest) -> AnonResult<SubmitReply>;

    async fn job_status(&self, job_id: &str) -> AnonResult<JobStatusReply>;
}

fn error_detail(status: u16, body: &Value) -> String {
    let message = body
        .get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| match body {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    format!("HTTP {}: {}", status, message)
}

/// Message for a submission whose optimistic verification did not succeed.
pub(crate) fn optimistic_failure(verdict: &str, body: &Value) -> String {
    match body
        .get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
    {
        Some(reason) => format!("Optimistic verification failed ({:?}): {}", verdict, reason),
        None => format!("Optimistic verification failed ({:?})", verdict),
    }
}

fn hash_field(body: &Value, pointer: &str) -> Option<AnonResult<Bytes32>> {
    body.pointer(pointer).and_then(Value::as_str).map(Bytes32::from_hex)
}

/// Recovers the vk hash from a "key already registered" error body. Relies on
/// the relayer's error schema; any other shape is not recognised.
pub fn already_registered_hash(body: &Value) -> Option<Bytes32> {
    let code = body.get("code").and_then(Value::as_str)?;
    let message = body.get("message").and_then(Value::as_str)?;
    if code != REGISTER_VK_FAILED || !message.contains(ALREADY_REGISTERED) {
        return None;
    }
    hash_field(body, "/meta/vkHash")?.ok()
}

pub fn parse_register_vk_response(status: u16, body: &Value) -> AnonResult<RegisterVkReply> {
    if (200..300).contains(&status) {
        let hash = hash_field(body, "/vkHash")
            .or_else(|| hash_field(body, "/meta/vkHash"))
            .ok_or_else(|| {
                AnonError::Serialization("register-vk response carries no vkHash".into())
            })??;
        return Ok(RegisterVkReply::Registered(hash));
    }

    match already_registered_hash(body) {
        Some(hash) => Ok(RegisterVkReply::AlreadyRegistered(hash)),
        None if status >= 500 => Err(AnonError::Network(format!(
            "Failed to register verifying key: {}",
            error_detail(status, body)
        ))),
        None => Err(AnonError::RelayerRejected(format!(
            "Failed to register verifying key: {}",
            error_detail(status, body)
        ))),
    }
}

fn job_id_of(body: &Value) -> Option<String> {
    match body.get("jobId")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_submit_response(status: u16, body: &Value) -> AnonResult<SubmitReply> {
    if status >= 500 {
        return Err(AnonError::Network(format!(
            "Failed to submit proof: {}",
            error_detail(status, body)
        )));
    }
    if !(200..300).contains(&status) {
        return Err(AnonError::RelayerRejected(format!(
            "Failed to submit proof: {}",
            error_detail(status, body)
        )));
    }

    let optimistic_verify = body
        .get("optimisticVerify")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let job_id = match job_id_of(body) {
        Some(job_id) => job_id,
        None if optimistic_verify != OPTIMISTIC_SUCCESS => {
            return Err(AnonError::RelayerRejected(optimistic_failure(
                &optimistic_verify,
                body,
            )))
        }
        None => {
            return Err(AnonError::Serialization(
                "submit-proof response carries no jobId".into(),
            ))
        }
    };

    Ok(SubmitReply {
        job_id,
        optimistic_verify,
        raw: body.clone(),
    })
}

pub fn parse_job_status_response(job_id: &str, status: u16, body: &Value) -> AnonResult<JobStatusReply> {
    if !(200..300).contains(&status) {
        return Err(AnonError::Network(format!(
            "Failed to check job status: {}",
            error_detail(status, body)
        )));
    }

    let raw_status = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| AnonError::Serialization("job-status response carries no status".into()))?;

    Ok(JobStatusReply {
        job_id: job_id.to_string(),
        status: JobStatus::from_relayer(raw_status),
        raw: body.clone(),
    })
}
