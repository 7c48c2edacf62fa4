use anonsignals_types::{
    normalize_public_signals, AnonError, AnonResult, Bytes32, FieldElement, JobStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::aggregation::{AggregationReport, AggregationVerifier};
use crate::cancellation::CancellationToken;
use crate::relayer::{RelayerClient, SubmitOptions, TerminalStatus};

const BLUEPRINT_FORMAT: &str = "Invalid blueprint format. Expected: username/blueprint-name@version";

/// An email-proof circuit reference, `user/name@version`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailBlueprint {
    pub github_username: String,
    pub blueprint_name: String,
    pub version: String,
}

impl EmailBlueprint {
    /// Verifying-key cache key.
    pub fn slug(&self) -> String {
        self.to_string()
    }
}

impl FromStr for EmailBlueprint {
    type Err = AnonError;

    fn from_str(s: &str) -> AnonResult<Self> {
        let (user_and_name, version) = match s.split('@').collect::<Vec<_>>().as_slice() {
            [left, right] => (*left, *right),
            _ => return Err(AnonError::Config(BLUEPRINT_FORMAT.into())),
        };
        let (user, name) = match user_and_name.split('/').collect::<Vec<_>>().as_slice() {
            [user, name] => (*user, *name),
            _ => return Err(AnonError::Config(BLUEPRINT_FORMAT.into())),
        };
        if user.is_empty() || name.is_empty() || version.is_empty() {
            return Err(AnonError::Config(BLUEPRINT_FORMAT.into()));
        }

        Ok(Self {
            github_username: user.to_string(),
            blueprint_name: name.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for EmailBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.github_username, self.blueprint_name, self.version)
    }
}

/// What the email-proof SDK hands back. Signals may be strings or numbers.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalProof {
    pub proof: Value,
    pub public_signals: Vec<Value>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerification {
    pub job_id: String,
    pub status: JobStatus,
    pub public_signals: Vec<FieldElement>,
    pub vk_hash: Bytes32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationReport>,
}

/// Canonicalizes the SDK's signals, registers the blueprint's verifying
/// key if needed, submits with `chain_id` and polls to a terminal status.
pub async fn submit_external_proof(
    relayer: &RelayerClient,
    verifier: &AggregationVerifier,
    blueprint: &EmailBlueprint,
    vk: &Value,
    external: &ExternalProof,
    chain_id: Option<u64>,
    cancel: &CancellationToken,
) -> AnonResult<EmailVerification> {
    let public_signals = normalize_public_signals(&external.public_signals)?;
    let vk_hash = relayer.ensure_verification_key(vk, &blueprint.slug()).await?;

    let mut job = relayer
        .submit(&external.proof, &public_signals, &vk_hash, SubmitOptions { chain_id })
        .await?;
    info!("Email proof for {} submitted as job {}", blueprint, job.job_id);

    let terminal = relayer.poll(&mut job, cancel).await?;
    let aggregation = match terminal {
        TerminalStatus::Finalized(_) => None,
        TerminalStatus::Aggregated(reply) => {
            Some(verifier.verify(&reply.raw, &public_signals, &vk_hash).await?)
        }
        TerminalStatus::Failed(_) | TerminalStatus::Rejected(_) => {
            return Err(AnonError::RelayerRejected(format!(
                "Email proof job {} ended with status {}",
                job.job_id, job.status
            )));
        }
        TerminalStatus::TimedOut { attempts } => {
            return Err(AnonError::VerificationTimeout { attempts });
        }
    };

    Ok(EmailVerification {
        job_id: job.job_id,
        status: job.status,
        public_signals,
        vk_hash,
        aggregation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_blueprint_parsing() {
        let blueprint: EmailBlueprint = "zkemail/twitter-verifier@v2".parse().unwrap();
        assert_eq!(blueprint.github_username, "zkemail");
        assert_eq!(blueprint.blueprint_name, "twitter-verifier");
        assert_eq!(blueprint.version, "v2");
        assert_eq!(blueprint.slug(), "zkemail/twitter-verifier@v2");
    }

    #[test]
    fn test_malformed_blueprints_rejected() {
        for bad in [
            "zkemail/twitter",
            "zkemail@v1",
            "a/b/c@v1",
            "a/b@v1@v2",
            "/b@v1",
            "a/@v1",
            "a/b@",
        ] {
            assert!(bad.parse::<EmailBlueprint>().is_err(), "{} accepted", bad);
        }
    }

    proptest! {
        #[test]
        fn prop_blueprint_display_parses_back(
            user in "[a-z0-9-]{1,16}",
            name in "[a-z0-9_-]{1,24}",
            version in "v?[0-9]{1,3}(\\.[0-9]{1,3}){0,2}",
        ) {
            let text = format!("{}/{}@{}", user, name, version);
            let blueprint: EmailBlueprint = text.parse().unwrap();
            prop_assert_eq!(blueprint.slug(), text);
        }
    }
}
