use anonsignals_crypto::{check_leaf, compute_leaf};
use anonsignals_types::{
    AggregationArtifacts, AnonError, AnonResult, Bytes32, FieldElement, U256,
};
use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::artifacts::extract_artifacts;
use super::bindings::ProofAggregation;
use crate::config::AggregationConfig;

/// Read-only Merkle-inclusion check against the aggregation contract.
#[async_trait]
pub trait InclusionChecker: Send + Sync {
    async fn verify_inclusion(&self, artifacts: &AggregationArtifacts) -> AnonResult<bool>;
}

pub struct EthersInclusionChecker {
    contract: ProofAggregation<Provider<Http>>,
}

impl EthersInclusionChecker {
    pub fn new(rpc_url: &str, contract_address: &str) -> AnonResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AnonError::Network(format!("Failed to create provider: {}", e)))?;
        let address: Address = contract_address
            .parse()
            .map_err(|e| AnonError::Config(format!("Invalid aggregation contract address: {}", e)))?;

        info!("Aggregation contract: {:?}", address);
        Ok(Self {
            contract: ProofAggregation::new(address, Arc::new(provider)),
        })
    }
}

#[async_trait]
impl InclusionChecker for EthersInclusionChecker {
    async fn verify_inclusion(&self, artifacts: &AggregationArtifacts) -> AnonResult<bool> {
        let (domain_id, leaf_count, index) = artifacts.inclusion_inputs().ok_or_else(|| {
            AnonError::Contract("domain id, leaf count or leaf index not reported".into())
        })?;
        let path: Vec<[u8; 32]> = artifacts.merkle_path.iter().map(|node| node.0).collect();

        self.contract
            .verify_proof_aggregation(
                U256::from(domain_id),
                U256::from(artifacts.aggregation_id),
                artifacts.leaf.0,
                path,
                U256::from(leaf_count),
                U256::from(index),
            )
            .call()
            .await
            .map_err(|e| AnonError::Contract(format!("verifyProofAggregation failed: {}", e)))
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    pub artifacts: AggregationArtifacts,
    pub computed_leaf: Bytes32,
    /// `None` when no contract is configured or the call failed.
    pub on_chain_verified: Option<bool>,
    /// Advisory only; the relayer has already attested the aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_chain_verification_error: Option<String>,
}

pub struct AggregationVerifier {
    checker: Option<Arc<dyn InclusionChecker>>,
    default_domain_id: Option<u64>,
}

impl AggregationVerifier {
    pub fn new(checker: Option<Arc<dyn InclusionChecker>>, default_domain_id: Option<u64>) -> Self {
        Self {
            checker,
            default_domain_id,
        }
    }

    pub fn from_config(config: &AggregationConfig) -> AnonResult<Self> {
        let checker: Option<Arc<dyn InclusionChecker>> =
            match (&config.rpc_url, &config.contract_address) {
                (Some(rpc), Some(address)) => Some(Arc::new(EthersInclusionChecker::new(rpc, address)?)),
                _ => None,
            };
        Ok(Self::new(checker, config.domain_id))
    }

    pub fn extract(&self, raw: &Value) -> AnonResult<AggregationArtifacts> {
        extract_artifacts(raw, self.default_domain_id).ok_or_else(|| {
            AnonError::MissingAggregationArtifacts(
                "job is Aggregated but the status payload lacks leaf, Merkle path or aggregation id".into(),
            )
        })
    }

    /// Recomputes the leaf from what was submitted and compares it with the
    /// relayer's. A mismatch is returned as an error. The on-chain check
    /// never fails the call; its failure is recorded in the report.
    pub async fn verify(
        &self,
        raw: &Value,
        public_signals: &[FieldElement],
        vk_hash: &Bytes32,
    ) -> AnonResult<AggregationReport> {
        let artifacts = self.extract(raw)?;
        let computed_leaf = compute_leaf(public_signals, vk_hash)?;
        check_leaf(&computed_leaf, &artifacts.leaf.to_hex())?;
        info!(
            "Aggregation {} leaf {} matches",
            artifacts.aggregation_id, computed_leaf
        );

        let mut report = AggregationReport {
            artifacts,
            computed_leaf,
            on_chain_verified: None,
            on_chain_verification_error: None,
        };

        let Some(checker) = &self.checker else {
            return Ok(report);
        };

        if report.artifacts.inclusion_inputs().is_none() {
            let advisory = AnonError::OnChainVerificationUnavailable(
                "relayer did not report domain id, leaf count and leaf index".into(),
            );
            warn!("{}", advisory);
            report.on_chain_verification_error = Some(advisory.to_string());
            return Ok(report);
        }

        match checker.verify_inclusion(&report.artifacts).await {
            Ok(included) => {
                if included {
                    info!("On-chain inclusion verified for aggregation {}", report.artifacts.aggregation_id);
                } else {
                    warn!(
                        "Aggregation contract does not confirm leaf {} in aggregation {}",
                        report.computed_leaf, report.artifacts.aggregation_id
                    );
                }
                report.on_chain_verified = Some(included);
            }
            Err(e) => {
                let advisory = AnonError::OnChainVerificationUnavailable(e.to_string());
                warn!("{}", advisory);
                report.on_chain_verification_error = Some(advisory.to_string());
            }
        }

        Ok(report)
    }
}
