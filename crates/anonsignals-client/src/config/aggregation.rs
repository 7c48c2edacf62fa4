use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub rpc_url: Option<String>,
    /// Aggregation contract exposing `verifyProofAggregation`.
    pub contract_address: Option<String>,
    /// Used when the relayer omits `domainId` from the job status.
    pub domain_id: Option<u64>,
}

impl AggregationConfig {
    pub fn on_chain_enabled(&self) -> bool {
        self.rpc_url.is_some() && self.contract_address.is_some()
    }
}
