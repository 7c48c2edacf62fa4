#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod aggregation;
pub mod cancellation;
pub mod config;
pub mod http_client;
pub mod identity;
pub mod membership;
pub mod pipeline;
pub mod relayer;
pub mod storage;

pub use aggregation::{AggregationReport, AggregationVerifier, EthersInclusionChecker, InclusionChecker};
pub use cancellation::{CancelHandle, CancellationToken};
pub use config::{ClientConfig, RedactedConfig};
pub use http_client::{HttpClient, JsonResponse};
pub use identity::IdentityManager;
pub use membership::{ordered_commitments, rebuild_group, MemberEntry};
pub use pipeline::{
    submit_external_proof, ActionPipeline, ActionReceipt, ActionRequest, EmailBlueprint,
    EmailVerification, ExternalProof, GroupAction,
};
pub use relayer::{
    HttpRelayer, RelayerClient, RelayerTransport, SubmitOptions, TerminalStatus, VkCache,
};
pub use storage::{IdentityStore, MemoryIdentityStore, SledIdentityStore, StoredIdentity};
