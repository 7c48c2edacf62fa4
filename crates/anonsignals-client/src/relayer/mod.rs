mod client;
mod http;
mod poll;
mod transport;
mod vk_cache;


pub use client::{RelayerClient, SubmitOptions};
pub use http::HttpRelayer;
pub use poll::{poll_job, Delay, TerminalStatus, TokioDelay};
pub use transport::{
    already_registered_hash, parse_job_status_response, parse_register_vk_response,
    parse_submit_response, JobStatusReply, ProofData, ProofOptions, RegisterVkReply,
    RegisterVkRequest, RelayerTransport, SubmitProofRequest, SubmitReply,
};
pub use vk_cache::VkCache;
