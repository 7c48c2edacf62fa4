use anonsignals_types::{AnonResult, AnonError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::transport::{
    parse_job_status_response, parse_register_vk_response, parse_submit_response, JobStatusReply,
    RegisterVkReply, RegisterVkRequest, RelayerTransport, SubmitProofRequest, SubmitReply,
};
use crate::config::RelayerConfig;
use crate::http_client::HttpClient;

/// Relayer reached over HTTPS. The API key is a path segment, so request
/// URLs are never logged.
pub struct HttpRelayer {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl HttpRelayer {
    pub fn new(http: HttpClient, base_url: &str, api_key: &str) -> AnonResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AnonError::Config("Relayer API key is empty".into()));
        }
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn from_config(config: &RelayerConfig) -> AnonResult<Self> {
        let http = HttpClient::new(
            Duration::from_secs(config.request_timeout_secs),
            config.proxy.as_deref(),
        )?;
        Self::new(http, &config.url, &config.api_key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, path, self.api_key)
    }
}

#[async_trait]
impl RelayerTransport for HttpRelayer {
    async fn register_vk(&self, request: &RegisterVkRequest) -> AnonResult<RegisterVkReply> {
        let response = self
            .http
            .post_json(&self.endpoint("register-vk"), "register-vk", request)
            .await?;
        parse_register_vk_response(response.status, &response.body)
    }

    async fn submit_proof(&self, request: &SubmitProofRequest) -> AnonResult<SubmitReply> {
        let response = self
            .http
            .post_json(&self.endpoint("submit-proof"), "submit-proof", request)
            .await?;
        parse_submit_response(response.status, &response.body)
    }

    async fn job_status(&self, job_id: &str) -> AnonResult<JobStatusReply> {
        let url = format!("{}/{}", self.endpoint("job-status"), job_id);
        debug!("Fetching status for job {}", job_id);
        let response = self.http.get_json(&url, "job-status").await?;
        parse_job_status_response(job_id, response.status, &response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relayer(base: &str) -> HttpRelayer {
        let http = HttpClient::new(Duration::from_secs(1), None).unwrap();
        HttpRelayer::new(http, base, "key-123").unwrap()
    }

    #[test]
    fn test_endpoint_layout() {
        let r = relayer("https://relayer.example/api/v1/");
        assert_eq!(r.endpoint("register-vk"), "https://relayer.example/api/v1/register-vk/key-123");
        assert_eq!(r.endpoint("submit-proof"), "https://relayer.example/api/v1/submit-proof/key-123");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let http = HttpClient::new(Duration::from_secs(1), None).unwrap();
        assert!(HttpRelayer::new(http, "https://relayer.example", "  ").is_err());
    }
}
