use anonsignals_types::{AnonError, AnonResult};
use reqwest::{Client, Proxy};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Status code plus body. Bodies that are not JSON are kept as a string so
/// error responses can still be reported.
#[derive(Clone, Debug)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, proxy: Option<&str>) -> AnonResult<Self> {
        let mut builder = Client::builder().timeout(timeout);

        if let Some(proxy_addr) = proxy {
            info!("Configuring HTTP client with proxy: {}", proxy_addr);
            let proxy = Proxy::all(proxy_addr)
                .map_err(|e| AnonError::Network(format!("Failed to create proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| AnonError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// `label` is what gets logged; URLs carry the API key and are never logged.
    pub async fn get_json(&self, url: &str, label: &str) -> AnonResult<JsonResponse> {
        debug!("HTTP GET: {}", label);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AnonError::Network(format!("HTTP GET {} failed: {}", label, e.without_url())))?;

        Self::read_body(response, label).await
    }

    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        label: &str,
        body: &T,
    ) -> AnonResult<JsonResponse> {
        debug!("HTTP POST: {}", label);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AnonError::Network(format!("HTTP POST {} failed: {}", label, e.without_url())))?;

        Self::read_body(response, label).await
    }

    async fn read_body(response: reqwest::Response, label: &str) -> AnonResult<JsonResponse> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AnonError::Network(format!("Failed to read {} response: {}", label, e.without_url())))?;

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        debug!("HTTP {} -> {}", label, status);
        Ok(JsonResponse { status, body })
    }
}
