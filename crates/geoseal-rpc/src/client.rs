//! HTTP client for one CSP endpoint.

use crate::error::RpcError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geoseal_types::wire::{ErrorResponse, EvalRequest, EvalResponse, LoadIndexRequest, LoadIndexResponse};
use std::time::Duration;

/// Configuration for a CSP client.
#[derive(Debug, Clone)]
pub struct CspClientConfig {
    /// Base URL (e.g., `http://127.0.0.1:8001`).
    pub url: String,
    /// Per-request timeout. A late share invalidates the whole query, so
    /// this is the effective query deadline contribution of this party.
    pub timeout: Duration,
    /// Retry attempts on transient failure.
    pub retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub retry_delay: Duration,
}

impl Default for CspClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8001".to_string(),
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Async client for one compute service provider.
pub struct CspClient {
    client: reqwest::Client,
    config: CspClientConfig,
}

impl CspClient {
    /// Create a client with default transport policy.
    pub fn new(url: &str) -> Self {
        Self::with_config(CspClientConfig {
            url: url.trim_end_matches('/').to_string(),
            ..Default::default()
        })
    }

    /// Create a client with full configuration.
    pub fn with_config(config: CspClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .expect("failed to create HTTP client");
        Self { client, config }
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn post_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, RpcError> {
        let url = format!("{}{}", self.config.url, endpoint);
        let attempts = self.config.retries + 1;
        let mut last_err = RpcError::Other(format!("no attempt made for {}", endpoint));

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
                log::debug!("retrying {} (attempt {})", url, attempt + 1);
            }
            match self.do_post(&url, body).await {
                Ok(val) => return Ok(val),
                Err(e) => {
                    if !e.is_transient() || attempt + 1 == attempts {
                        return Err(e);
                    }
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn do_post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, RpcError> {
        let resp = self.client.post(url).json(body).send().await?;
        let status = resp.status().as_u16();
        if status >= 400 {
            let body = resp.text().await.unwrap_or_default();
            // CSPs wrap failures in a JSON error envelope when they can.
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(RpcError::Csp(err.error));
            }
            return Err(RpcError::HttpStatus {
                url: url.to_string(),
                status,
                body: body.chars().take(500).collect(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Evaluate one party's payload and sanity-check the response shape.
    ///
    /// `expected_records` is the AUI row count; every token entry must
    /// carry exactly that many record shares.
    pub async fn eval(
        &self,
        request: &EvalRequest,
        expected_records: usize,
    ) -> Result<EvalResponse, RpcError> {
        let body = serde_json::to_value(request)?;
        let resp: EvalResponse = self.post_with_retry("/eval", &body).await?;

        let token_count = request.tokens.len();
        if resp.result_shares.len() != token_count || resp.proof_shares.len() != token_count {
            return Err(RpcError::TokenCount {
                got: resp.result_shares.len().min(resp.proof_shares.len()),
                expected: token_count,
            });
        }
        for (t, shares) in resp.result_shares.iter().enumerate() {
            if shares.len() != expected_records {
                return Err(RpcError::ShareCount {
                    token: t,
                    got: shares.len(),
                    expected: expected_records,
                });
            }
        }
        Ok(resp)
    }

    /// Ship an AUI blob to the CSP.
    pub async fn load_index_blob(&self, blob: &[u8]) -> Result<(), RpcError> {
        let req = LoadIndexRequest {
            aui_b64: Some(BASE64.encode(blob)),
            aui_path: None,
        };
        let body = serde_json::to_value(&req)?;
        let resp: LoadIndexResponse = self.post_with_retry("/load_index", &body).await?;
        if resp.status != "ok" {
            return Err(RpcError::Csp(format!("load_index status: {}", resp.status)));
        }
        Ok(())
    }

    /// Ask the CSP to load an AUI blob from its own filesystem.
    pub async fn load_index_path(&self, path: &str) -> Result<(), RpcError> {
        let req = LoadIndexRequest {
            aui_b64: None,
            aui_path: Some(path.to_string()),
        };
        let body = serde_json::to_value(&req)?;
        let resp: LoadIndexResponse = self.post_with_retry("/load_index", &body).await?;
        if resp.status != "ok" {
            return Err(RpcError::Csp(format!("load_index status: {}", resp.status)));
        }
        Ok(())
    }
}
