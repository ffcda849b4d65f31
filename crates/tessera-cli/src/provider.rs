//! Fix provider backed by an HTTP suggestion service.
//!
//! The service receives the fix request as JSON (`{workbook, diagnostics}`)
//! and answers with a proposal list, either bare or as `{"fixes": [...]}`,
//! optionally wrapped in a markdown code fence.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tessera::mutation::parse_fix_response;
use tessera::{FixProvider, FixRequest, Result, TesseraError};
use tracing::debug;

const PROVIDER_NAME: &str = "http";

/// Posts fix requests to a suggestion endpoint.
pub struct HttpFixProvider {
    client: Client,
    endpoint: String,
}

impl HttpFixProvider {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TesseraError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(token) = std::env::var("TESSERA_FIX_TOKEN") {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
        }
        headers
    }

    fn failure(&self, message: String) -> TesseraError {
        TesseraError::FixProvider {
            provider: PROVIDER_NAME.to_string(),
            message,
        }
    }
}

impl FixProvider for HttpFixProvider {
    fn suggest(&self, request: &FixRequest<'_>) -> Result<Vec<Value>> {
        debug!(endpoint = %self.endpoint, open = request.diagnostics.len(), "Posting fix request");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.build_headers())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    self.failure(format!("Failed to connect to {}", self.endpoint))
                } else {
                    self.failure(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(self.failure(format!("Service error ({}): {}", status, error_text)));
        }

        let body = response
            .text()
            .map_err(|e| self.failure(format!("Failed to read response: {}", e)))?;

        parse_fix_response(PROVIDER_NAME, &body)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}
