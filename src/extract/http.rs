use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{CodeExtractor, ExtractError};
use crate::core::code::CodeSet;

#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    codes: Vec<String>,
}

/// Client for a remote extraction service.
///
/// Posts `{"text": ...}` as JSON and expects `{"codes": [...]}` back.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpExtractor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: None,
        })
    }

    /// Send `key` as a bearer token with every request
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[async_trait]
impl CodeExtractor for HttpExtractor {
    async fn extract(&self, text: &str) -> Result<CodeSet, ExtractError> {
        let mut request = self.client.post(&self.url).json(&ExtractRequest { text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: ExtractResponse = response.json().await?;
        tracing::debug!("Extraction service returned {} codes", body.codes.len());
        Ok(body.codes.into_iter().collect())
    }
}
