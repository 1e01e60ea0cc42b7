use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResumeServiceError {
    #[error("Resume parser timed out")]
    Timeout,
    #[error("Could not reach the resume parser: {0}")]
    Connect(String),
    #[error("Resume parser failed: {0}")]
    Upstream(String),
    #[error("Resume parser returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    filename: &'a str,
    file_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(flatten)]
    fields: serde_json::Value,
}

/// Client for the external resume-parsing service. The parser is an
/// opaque HTTP collaborator; this is the only outbound call in the
/// system and the only one with an explicit timeout.
#[derive(Clone, Default)]
pub struct ResumeService;

impl ResumeService {
    pub fn new() -> Self {
        Self
    }

    pub async fn parse(
        &self,
        parser_url: &str,
        timeout_secs: u64,
        filename: &str,
        file_base64: &str,
    ) -> Result<serde_json::Value, ResumeServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|err| ResumeServiceError::Connect(err.to_string()))?;

        let response = client
            .post(parser_url)
            .json(&ParseRequest {
                filename,
                file_base64,
            })
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ResumeServiceError::Timeout
                } else {
                    ResumeServiceError::Connect(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = body.trim();
            let message = if detail.is_empty() {
                format!("status {status}")
            } else {
                format!("status {status}: {detail}")
            };
            return Err(ResumeServiceError::Upstream(message));
        }

        let parsed = response
            .json::<ParseResponse>()
            .await
            .map_err(|err| ResumeServiceError::InvalidResponse(err.to_string()))?;
        Ok(parsed.fields)
    }
}
