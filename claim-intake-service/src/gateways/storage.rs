use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use claim_flow::{ClaimError, EvidenceFile, Result, StorageGateway};
use serde::{Deserialize, Serialize};
use tracing::debug;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Upload request body. Field names follow the upstream wire contract; the
/// file content is plain base64 with no data-URI prefix.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequestBody<'a> {
    file_content: String,
    file_name: &'a str,
    folder: &'a str,
    content_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadReply {
    uri: String,
}

/// Error body shape of the upload API: `{ "error": "..." }`.
#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    error: Option<String>,
}

/// Reqwest-backed client for the evidence upload API.
pub struct HttpStorageGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpStorageGateway {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl StorageGateway for HttpStorageGateway {
    async fn upload(&self, file: &EvidenceFile, folder: &str) -> Result<String> {
        let body = UploadRequestBody {
            file_content: STANDARD.encode(&file.content),
            file_name: &file.file_name,
            folder,
            content_type: &file.content_type,
        };

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClaimError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<UploadErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| format!("upload API returned {}", status));
            return Err(ClaimError::UploadFailed(message));
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|e| ClaimError::UploadFailed(e.to_string()))?;
        debug!(file_name = %file.file_name, folder, uri = %reply.uri, "File stored");
        Ok(reply.uri)
    }
}
