//! Client side of the verification flow: read a document, encode it as a
//! data URI, post it to `/verify-document` and map the reply.

use crate::api::error::ErrorBody;
use crate::models::{VerificationResult, VerifyDocumentRequest, VerifyResponse};
use crate::utils::data_uri;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the selected file is empty")]
    EmptyFile,

    #[error("a document type is required")]
    MissingDocumentType,

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid verification endpoint: {0}")]
    InvalidEndpoint(String),

    /// The gateway could not be reached or gave no usable answer. Nothing was assessed.
    #[error("verification service unavailable: {0}")]
    Transport(String),

    #[error("request rejected: {0}")]
    InvalidRequest(String),

    #[error("{message}")]
    UnsupportedMediaType { message: String, issues: Vec<String> },

    #[error("document analysis failed ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("verification service is not configured: {0}")]
    Configuration(String),
}

/// A document ready to be sent for verification
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a file, taking the media type from its magic bytes and falling
    /// back to the extension.
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let media_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| {
                mime_guess::from_path(path)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        Ok(Self::new(file_name, media_type, bytes))
    }

    pub fn to_data_uri(&self) -> String {
        data_uri::encode(&self.media_type, &self.bytes)
    }
}

pub struct VerificationClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl VerificationClient {
    /// `endpoint` is the full URL of the gateway's `/verify-document` route
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self { http, endpoint })
    }

    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    pub async fn submit_file(
        &self,
        path: impl AsRef<Path>,
        declared_document_type: &str,
    ) -> Result<VerificationResult, ClientError> {
        let file = DocumentFile::read(path).await?;
        self.submit_for_verification(&file, declared_document_type)
            .await
    }

    /// Sends one document to the gateway. An AI verdict of "invalid" is a
    /// successful result; only failures to obtain a verdict are errors.
    pub async fn submit_for_verification(
        &self,
        file: &DocumentFile,
        declared_document_type: &str,
    ) -> Result<VerificationResult, ClientError> {
        if file.bytes.is_empty() {
            return Err(ClientError::EmptyFile);
        }
        let declared = declared_document_type.trim();
        if declared.is_empty() {
            return Err(ClientError::MissingDocumentType);
        }

        let body = VerifyDocumentRequest {
            image_base64: file.to_data_uri(),
            file_name: Some(file.file_name.clone()),
            expected_document_type: Some(declared.to_string()),
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(map_failure(status.as_u16(), &text));
        }

        let parsed: VerifyResponse = serde_json::from_str(&text).map_err(|e| {
            ClientError::Transport(format!("unexpected response from gateway: {}", e))
        })?;

        Ok(VerificationResult::from_analysis(
            parsed.file_name,
            parsed.analysis,
        ))
    }
}

fn map_failure(status: u16, body: &str) -> ClientError {
    let Ok(error) = serde_json::from_str::<ErrorBody>(body) else {
        return ClientError::Transport(format!("gateway returned {} without a usable body", status));
    };

    match error.code.as_str() {
        "UNSUPPORTED_MEDIA_TYPE" => ClientError::UnsupportedMediaType {
            message: error.error,
            issues: error.issues.unwrap_or_default(),
        },
        "CONFIGURATION_ERROR" => ClientError::Configuration(error.error),
        "INVALID_REQUEST" => ClientError::InvalidRequest(error.error),
        _ if status == 400 => ClientError::InvalidRequest(error.error),
        _ => ClientError::Upstream {
            status,
            message: error.error,
            details: error.details,
        },
    }
}
