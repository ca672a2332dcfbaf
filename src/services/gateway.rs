use crate::api::error::AppError;
use crate::models::VerificationResult;
use crate::services::gemini::{InlineImage, ModelError, VisionModel};
use crate::services::normalizer;
use crate::utils::data_uri;
use crate::utils::validation::{is_verifiable_image, normalize_media_type};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";
const UNNAMED_FILE: &str = "unnamed";

/// A validated `/verify-document` payload
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub image_base64: String,
    pub file_name: Option<String>,
    pub expected_document_type: Option<String>,
}

impl VerificationRequest {
    /// Validates a raw JSON body. Field errors name the offending field.
    pub fn from_json(body: &Value, max_payload_size: usize) -> Result<Self, AppError> {
        let object = body.as_object().ok_or_else(|| {
            AppError::InvalidRequest("Request body must be a JSON object".to_string())
        })?;

        let image_base64 = match object.get("imageBase64") {
            None | Some(Value::Null) => {
                return Err(AppError::InvalidRequest(
                    "Image data is required: imageBase64 is missing".to_string(),
                ));
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(AppError::InvalidRequest(
                    "Image data is required: imageBase64 is empty".to_string(),
                ));
            }
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(AppError::InvalidRequest(
                    "imageBase64 must be a string".to_string(),
                ));
            }
        };

        if image_base64.len() > max_payload_size {
            return Err(AppError::InvalidRequest(format!(
                "imageBase64 exceeds the maximum size of {} MB",
                max_payload_size / 1024 / 1024
            )));
        }

        Ok(Self {
            image_base64: image_base64.clone(),
            file_name: optional_string(object, "fileName")?,
            expected_document_type: optional_string(object, "expectedDocumentType")?,
        })
    }

    pub fn file_name_or_default(&self) -> &str {
        self.file_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNNAMED_FILE)
    }
}

fn optional_string(
    object: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Option<String>, AppError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::InvalidRequest(format!(
            "{} must be a string when provided",
            field
        ))),
    }
}

/// Instruction sent alongside the image
pub fn build_prompt(file_name: Option<&str>, expected_document_type: Option<&str>) -> String {
    format!(
        r#"Analyze the provided document image and provide a detailed verification report.

Your response must be ONLY a valid JSON object. Do not include any additional text, markdown, or explanations outside of the JSON object itself. The JSON must have exactly these keys:

{{
  "documentType": "string",
  "isValid": "boolean",
  "confidence": "number (0-1)",
  "issues": "array of strings",
  "keyFindings": "array of strings",
  "recommendations": "array of strings"
}}

Based on your analysis, fill in the values for the keys provided above. Leave "issues" and "recommendations" empty when the document is valid.

Document Context:
- File name: {}
- Expected document type: {}

Please focus on:
- Document authenticity (any signs of tampering, forgery, or alteration).
- Image quality and readability.
- Presence of required elements (signatures, seals, watermarks, etc.).
- Text clarity and consistency.
- Overall document condition and security features."#,
        file_name.filter(|n| !n.is_empty()).unwrap_or(UNNAMED_FILE),
        expected_document_type
            .filter(|t| !t.is_empty())
            .unwrap_or("Unknown"),
    )
}

fn unsupported(media_type: &str) -> AppError {
    let message = if media_type == "application/pdf" {
        "PDF documents cannot be verified directly. Upload a photo or scan of the document (JPEG, PNG, WEBP or HEIC) instead.".to_string()
    } else {
        format!(
            "Files of type '{}' cannot be verified. Upload a photo or scan of the document (JPEG, PNG, WEBP or HEIC) instead.",
            media_type
        )
    };

    AppError::UnsupportedMediaType {
        media_type: media_type.to_string(),
        message,
    }
}

/// Validates verification payloads and forwards them to the vision model
pub struct VerificationGateway {
    model: Arc<dyn VisionModel>,
    upstream_body_limit: usize,
}

impl VerificationGateway {
    pub fn new(model: Arc<dyn VisionModel>, upstream_body_limit: usize) -> Self {
        Self {
            model,
            upstream_body_limit,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Decodes the payload and settles the media type sent upstream.
    ///
    /// The data-URI prefix wins, then sniffed magic bytes, then `image/jpeg`.
    /// Content that sniffs as a non-image is refused whatever the prefix says.
    pub fn prepare(&self, request: &VerificationRequest) -> Result<InlineImage, AppError> {
        let uri = data_uri::parse(&request.image_base64);

        let bytes = data_uri::decode_payload(uri.payload).map_err(|e| {
            AppError::InvalidRequest(format!("imageBase64 is not valid base64: {}", e))
        })?;
        if bytes.is_empty() {
            return Err(AppError::InvalidRequest(
                "Image data is required: imageBase64 decodes to no data".to_string(),
            ));
        }

        let sniffed = infer::get(&bytes).map(|kind| normalize_media_type(kind.mime_type()));
        if let Some(sniffed) = sniffed.as_deref() {
            if !sniffed.starts_with("image/") {
                return Err(unsupported(sniffed));
            }
        }

        let media_type = uri
            .media_type
            .as_deref()
            .map(normalize_media_type)
            .or(sniffed)
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

        if !is_verifiable_image(&media_type) {
            return Err(unsupported(&media_type));
        }

        Ok(InlineImage {
            media_type,
            data: STANDARD.encode(&bytes),
        })
    }

    /// Runs one verification and returns the model's raw text
    pub async fn verify(&self, request: &VerificationRequest) -> Result<String, AppError> {
        let image = self.prepare(request)?;

        if !self.model.is_configured() {
            return Err(missing_credential());
        }

        let prompt = build_prompt(
            request.file_name.as_deref(),
            request.expected_document_type.as_deref(),
        );

        tracing::info!(
            "🔍 Verifying '{}' as {} ({})",
            request.file_name_or_default(),
            request
                .expected_document_type
                .as_deref()
                .unwrap_or("unspecified type"),
            image.media_type
        );

        self.model
            .analyze_image(&prompt, &image)
            .await
            .map_err(|e| self.map_model_error(e))
    }

    /// `verify` followed by normalization
    pub async fn verify_and_normalize(
        &self,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, AppError> {
        let raw = self.verify(request).await?;
        let analysis = normalizer::normalize(&raw, request.expected_document_type.as_deref());
        Ok(VerificationResult::from_analysis(
            request.file_name_or_default(),
            analysis,
        ))
    }

    fn map_model_error(&self, error: ModelError) -> AppError {
        match error {
            ModelError::MissingCredential => missing_credential(),
            ModelError::Status { status, body } => AppError::Upstream {
                message: "Failed to analyze document".to_string(),
                status: Some(status),
                details: body.chars().take(self.upstream_body_limit).collect(),
            },
            ModelError::Connection(reason) => AppError::Upstream {
                message: "AI service unreachable".to_string(),
                status: None,
                details: reason,
            },
            ModelError::MalformedResponse(reason) => AppError::Upstream {
                message: "Invalid response from AI service".to_string(),
                status: None,
                details: reason,
            },
        }
    }
}

fn missing_credential() -> AppError {
    AppError::Configuration("Gemini API key not configured".to_string())
}
