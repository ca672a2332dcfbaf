use crate::entities::{schemes, user_documents};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Fixed-shape analysis produced by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub document_type: String,
    pub is_valid: bool,
    /// Always within [0, 1]
    pub confidence: f64,
    pub issues: Vec<String>,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Outcome of one verification attempt, stored verbatim on the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub file_name: String,
    pub document_type: String,
    pub is_valid: bool,
    pub confidence: f64,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl VerificationResult {
    pub fn from_analysis(file_name: impl Into<String>, analysis: Analysis) -> Self {
        Self {
            file_name: file_name.into(),
            document_type: analysis.document_type,
            is_valid: analysis.is_valid,
            confidence: analysis.confidence,
            issues: analysis.issues,
            key_findings: analysis.key_findings,
            recommendations: analysis.recommendations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Failed => "failed",
        }
    }

    /// `isValid` alone decides the status; issues are advisory
    pub fn from_validity(is_valid: bool) -> Self {
        if is_valid {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Failed
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "failed" => Ok(VerificationStatus::Failed),
            other => Err(format!("unknown verification status '{}'", other)),
        }
    }
}

/// Body of `POST /verify-document`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDocumentRequest {
    /// Data URI or bare base64 of the document image
    pub image_base64: String,
    pub file_name: Option<String>,
    pub expected_document_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub file_name: String,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub id: String,
    pub scheme_id: i32,
    pub document_type: String,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub checksum: String,
    pub verification_status: VerificationStatus,
    pub verification_result: Option<VerificationResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user_documents::Model> for UploadedDocument {
    fn from(model: user_documents::Model) -> Self {
        let verification_status = model.verification_status.parse().unwrap_or_else(|e| {
            tracing::warn!("Document {} has {}, treating as pending", model.id, e);
            VerificationStatus::Pending
        });

        let verification_result = model.verification_result.and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| tracing::warn!("Stored result for {} is unreadable: {}", model.id, e))
                .ok()
        });

        Self {
            id: model.id,
            scheme_id: model.scheme_id,
            document_type: model.document_type,
            file_name: model.file_name,
            file_url: model.file_url,
            file_size: model.file_size,
            mime_type: model.mime_type,
            checksum: model.checksum,
            verification_status,
            verification_result,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageCleanup {
    Completed,
    Failed,
}

/// Reply to a document removal. The record is gone even when cleanup failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemovalReport {
    pub id: String,
    pub storage_cleanup: StorageCleanup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub eligibility: String,
    pub required_documents: Vec<String>,
    pub description: String,
    pub benefits: String,
    pub application_link: Option<String>,
}

impl From<schemes::Model> for Scheme {
    fn from(model: schemes::Model) -> Self {
        let required_documents = match model.required_documents {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            id: model.id,
            title: model.title,
            category: model.category,
            eligibility: model.eligibility,
            required_documents,
            description: model.description,
            benefits: model.benefits,
            application_link: model.application_link,
        }
    }
}

/// Seed catalogue entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeSeed {
    pub title: String,
    pub category: String,
    pub eligibility: String,
    pub required_documents: Vec<String>,
    pub description: String,
    pub benefits: String,
    pub application_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequirementState {
    Missing,
    Pending,
    Verified,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequirementStatus {
    pub document_type: String,
    pub state: RequirementState,
    pub document_id: Option<String>,
    /// Whether the type the model detected matches the requirement label.
    /// Informational only.
    pub detected_type_matches: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressBucket {
    Complete,
    Almost,
    Partial,
    Incomplete,
}

impl ProgressBucket {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            100.. => ProgressBucket::Complete,
            75..=99 => ProgressBucket::Almost,
            50..=74 => ProgressBucket::Partial,
            _ => ProgressBucket::Incomplete,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ProgressBucket::Complete => {
                "You have all required documents verified! You're ready to apply."
            }
            ProgressBucket::Almost => {
                "You have most of the documents verified. Upload and verify the remaining few to complete your application."
            }
            ProgressBucket::Partial => {
                "You have some of the required documents verified. Continue uploading and verifying the rest."
            }
            ProgressBucket::Incomplete => {
                "You need to upload and verify most of the required documents before applying."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemeProgress {
    pub scheme_id: i32,
    pub total_required: usize,
    pub verified_count: usize,
    pub percentage: u32,
    pub status: ProgressBucket,
    pub message: String,
    pub requirements: Vec<RequirementStatus>,
}
