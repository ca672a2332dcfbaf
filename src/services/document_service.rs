use crate::api::error::AppError;
use crate::entities::user_documents;
use crate::models::{
    RemovalReport, StorageCleanup, UploadedDocument, VerificationResult, VerificationStatus,
};
use crate::services::document_repository::DocumentRepository;
use crate::services::gateway::{VerificationGateway, VerificationRequest};
use crate::services::scheme_repository::SchemeRepository;
use crate::services::storage::StorageService;
use crate::utils::data_uri;
use crate::utils::in_flight::InFlight;
use crate::utils::validation::{
    ValidationError, extension_for, normalize_media_type, sanitize_filename,
    validate_document_type, validate_file_size,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A file received from the client, before validation
pub struct IncomingFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct DocumentService {
    documents: Arc<dyn DocumentRepository>,
    schemes: Arc<dyn SchemeRepository>,
    storage: Arc<dyn StorageService>,
    gateway: Arc<VerificationGateway>,
    in_flight: InFlight,
    max_file_size: usize,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        schemes: Arc<dyn SchemeRepository>,
        storage: Arc<dyn StorageService>,
        gateway: Arc<VerificationGateway>,
        max_file_size: usize,
    ) -> Self {
        Self {
            documents,
            schemes,
            storage,
            gateway,
            in_flight: InFlight::new(),
            max_file_size,
        }
    }

    /// Stores a document for a scheme requirement. Uploading again for the
    /// same (user, scheme, document type) replaces the file and resets the
    /// record to `pending`.
    pub async fn upload(
        &self,
        user_id: &str,
        scheme_id: i32,
        document_type: &str,
        file: IncomingFile,
    ) -> Result<UploadedDocument, AppError> {
        let document_type = document_type.trim();
        if document_type.is_empty() {
            return Err(AppError::InvalidRequest(
                "document_type must not be empty".to_string(),
            ));
        }

        if self.schemes.find_by_id(scheme_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Scheme {} not found", scheme_id)));
        }

        let file_name = sanitize_filename(&file.file_name).map_err(validation_error)?;
        validate_file_size(file.bytes.len(), self.max_file_size).map_err(validation_error)?;

        let media_type = infer::get(&file.bytes)
            .map(|kind| kind.mime_type().to_string())
            .or_else(|| {
                mime_guess::from_path(&file_name)
                    .first()
                    .map(|m| m.essence_str().to_string())
            })
            .map(|m| normalize_media_type(&m))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if let Err(e) = validate_document_type(&media_type) {
            return Err(AppError::UnsupportedMediaType {
                media_type,
                message: e.message,
            });
        }

        let checksum = hex::encode(Sha256::digest(&file.bytes));
        let file_size = file.bytes.len() as i64;
        let storage_key = format!(
            "{}/{}.{}",
            user_id,
            Uuid::new_v4(),
            extension_for(&media_type)
        );

        self.storage
            .upload_file(&storage_key, file.bytes, &media_type)
            .await?;
        let file_url = self.storage.get_download_url(&storage_key).await?;

        let now = Utc::now();
        let existing = self
            .documents
            .find_slot(user_id, scheme_id, document_type)
            .await?;

        let saved = match existing {
            Some(old) => {
                let old_key = old.storage_key.clone();
                let replaced = self
                    .documents
                    .replace(user_documents::Model {
                        file_name,
                        storage_key,
                        file_url,
                        file_size,
                        mime_type: media_type,
                        checksum,
                        verification_status: VerificationStatus::Pending.to_string(),
                        verification_result: None,
                        updated_at: now,
                        ..old
                    })
                    .await?;

                if old_key != replaced.storage_key {
                    if let Err(e) = self.storage.delete_file(&old_key).await {
                        warn!("⚠️ Could not delete replaced file {}: {}", old_key, e);
                    }
                }

                info!(
                    "📄 Replaced {} for user {} (scheme {})",
                    document_type, user_id, scheme_id
                );
                replaced
            }
            None => {
                let inserted = self
                    .documents
                    .insert(user_documents::Model {
                        id: Uuid::new_v4().to_string(),
                        user_id: user_id.to_string(),
                        scheme_id,
                        document_type: document_type.to_string(),
                        file_name,
                        storage_key,
                        file_url,
                        file_size,
                        mime_type: media_type,
                        checksum,
                        verification_status: VerificationStatus::Pending.to_string(),
                        verification_result: None,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?;

                info!(
                    "📄 Stored {} for user {} (scheme {})",
                    document_type, user_id, scheme_id
                );
                inserted
            }
        };

        Ok(saved.into())
    }

    pub async fn list(
        &self,
        user_id: &str,
        scheme_id: Option<i32>,
    ) -> Result<Vec<UploadedDocument>, AppError> {
        let docs = self.documents.find_for_user(user_id, scheme_id).await?;
        Ok(docs.into_iter().map(UploadedDocument::from).collect())
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<UploadedDocument, AppError> {
        Ok(self.owned(user_id, id).await?.into())
    }

    /// Stores a verification outcome for the file at `storage_key`. Status
    /// follows `is_valid` only. If the document was re-uploaded meanwhile the
    /// outcome is discarded and the call fails with `Conflict`.
    pub async fn record_verification(
        &self,
        id: &str,
        storage_key: &str,
        result: &VerificationResult,
    ) -> Result<UploadedDocument, AppError> {
        let status = VerificationStatus::from_validity(result.is_valid);
        let value = serde_json::to_value(result).map_err(anyhow::Error::from)?;

        let Some(updated) = self
            .documents
            .set_verification(id, storage_key, status.as_str(), value)
            .await?
        else {
            if self.documents.find_by_id(id).await?.is_some() {
                warn!(
                    "⚠️ Document {} was replaced during verification, result discarded",
                    id
                );
                return Err(AppError::Conflict(
                    "Document was replaced while verification was running; verify it again"
                        .to_string(),
                ));
            }
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        };

        info!("📝 Document {} marked {}", id, status);
        Ok(updated.into())
    }

    /// Verifies a stored document and records the outcome. A failed attempt
    /// leaves the previous status untouched.
    pub async fn verify_stored(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<UploadedDocument, AppError> {
        let doc = self.owned(user_id, id).await?;

        let _guard = self.in_flight.try_acquire(id).ok_or_else(|| {
            AppError::Conflict("Verification already in progress for this document".to_string())
        })?;

        let bytes = self.storage.get_file(&doc.storage_key).await?;

        let request = VerificationRequest {
            image_base64: data_uri::encode(&doc.mime_type, &bytes),
            file_name: Some(doc.file_name.clone()),
            expected_document_type: Some(doc.document_type.clone()),
        };

        let result = self.gateway.verify_and_normalize(&request).await?;
        self.record_verification(id, &doc.storage_key, &result)
            .await
    }

    /// Deletes the record, then the stored file. Only the record delete can fail the call.
    pub async fn remove(&self, user_id: &str, id: &str) -> Result<RemovalReport, AppError> {
        let doc = self.owned(user_id, id).await?;

        if !self.documents.delete(id).await? {
            return Err(AppError::NotFound(format!("Document {} not found", id)));
        }

        let report = match self.storage.delete_file(&doc.storage_key).await {
            Ok(()) => RemovalReport {
                id: doc.id,
                storage_cleanup: StorageCleanup::Completed,
                storage_error: None,
            },
            Err(e) => {
                warn!(
                    "⚠️ Document {} removed but stored file {} remains: {}",
                    doc.id, doc.storage_key, e
                );
                RemovalReport {
                    id: doc.id,
                    storage_cleanup: StorageCleanup::Failed,
                    storage_error: Some(e.to_string()),
                }
            }
        };

        info!("🗑️ Removed document {} for user {}", report.id, user_id);
        Ok(report)
    }

    async fn owned(&self, user_id: &str, id: &str) -> Result<user_documents::Model, AppError> {
        match self.documents.find_by_id(id).await? {
            Some(doc) if doc.user_id == user_id => Ok(doc),
            _ => Err(AppError::NotFound(format!("Document {} not found", id))),
        }
    }
}

fn validation_error(e: ValidationError) -> AppError {
    match e.code {
        "FILE_TOO_LARGE" => AppError::PayloadTooLarge(e.message),
        _ => AppError::InvalidRequest(e.message),
    }
}
