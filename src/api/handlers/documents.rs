use crate::AppState;
use crate::api::error::AppError;
use crate::models::{RemovalReport, UploadedDocument};
use crate::services::document_service::IncomingFile;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListDocumentsQuery {
    pub scheme_id: Option<i32>,
}

/// Text fields of the upload form
#[derive(Debug, Validate)]
struct UploadForm {
    #[validate(range(min = 1, message = "scheme_id must be a positive id"))]
    scheme_id: i32,
    #[validate(length(min = 1, max = 120, message = "document_type must be 1-120 characters"))]
    document_type: String,
}

/// Multipart body for `POST /documents`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub scheme_id: i32,
    pub document_type: String,
}

#[utoipa::path(
    get,
    path = "/documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Documents owned by the caller", body = Vec<UploadedDocument>),
        (status = 401, description = "Missing or invalid token", body = crate::api::error::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<UploadedDocument>>, AppError> {
    let docs = state.documents.list(&claims.sub, query.scheme_id).await?;
    Ok(Json(docs))
}

#[utoipa::path(
    post,
    path = "/documents",
    request_body(content = UploadDocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored, verification pending", body = UploadedDocument),
        (status = 400, description = "Invalid form or file type", body = crate::api::error::ErrorBody),
        (status = 404, description = "Unknown scheme", body = crate::api::error::ErrorBody),
        (status = 413, description = "File too large", body = crate::api::error::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedDocument>), AppError> {
    let mut file: Option<IncomingFile> = None;
    let mut scheme_id: Option<String> = None;
    let mut document_type: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::PayloadTooLarge(format!("Could not read uploaded file: {}", e))
                })?;
                file = Some(IncomingFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("scheme_id") => {
                scheme_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::InvalidRequest(e.to_string()))?,
                );
            }
            Some("document_type") => {
                document_type = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::InvalidRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::InvalidRequest("No file found in request".to_string()))?;

    let form = UploadForm {
        scheme_id: scheme_id
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| AppError::InvalidRequest("scheme_id is required".to_string()))?
            .parse()
            .map_err(|_| AppError::InvalidRequest("scheme_id must be an integer".to_string()))?,
        document_type: document_type
            .map(|t| t.trim().to_string())
            .ok_or_else(|| AppError::InvalidRequest("document_type is required".to_string()))?,
    };
    form.validate()
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?;

    let doc = state
        .documents
        .upload(&claims.sub, form.scheme_id, &form.document_type, file)
        .await?;

    Ok((StatusCode::CREATED, Json(doc)))
}

#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document", body = UploadedDocument),
        (status = 404, description = "Not found", body = crate::api::error::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<UploadedDocument>, AppError> {
    Ok(Json(state.documents.get(&claims.sub, &id).await?))
}

#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Record removed; storageCleanup reports the stored file", body = RemovalReport),
        (status = 404, description = "Not found", body = crate::api::error::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<RemovalReport>, AppError> {
    Ok(Json(state.documents.remove(&claims.sub, &id).await?))
}

#[utoipa::path(
    post,
    path = "/documents/{id}/verify",
    params(("id" = String, Path, description = "Document id")),
    responses(
        (status = 200, description = "Verification recorded", body = UploadedDocument),
        (status = 400, description = "Stored file cannot be verified", body = crate::api::error::ErrorBody),
        (status = 409, description = "Verification already running", body = crate::api::error::ErrorBody),
        (status = 500, description = "Model failure; status unchanged", body = crate::api::error::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "documents"
)]
pub async fn verify_stored_document(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<UploadedDocument>, AppError> {
    Ok(Json(state.documents.verify_stored(&claims.sub, &id).await?))
}
