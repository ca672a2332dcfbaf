use crate::AppState;
use crate::api::error::AppError;
use crate::models::VerifyResponse;
use crate::services::gateway::VerificationRequest;
use crate::services::normalizer;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

#[utoipa::path(
    post,
    path = "/verify-document",
    request_body = crate::models::VerifyDocumentRequest,
    responses(
        (status = 200, description = "Document analysed", body = VerifyResponse),
        (status = 400, description = "Invalid payload or unsupported file type", body = crate::api::error::ErrorBody),
        (status = 500, description = "Model unavailable or not configured", body = crate::api::error::ErrorBody)
    ),
    tag = "verification"
)]
pub async fn verify_document(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let Json(body) = payload.map_err(|rejection| match rejection {
        JsonRejection::BytesRejection(_) => AppError::InvalidRequest(format!(
            "Request body exceeds the maximum size of {} MB",
            state.config.max_payload_size / 1024 / 1024
        )),
        _ => AppError::InvalidRequest("Invalid JSON in request body".to_string()),
    })?;

    let request = VerificationRequest::from_json(&body, state.config.max_payload_size)?;

    let raw = state.gateway.verify(&request).await?;
    let analysis = normalizer::normalize(&raw, request.expected_document_type.as_deref());

    Ok(Json(VerifyResponse {
        success: true,
        file_name: request.file_name_or_default().to_string(),
        analysis,
    }))
}
