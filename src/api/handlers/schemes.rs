use crate::AppState;
use crate::api::error::AppError;
use crate::models::{Scheme, SchemeProgress};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SchemeQuery {
    /// Matched against title, description and benefits
    pub search: Option<String>,
    /// Category name, or "all"
    pub category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/schemes",
    params(SchemeQuery),
    responses(
        (status = 200, description = "Matching schemes", body = Vec<Scheme>)
    ),
    tag = "schemes"
)]
pub async fn list_schemes(
    State(state): State<AppState>,
    Query(query): Query<SchemeQuery>,
) -> Result<Json<Vec<Scheme>>, AppError> {
    let schemes = state
        .schemes
        .search(query.search.as_deref(), query.category.as_deref())
        .await?;
    Ok(Json(schemes))
}

#[utoipa::path(
    get,
    path = "/schemes/categories",
    responses(
        (status = 200, description = "Distinct scheme categories", body = Vec<String>)
    ),
    tag = "schemes"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.schemes.categories().await?))
}

#[utoipa::path(
    get,
    path = "/schemes/{id}",
    params(("id" = i32, Path, description = "Scheme id")),
    responses(
        (status = 200, description = "Scheme", body = Scheme),
        (status = 404, description = "Not found", body = crate::api::error::ErrorBody)
    ),
    tag = "schemes"
)]
pub async fn get_scheme(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Scheme>, AppError> {
    Ok(Json(state.schemes.get(id).await?))
}

#[utoipa::path(
    get,
    path = "/schemes/{id}/progress",
    params(("id" = i32, Path, description = "Scheme id")),
    responses(
        (status = 200, description = "Caller's document readiness for the scheme", body = SchemeProgress),
        (status = 404, description = "Not found", body = crate::api::error::ErrorBody)
    ),
    security(("bearer_auth" = [])),
    tag = "schemes"
)]
pub async fn scheme_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> Result<Json<SchemeProgress>, AppError> {
    Ok(Json(state.schemes.progress(&claims.sub, id).await?))
}
