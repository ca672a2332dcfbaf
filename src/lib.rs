pub mod api;
pub mod client;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::document_service::DocumentService;
use crate::services::gateway::VerificationGateway;
use crate::services::scheme_service::SchemeService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::verify::verify_document,
        api::handlers::documents::list_documents,
        api::handlers::documents::upload_document,
        api::handlers::documents::get_document,
        api::handlers::documents::delete_document,
        api::handlers::documents::verify_stored_document,
        api::handlers::schemes::list_schemes,
        api::handlers::schemes::list_categories,
        api::handlers::schemes::get_scheme,
        api::handlers::schemes::scheme_progress,
    ),
    components(
        schemas(
            api::error::ErrorBody,
            api::handlers::health::HealthResponse,
            api::handlers::documents::UploadDocumentForm,
            models::Analysis,
            models::VerificationResult,
            models::VerificationStatus,
            models::VerifyDocumentRequest,
            models::VerifyResponse,
            models::UploadedDocument,
            models::StorageCleanup,
            models::RemovalReport,
            models::Scheme,
            models::RequirementState,
            models::RequirementStatus,
            models::ProgressBucket,
            models::SchemeProgress,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "verification", description = "AI document verification"),
        (name = "documents", description = "Uploaded scheme documents"),
        (name = "schemes", description = "Scheme catalogue"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: Arc<VerificationGateway>,
    pub documents: Arc<DocumentService>,
    pub schemes: Arc<SchemeService>,
    pub config: AppConfig,
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let list: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|_| tracing::warn!("Ignoring invalid CORS origin '{}'", o))
                    .ok()
            })
            .collect();
        AllowOrigin::list(list)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::POST, Method::GET, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::HeaderName::from_static("x-request-id")])
}

pub fn create_app(state: AppState) -> Router {
    // Multipart and JSON framing overhead on top of the payload caps
    let overhead = 1024 * 1024;

    let protected = Router::new()
        .route(
            "/documents",
            get(api::handlers::documents::list_documents)
                .post(api::handlers::documents::upload_document)
                .layer(DefaultBodyLimit::max(state.config.max_file_size + overhead)),
        )
        .route(
            "/documents/:id",
            get(api::handlers::documents::get_document)
                .delete(api::handlers::documents::delete_document),
        )
        .route(
            "/documents/:id/verify",
            post(api::handlers::documents::verify_stored_document),
        )
        .route(
            "/schemes/:id/progress",
            get(api::handlers::schemes::scheme_progress),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/verify-document",
            post(api::handlers::verify::verify_document)
                .layer(DefaultBodyLimit::max(state.config.max_payload_size + overhead)),
        )
        .route("/schemes", get(api::handlers::schemes::list_schemes))
        .route(
            "/schemes/categories",
            get(api::handlers::schemes::list_categories),
        )
        .route("/schemes/:id", get(api::handlers::schemes::get_scheme))
        .merge(protected)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
