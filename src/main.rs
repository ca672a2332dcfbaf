use clap::Parser;
use dotenvy::dotenv;
use scheme_docs_backend::config::AppConfig;
use scheme_docs_backend::infrastructure::{database, storage};
use scheme_docs_backend::services::document_repository::SeaOrmDocumentRepository;
use scheme_docs_backend::services::document_service::DocumentService;
use scheme_docs_backend::services::gateway::VerificationGateway;
use scheme_docs_backend::services::gemini::GeminiClient;
use scheme_docs_backend::services::scheme_repository::SeaOrmSchemeRepository;
use scheme_docs_backend::services::scheme_service::SchemeService;
use scheme_docs_backend::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Scheme document verification backend")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Bind to all interfaces instead of localhost
    #[arg(long, default_value_t = false)]
    public: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scheme_docs_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Scheme Document Backend...");

    let config = AppConfig::from_env();
    info!(
        "🛡️  Limits: payload={}MB, upload={}MB, model={}",
        config.max_payload_size / 1024 / 1024,
        config.max_file_size / 1024 / 1024,
        config.model.model_name
    );
    if config.model.api_key.is_none() {
        warn!("⚠️ GEMINI_API_KEY is not set; verification requests will be refused");
    }

    // Setup Infrastructure
    let db = database::setup_database(&config.database_url).await?;
    let storage_service = storage::setup_storage().await?;

    let model = Arc::new(GeminiClient::new(&config.model)?);
    let gateway = Arc::new(VerificationGateway::new(model, config.upstream_body_limit));

    let document_repo = Arc::new(SeaOrmDocumentRepository::new(db.clone()));
    let scheme_repo = Arc::new(SeaOrmSchemeRepository::new(db.clone()));

    let documents = Arc::new(DocumentService::new(
        document_repo.clone(),
        scheme_repo.clone(),
        storage_service,
        gateway.clone(),
        config.max_file_size,
    ));
    let schemes = Arc::new(SchemeService::new(scheme_repo, document_repo));

    let state = AppState {
        db,
        gateway,
        documents,
        schemes,
        config,
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let host = if args.public { [0, 0, 0, 0] } else { [127, 0, 0, 1] };
    let addr = SocketAddr::from((host, args.port));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
