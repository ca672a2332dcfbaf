#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Response};
use http_body_util::BodyExt;
use scheme_docs_backend::config::AppConfig;
use scheme_docs_backend::infrastructure::{database, seed};
use scheme_docs_backend::services::document_repository::SeaOrmDocumentRepository;
use scheme_docs_backend::services::document_service::DocumentService;
use scheme_docs_backend::services::gateway::VerificationGateway;
use scheme_docs_backend::services::gemini::{InlineImage, ModelError, VisionModel};
use scheme_docs_backend::services::scheme_repository::SeaOrmSchemeRepository;
use scheme_docs_backend::services::scheme_service::SchemeService;
use scheme_docs_backend::services::storage::StorageService;
use scheme_docs_backend::utils::auth::create_jwt;
use scheme_docs_backend::{AppState, create_app};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::oneshot;

pub const JWT_SECRET: &str = "test-secret";

/// Smallest byte sequences the magic-byte sniffer recognises
pub const PNG: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
];
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0];
pub const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n";

pub const VALID_REPLY: &str = r#"{"documentType":"Aadhaar Card","isValid":true,"confidence":0.93,"issues":[],"keyFindings":["UIDAI logo present","QR code intact"],"recommendations":[]}"#;
pub const INVALID_REPLY: &str = r#"{"documentType":"Aadhaar Card","isValid":false,"confidence":0.41,"issues":["Photo area is blurred"],"keyFindings":[],"recommendations":["Upload a sharper scan"]}"#;

pub struct MockStorageService {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_delete: AtomicBool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_delete: AtomicBool::new(false),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(&self, key: &str, data: Vec<u8>, _content_type: &str) -> anyhow::Result<()> {
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("storage backend unavailable"));
        }
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn get_file(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Key not found"))
    }

    async fn get_download_url(&self, key: &str) -> anyhow::Result<String> {
        Ok(format!("http://storage.test/documents/{}", key))
    }
}

/// Vision model double with scripted replies and a call counter
pub struct StubModel {
    configured: bool,
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: AtomicUsize,
    hold: Mutex<Option<oneshot::Receiver<()>>>,
    pub last_media_type: Mutex<Option<String>>,
}

impl StubModel {
    pub fn replying(replies: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            hold: Mutex::new(None),
            last_media_type: Mutex::new(None),
        })
    }

    pub fn valid() -> Arc<Self> {
        Self::replying(vec![Ok(VALID_REPLY.to_string())])
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            hold: Mutex::new(None),
            last_media_type: Mutex::new(None),
        })
    }

    /// The next call waits until the returned sender fires
    pub fn hold_next_call(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModel for StubModel {
    async fn analyze_image(&self, _prompt: &str, image: &InlineImage) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_media_type.lock().unwrap() = Some(image.media_type.clone());

        let hold = self.hold.lock().unwrap().take();
        if let Some(rx) = hold {
            let _ = rx.await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(VALID_REPLY.to_string()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: JWT_SECRET.to_string(),
        ..AppConfig::development()
    }
}

pub async fn setup_test_db() -> DatabaseConnection {
    // One connection so every query sees the same in-memory database
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    seed::seed_schemes(&db).await.unwrap();
    db
}

pub struct TestApp {
    pub state: AppState,
    pub storage: Arc<MockStorageService>,
    pub model: Arc<StubModel>,
}

impl TestApp {
    pub fn router(&self) -> axum::Router {
        create_app(self.state.clone())
    }
}

pub async fn test_app(model: Arc<StubModel>) -> TestApp {
    test_app_with(model, test_config()).await
}

pub async fn test_app_with(model: Arc<StubModel>, config: AppConfig) -> TestApp {
    let db = setup_test_db().await;
    let storage = Arc::new(MockStorageService::new());
    let gateway = Arc::new(VerificationGateway::new(
        model.clone(),
        config.upstream_body_limit,
    ));

    let document_repo = Arc::new(SeaOrmDocumentRepository::new(db.clone()));
    let scheme_repo = Arc::new(SeaOrmSchemeRepository::new(db.clone()));

    let documents = Arc::new(DocumentService::new(
        document_repo.clone(),
        scheme_repo.clone(),
        storage.clone(),
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

    TestApp {
        state,
        storage,
        model,
    }
}

pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", create_jwt(user_id, JWT_SECRET).unwrap())
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub const BOUNDARY: &str = "----scheme-docs-boundary";

/// Builds a multipart/form-data body. A part with a file name is sent as a file.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
