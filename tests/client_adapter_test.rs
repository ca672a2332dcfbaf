mod common;

use common::*;
use scheme_docs_backend::client::{ClientError, DocumentFile, VerificationClient};
use scheme_docs_backend::services::gemini::ModelError;
use std::net::SocketAddr;
use std::sync::Arc;

/// Serves the app on an ephemeral port and returns its verify endpoint
async fn serve(model: Arc<StubModel>) -> (String, TestApp) {
    let app = test_app(model).await;
    let router = app.router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}/verify-document", addr), app)
}

#[tokio::test]
async fn test_client_receives_normalized_result() {
    let (endpoint, app) = serve(StubModel::replying(vec![Ok(INVALID_REPLY.to_string())])).await;
    let client = VerificationClient::new(&endpoint).unwrap();

    let file = DocumentFile::new("aadhaar.png", "image/png", PNG.to_vec());
    let result = client
        .submit_for_verification(&file, "Aadhaar Card")
        .await
        .unwrap();

    // An invalid verdict is still a successful verification
    assert_eq!(result.file_name, "aadhaar.png");
    assert!(!result.is_valid);
    assert_eq!(result.issues, vec!["Photo area is blurred"]);
    assert_eq!(result.recommendations, vec!["Upload a sharper scan"]);
    assert_eq!(app.model.calls(), 1);
}

#[tokio::test]
async fn test_client_maps_unsupported_media_type() {
    let (endpoint, app) = serve(StubModel::valid()).await;
    let client = VerificationClient::new(&endpoint).unwrap();

    let file = DocumentFile::new("income.pdf", "application/pdf", PDF.to_vec());
    let err = client
        .submit_for_verification(&file, "Income Certificate")
        .await
        .unwrap_err();

    match err {
        ClientError::UnsupportedMediaType { message, issues } => {
            assert!(message.contains("application/pdf"));
            assert_eq!(issues.len(), 1);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(app.model.calls(), 0);
}

#[tokio::test]
async fn test_client_maps_upstream_failure() {
    let (endpoint, _app) = serve(StubModel::replying(vec![Err(ModelError::Status {
        status: 429,
        body: "Resource has been exhausted".to_string(),
    })]))
    .await;
    let client = VerificationClient::new(&endpoint).unwrap();

    let file = DocumentFile::new("pan.jpg", "image/jpeg", JPEG.to_vec());
    let err = client
        .submit_for_verification(&file, "PAN Card")
        .await
        .unwrap_err();

    match err {
        ClientError::Upstream {
            status,
            message,
            details,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to analyze document");
            assert_eq!(details.as_deref(), Some("Resource has been exhausted"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_maps_missing_credential() {
    let (endpoint, _app) = serve(StubModel::unconfigured()).await;
    let client = VerificationClient::new(&endpoint).unwrap();

    let file = DocumentFile::new("pan.jpg", "image/jpeg", JPEG.to_vec());
    let err = client
        .submit_for_verification(&file, "PAN Card")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Configuration(_)));
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = VerificationClient::new(&format!("http://{}/verify-document", addr)).unwrap();
    let file = DocumentFile::new("pan.jpg", "image/jpeg", JPEG.to_vec());
    let err = client
        .submit_for_verification(&file, "PAN Card")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_submit_file_reads_and_sniffs() {
    let (endpoint, app) = serve(StubModel::valid()).await;
    let client = VerificationClient::new(&endpoint).unwrap();

    // Extension says pdf, bytes say png: the bytes win
    let path = std::env::temp_dir().join(format!("{}.pdf", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, PNG).await.unwrap();

    let result = client.submit_file(&path, "Aadhaar Card").await;
    let _ = tokio::fs::remove_file(&path).await;

    let result = result.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.document_type, "Aadhaar Card");
    assert_eq!(
        app.model.last_media_type.lock().unwrap().as_deref(),
        Some("image/png")
    );

    let missing = std::env::temp_dir().join(format!("{}.png", uuid::Uuid::new_v4()));
    assert!(matches!(
        client.submit_file(&missing, "Aadhaar Card").await,
        Err(ClientError::Io { .. })
    ));
}
