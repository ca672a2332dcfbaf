use clap::Parser;
use dotenvy::dotenv;
use scheme_docs_backend::client::{ClientError, VerificationClient};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Send a document image to the verification gateway and print the result
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Full URL of the gateway's verify-document route
    #[arg(
        long,
        env = "VERIFY_ENDPOINT",
        default_value = "http://127.0.0.1:3000/verify-document"
    )]
    endpoint: String,

    /// Document type the file is expected to be, e.g. "Aadhaar Card"
    #[arg(short, long)]
    document_type: String,

    /// Image of the document (JPEG, PNG, WEBP, HEIC)
    path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verify_document=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            match e {
                ClientError::UnsupportedMediaType { issues, .. } => {
                    for issue in issues {
                        error!("   {}", issue);
                    }
                }
                ClientError::Upstream {
                    details: Some(details),
                    ..
                } => error!("   {}", details),
                _ => {}
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), ClientError> {
    let client = VerificationClient::new(&args.endpoint)?;

    info!(
        "🔍 Verifying {} as {}...",
        args.path.display(),
        args.document_type
    );
    let result = client.submit_file(&args.path, &args.document_type).await?;

    if result.is_valid {
        info!("✅ Verified ({:.0}% confidence)", result.confidence * 100.0);
    } else {
        info!("⚠️ Not verified ({} issue(s))", result.issues.len());
    }

    let json = serde_json::to_string_pretty(&result)
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    println!("{}", json);
    Ok(())
}
