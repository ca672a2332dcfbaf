use std::env;

/// Settings for the external multimodal model
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// API key for the model provider. Verification is refused without it.
    pub api_key: Option<String>,

    /// Model identifier (default: "gemini-1.5-flash")
    pub model_name: String,

    /// Base URL of the generative language API
    pub api_base: String,

    /// Timeout for a single upstream call in seconds (default: 60)
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: "gemini-1.5-flash".to_string(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Hard cap on the encoded verification payload in bytes (default: 50 MB)
    pub max_payload_size: usize,

    /// Maximum size of an uploaded document in bytes (default: 20 MB)
    pub max_file_size: usize,

    /// Upstream error bodies are cut to this many characters (default: 500)
    pub upstream_body_limit: usize,

    pub model: ModelConfig,

    /// Shared secret used to validate bearer tokens from the identity provider
    pub jwt_secret: String,

    /// Allowed CORS origins (comma separated, "*" allows any)
    pub allowed_origins: Vec<String>,

    /// Database connection string
    pub database_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_payload_size: 50 * 1024 * 1024, // 50 MB
            max_file_size: 20 * 1024 * 1024,    // 20 MB
            upstream_body_limit: 500,
            model: ModelConfig::default(),
            jwt_secret: "secret".to_string(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(), // Vite default
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            database_url: "sqlite://scheme_docs.db?mode=rwc".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_payload_size: env::var("MAX_PAYLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_payload_size),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            upstream_body_limit: env::var("UPSTREAM_BODY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.upstream_body_limit),

            model: ModelConfig {
                api_key: env::var("GEMINI_API_KEY")
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
                model_name: env::var("GEMINI_MODEL").unwrap_or(default.model.model_name),
                api_base: env::var("GEMINI_API_BASE").unwrap_or(default.model.api_base),
                timeout_secs: env::var("MODEL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default.model.timeout_secs),
            },

            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),
        }
    }

    /// Create config for development (any origin, in-memory database)
    pub fn development() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }

    /// Create config for production (secrets must come from the environment)
    pub fn production() -> Self {
        let from_env = Self::from_env();
        Self {
            upstream_body_limit: 200,
            ..from_env
        }
    }

    /// True when CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
