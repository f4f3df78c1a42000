//! Configuration module
//!
//! Env-driven configuration for the API, worker, and service clients.
//! `Config::from_env` is the single entry point; call it once at process
//! start and pass the result down — nothing here reads the environment
//! after construction.

use std::env;
use std::str::FromStr;

use crate::storage_types::StorageBackend;

const DEFAULT_SERVER_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FREE_PAGES_PER_PDF: u32 = 5;
const DEFAULT_PRO_PAGES_PER_PDF: u32 = 25;
const DEFAULT_FREE_MAX_FILE_SIZE: usize = 4 * 1024 * 1024;
const DEFAULT_PRO_MAX_FILE_SIZE: usize = 16 * 1024 * 1024;
const DEFAULT_INGEST_MAX_CONCURRENT: usize = 4;
const DEFAULT_LLM_MAX_TOKENS: u32 = 1000;

/// Strategy used by the regeneration endpoint. Fixed per deployment;
/// never switched per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// Build a PDF containing the submitted text directly.
    Direct,
    /// Ask the completion provider to synthesize the new document.
    Llm,
}

impl FromStr for GenerationStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(GenerationStrategy::Direct),
            "llm" => Ok(GenerationStrategy::Llm),
            _ => Err(anyhow::anyhow!(
                "Invalid generation strategy: {} (expected 'direct' or 'llm')",
                s
            )),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    environment: String,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    jwt_secret: String,
    // Storage
    storage_backend: Option<StorageBackend>,
    s3_bucket: Option<String>,
    s3_region: Option<String>,
    s3_endpoint: Option<String>,
    local_storage_path: Option<String>,
    local_storage_base_url: Option<String>,
    // Plan ceilings
    free_pages_per_pdf: u32,
    pro_pages_per_pdf: u32,
    free_max_file_size_bytes: usize,
    pro_max_file_size_bytes: usize,
    // Embeddings provider
    embeddings_endpoint: String,
    embeddings_api_key: Option<String>,
    embeddings_model: String,
    // Vector index
    vector_index_endpoint: Option<String>,
    vector_index_api_key: Option<String>,
    // Completion provider
    llm_endpoint: String,
    llm_api_key: Option<String>,
    llm_model: String,
    llm_max_tokens: u32,
    // Billing
    billing_endpoint: Option<String>,
    // Regeneration
    generation_strategy: GenerationStrategy,
    // Ingestion worker pool
    ingest_max_concurrent: usize,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T: FromStr>(key: &str, default: T) -> T {
    env_opt(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let database_url = env_opt("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            env_opt("JWT_SECRET").ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let storage_backend = match env_opt("STORAGE_BACKEND") {
            Some(v) => Some(v.parse::<StorageBackend>()?),
            None => None,
        };

        let generation_strategy = env_or("GENERATION_STRATEGY", "direct")
            .parse::<GenerationStrategy>()?;

        Ok(Config {
            server_port: env_parse_or("PORT", DEFAULT_SERVER_PORT),
            environment: env_or("ENVIRONMENT", "development"),
            database_url,
            db_max_connections: env_parse_or("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env_parse_or("DB_TIMEOUT_SECONDS", DEFAULT_DB_TIMEOUT_SECS),
            jwt_secret,
            storage_backend,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            free_pages_per_pdf: env_parse_or("FREE_PAGES_PER_PDF", DEFAULT_FREE_PAGES_PER_PDF),
            pro_pages_per_pdf: env_parse_or("PRO_PAGES_PER_PDF", DEFAULT_PRO_PAGES_PER_PDF),
            free_max_file_size_bytes: env_parse_or(
                "FREE_MAX_FILE_SIZE_BYTES",
                DEFAULT_FREE_MAX_FILE_SIZE,
            ),
            pro_max_file_size_bytes: env_parse_or(
                "PRO_MAX_FILE_SIZE_BYTES",
                DEFAULT_PRO_MAX_FILE_SIZE,
            ),
            embeddings_endpoint: env_or("EMBEDDINGS_ENDPOINT", "https://api.openai.com/v1"),
            embeddings_api_key: env_opt("OPENAI_API_KEY"),
            embeddings_model: env_or("EMBEDDINGS_MODEL", "text-embedding-ada-002"),
            vector_index_endpoint: env_opt("VECTOR_INDEX_ENDPOINT"),
            vector_index_api_key: env_opt("VECTOR_INDEX_API_KEY"),
            llm_endpoint: env_or("LLM_ENDPOINT", "https://api.openai.com/v1"),
            llm_api_key: env_opt("LLM_API_KEY").or_else(|| env_opt("OPENAI_API_KEY")),
            llm_model: env_or("LLM_MODEL", "gpt-3.5-turbo"),
            llm_max_tokens: env_parse_or("LLM_MAX_TOKENS", DEFAULT_LLM_MAX_TOKENS),
            billing_endpoint: env_opt("BILLING_ENDPOINT"),
            generation_strategy,
            ingest_max_concurrent: env_parse_or(
                "INGEST_MAX_CONCURRENT",
                DEFAULT_INGEST_MAX_CONCURRENT,
            ),
        })
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn free_pages_per_pdf(&self) -> u32 {
        self.free_pages_per_pdf
    }

    pub fn pro_pages_per_pdf(&self) -> u32 {
        self.pro_pages_per_pdf
    }

    pub fn free_max_file_size_bytes(&self) -> usize {
        self.free_max_file_size_bytes
    }

    pub fn pro_max_file_size_bytes(&self) -> usize {
        self.pro_max_file_size_bytes
    }

    pub fn embeddings_endpoint(&self) -> &str {
        &self.embeddings_endpoint
    }

    pub fn embeddings_api_key(&self) -> Option<&str> {
        self.embeddings_api_key.as_deref()
    }

    pub fn embeddings_model(&self) -> &str {
        &self.embeddings_model
    }

    pub fn vector_index_endpoint(&self) -> Option<&str> {
        self.vector_index_endpoint.as_deref()
    }

    pub fn vector_index_api_key(&self) -> Option<&str> {
        self.vector_index_api_key.as_deref()
    }

    pub fn llm_endpoint(&self) -> &str {
        &self.llm_endpoint
    }

    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm_api_key.as_deref()
    }

    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    pub fn llm_max_tokens(&self) -> u32 {
        self.llm_max_tokens
    }

    pub fn billing_endpoint(&self) -> Option<&str> {
        self.billing_endpoint.as_deref()
    }

    pub fn generation_strategy(&self) -> GenerationStrategy {
        self.generation_strategy
    }

    pub fn ingest_max_concurrent(&self) -> usize {
        self.ingest_max_concurrent
    }
}
