use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Session secret used when `SECRET_KEY` is unset. Rejected in production.
pub const INSECURE_DEFAULT_SECRET: &str = "your-secret-key";

/// Minimum secret length accepted in production.
pub const MIN_SECRET_LEN: usize = 32;

/// Most texts `batchEmbedContents` accepts in one request.
pub const MAX_EMBEDDING_BATCH: usize = 100;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ── Key lookup ────────────────────────────────────────────────

/// Reads profiled keys: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
/// Empty values count as unset.
struct Source<'a> {
    profile: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Source<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            let prefixed = format!("{}_{}", self.profile, key);
            if let Some(v) = (self.lookup)(&prefixed).filter(|s| !s.is_empty()) {
                return Some(v);
            }
        }
        (self.lookup)(key).filter(|s| !s.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.opt(key) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: format!("'{raw}': {e}"),
            }),
            None => Ok(default),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

/// Holds credentials; expose it only through `redacted_summary`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub environment: Environment,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub http: HttpConfig,
    pub gemini: GeminiConfig,
    pub embedding: EmbeddingConfig,
    pub vector: VectorConfig,
    pub chunking: ChunkingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PDFQA_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env::var("PDFQA_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config from the process environment for a specific named profile.
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(profile, &|key| env::var(key).ok())
    }

    /// Build config from an in-memory map (tests, embedding).
    pub fn from_map(profile: &str, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(profile, &|key| vars.get(key).cloned())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(
        profile: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let src = Source { profile: &p, lookup };
        Ok(Self {
            profile: p.clone(),
            environment: src.parse("APP_ENV", Environment::Development)?,
            server: ServerConfig::from_source(&src)?,
            session: SessionConfig::from_source(&src)?,
            http: HttpConfig::from_source(&src)?,
            gemini: GeminiConfig::from_source(&src)?,
            embedding: EmbeddingConfig::from_source(&src)?,
            vector: VectorConfig::from_source(&src)?,
            chunking: ChunkingConfig::from_source(&src)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Check cross-field rules and required credentials.
    ///
    /// The server refuses to start when this fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "CHUNK_SIZE",
                reason: "must be greater than zero".into(),
            });
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid {
                key: "CHUNK_OVERLAP",
                reason: format!(
                    "overlap {} must be smaller than chunk size {}",
                    self.chunking.chunk_overlap, self.chunking.chunk_size
                ),
            });
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_DIMENSIONS",
                reason: "must be greater than zero".into(),
            });
        }
        if self.embedding.batch_size == 0 || self.embedding.batch_size > MAX_EMBEDDING_BATCH {
            return Err(ConfigError::Invalid {
                key: "EMBEDDING_BATCH_SIZE",
                reason: format!("must be between 1 and {MAX_EMBEDDING_BATCH}"),
            });
        }
        if self.vector.top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "RETRIEVAL_TOP_K",
                reason: "must be greater than zero".into(),
            });
        }
        if self.gemini.api_key.is_none() {
            return Err(ConfigError::Missing("GOOGLE_API_KEY"));
        }
        if self.vector.provider == VectorProvider::Pinecone && self.vector.pinecone_api_key.is_none() {
            return Err(ConfigError::Missing("PINECONE_API_KEY"));
        }

        let insecure = self.session.secret == INSECURE_DEFAULT_SECRET
            || self.session.secret.len() < MIN_SECRET_LEN;
        if insecure {
            if self.environment == Environment::Production {
                return Err(ConfigError::InsecureSecret { min_len: MIN_SECRET_LEN });
            }
            tracing::warn!(
                component = "config",
                "SECRET_KEY is unset or weak; acceptable for development only"
            );
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}, env: {}):", self.profile_label(), self.environment.as_str());
        tracing::info!("  server:      {}:{} (upload limit {} MB)", self.server.host, self.server.port, self.server.max_upload_mb);
        tracing::info!("  gemini:      chat={}, embedding={}", self.gemini.chat_model, self.gemini.embedding_model);
        tracing::info!("  vector:      provider={}, index_mode={}", self.vector.provider.as_str(), self.vector.index_mode.as_str());
        tracing::info!("  chunking:    size={}, overlap={}", self.chunking.chunk_size, self.chunking.chunk_overlap);
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "environment": self.environment.as_str(),
            "gemini": {
                "chat_model": self.gemini.chat_model,
                "embedding_model": self.gemini.embedding_model,
                "configured": self.gemini.api_key.is_some(),
            },
            "vector": {
                "provider": self.vector.provider.as_str(),
                "index_mode": self.vector.index_mode.as_str(),
                "top_k": self.vector.top_k,
            },
            "chunking": {
                "chunk_size": self.chunking.chunk_size,
                "chunk_overlap": self.chunking.chunk_overlap,
            },
        })
    }
}

// ── Environment ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
    /// Upper bound for handling one HTTP request end to end.
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: src.or("HOST", "127.0.0.1"),
            port: src.parse("PORT", 5000)?,
            max_upload_mb: src.parse("MAX_UPLOAD_MB", 50)?,
            request_timeout_secs: src.parse("REQUEST_TIMEOUT_SECS", 300)?,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ── Session ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: u64,
}

// Keep the secret out of debug output.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

impl SessionConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: src.or("SECRET_KEY", INSECURE_DEFAULT_SECRET),
            ttl_minutes: src.parse("SESSION_TTL_MINUTES", 1440)?,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes * 60)
    }
}

// ── Outbound HTTP ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            timeout_secs: src.parse("HTTP_TIMEOUT_SECS", 60)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ── Gemini (generation + embeddings) ─────────────────────────

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl GeminiConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: src.opt("GOOGLE_API_KEY"),
            base_url: src.or("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com"),
            chat_model: src.or("GEMINI_CHAT_MODEL", "gemini-1.5-pro-latest"),
            embedding_model: src.or("GEMINI_EMBEDDING_MODEL", "models/embedding-001"),
            temperature: src.parse("LLM_TEMPERATURE", 0.9)?,
            max_tokens: src.parse("LLM_MAX_TOKENS", 2048)?,
        })
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    /// Texts per embedding request, at most `MAX_EMBEDDING_BATCH`.
    pub batch_size: usize,
}

impl EmbeddingConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            dimensions: src.parse("EMBEDDING_DIMENSIONS", 768)?,
            batch_size: src.parse("EMBEDDING_BATCH_SIZE", 100)?,
        })
    }
}

// ── Vector index ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorProvider {
    Pinecone,
    /// Process-local index; data is lost on restart.
    Memory,
}

impl VectorProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorProvider::Pinecone => "pinecone",
            VectorProvider::Memory => "memory",
        }
    }
}

impl FromStr for VectorProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pinecone" => Ok(VectorProvider::Pinecone),
            "memory" | "in-memory" => Ok(VectorProvider::Memory),
            other => Err(format!("unknown vector provider '{other}'")),
        }
    }
}

/// How ingestions map to remote index names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    /// Every ingestion creates its own index.
    PerSession,
    /// All users share `shared_index`.
    Shared,
}

impl IndexMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMode::PerSession => "per_session",
            IndexMode::Shared => "shared",
        }
    }
}

impl FromStr for IndexMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "per_session" | "session" => Ok(IndexMode::PerSession),
            "shared" => Ok(IndexMode::Shared),
            other => Err(format!("unknown index mode '{other}'")),
        }
    }
}

#[derive(Clone)]
pub struct VectorConfig {
    pub provider: VectorProvider,
    pub pinecone_api_key: Option<String>,
    pub controller_url: String,
    pub cloud: String,
    pub region: String,
    pub index_mode: IndexMode,
    pub index_prefix: String,
    pub shared_index: String,
    pub ready_timeout_secs: u64,
    pub top_k: usize,
}

impl std::fmt::Debug for VectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorConfig")
            .field("provider", &self.provider)
            .field("pinecone_api_key", &self.pinecone_api_key.as_ref().map(|_| "<redacted>"))
            .field("controller_url", &self.controller_url)
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .field("index_mode", &self.index_mode)
            .field("index_prefix", &self.index_prefix)
            .field("shared_index", &self.shared_index)
            .field("ready_timeout_secs", &self.ready_timeout_secs)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl VectorConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            provider: src.parse("VECTOR_PROVIDER", VectorProvider::Pinecone)?,
            pinecone_api_key: src.opt("PINECONE_API_KEY"),
            controller_url: src.or("PINECONE_CONTROLLER_URL", "https://api.pinecone.io"),
            cloud: src.or("PINECONE_CLOUD", "aws"),
            region: src.or("PINECONE_REGION", "us-east-1"),
            index_mode: src.parse("PINECONE_INDEX_MODE", IndexMode::PerSession)?,
            index_prefix: src.or("PINECONE_INDEX_PREFIX", "pdfqa"),
            shared_index: src.or("PINECONE_SHARED_INDEX", "testing"),
            ready_timeout_secs: src.parse("INDEX_READY_TIMEOUT_SECS", 120)?,
            top_k: src.parse("RETRIEVAL_TOP_K", 4)?,
        })
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    fn from_source(src: &Source<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            chunk_size: src.parse("CHUNK_SIZE", 10_000)?,
            chunk_overlap: src.parse("CHUNK_OVERLAP", 1_000)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![("GOOGLE_API_KEY", "g-key"), ("PINECONE_API_KEY", "p-key")]
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::from_map("", &vars(&base())).unwrap();
        assert_eq!(cfg.chunking.chunk_size, 10_000);
        assert_eq!(cfg.chunking.chunk_overlap, 1_000);
        assert_eq!(cfg.embedding.dimensions, 768);
        assert_eq!(cfg.vector.top_k, 4);
        assert_eq!(cfg.vector.provider, VectorProvider::Pinecone);
        assert_eq!(cfg.vector.index_mode, IndexMode::PerSession);
        assert_eq!(cfg.vector.cloud, "aws");
        assert_eq!(cfg.vector.region, "us-east-1");
        assert!((cfg.gemini.temperature - 0.9).abs() < 1e-6);
        assert_eq!(cfg.session.secret, INSECURE_DEFAULT_SECRET);
        assert_eq!(cfg.environment, Environment::Development);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn profile_prefix_takes_precedence() {
        let mut pairs = base();
        pairs.push(("PORT", "8080"));
        pairs.push(("PROD_PORT", "9090"));
        pairs.push(("PROD_PINECONE_REGION", "eu-west-1"));
        let cfg = Config::from_map("prod", &vars(&pairs)).unwrap();
        assert_eq!(cfg.profile, "PROD");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.vector.region, "eu-west-1");
        assert_eq!(cfg.vector.cloud, "aws");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = Config::from_map("", &vars(&[("GOOGLE_API_KEY", "")])).unwrap();
        assert!(cfg.gemini.api_key.is_none());
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("GOOGLE_API_KEY"))));
    }

    #[test]
    fn unparseable_number_is_rejected() {
        let mut pairs = base();
        pairs.push(("PORT", "eighty"));
        let err = Config::from_map("", &vars(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut pairs = base();
        pairs.push(("CHUNK_SIZE", "100"));
        pairs.push(("CHUNK_OVERLAP", "100"));
        let cfg = Config::from_map("", &vars(&pairs)).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { key: "CHUNK_OVERLAP", .. })));
    }

    #[test]
    fn pinecone_key_only_required_for_pinecone() {
        let cfg = Config::from_map(
            "",
            &vars(&[("GOOGLE_API_KEY", "g"), ("VECTOR_PROVIDER", "memory")]),
        )
        .unwrap();
        assert!(cfg.validate().is_ok());

        let cfg = Config::from_map("", &vars(&[("GOOGLE_API_KEY", "g")])).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Missing("PINECONE_API_KEY"))));
    }

    #[test]
    fn production_rejects_default_secret() {
        let mut pairs = base();
        pairs.push(("APP_ENV", "production"));
        let cfg = Config::from_map("", &vars(&pairs)).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::InsecureSecret { .. })));

        pairs.push(("SECRET_KEY", "0123456789abcdef0123456789abcdef"));
        let cfg = Config::from_map("", &vars(&pairs)).unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn index_mode_parses_both_spellings() {
        assert_eq!("per-session".parse::<IndexMode>().unwrap(), IndexMode::PerSession);
        assert_eq!("SHARED".parse::<IndexMode>().unwrap(), IndexMode::Shared);
        assert!("global".parse::<IndexMode>().is_err());
    }

    #[test]
    fn embedding_batch_size_is_capped() {
        let mut pairs = base();
        pairs.push(("EMBEDDING_BATCH_SIZE", "100"));
        assert!(Config::from_map("", &vars(&pairs)).unwrap().validate().is_ok());

        pairs.push(("EMBEDDING_BATCH_SIZE", "101"));
        let cfg = Config::from_map("", &vars(&pairs)).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { key: "EMBEDDING_BATCH_SIZE", .. })));

        let cfg = Config::from_map("", &vars(&[("GOOGLE_API_KEY", "g"), ("EMBEDDING_BATCH_SIZE", "0")])).unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { key: "EMBEDDING_BATCH_SIZE", .. })));
    }

    #[test]
    fn redacted_summary_has_no_secrets() {
        let mut pairs = base();
        pairs.push(("SECRET_KEY", "super-secret-value"));
        let cfg = Config::from_map("", &vars(&pairs)).unwrap();
        let summary = cfg.redacted_summary().to_string();
        assert!(!summary.contains("super-secret-value"));
        assert!(!summary.contains("g-key"));
        assert!(!summary.contains("p-key"));
        assert_eq!(cfg.redacted_summary()["gemini"]["configured"], true);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut pairs = base();
        pairs.push(("SECRET_KEY", "super-secret-value"));
        let cfg = Config::from_map("", &vars(&pairs)).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret-value"));
        assert!(!dbg.contains("g-key"));
        assert!(!dbg.contains("p-key"));
    }
}
