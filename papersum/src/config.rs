use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36 papersum/0.1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub fetch: FetchConfig,
    pub analysis: AnalysisConfig,
    pub worker: WorkerConfig,
    pub watch: WatchConfig,
    pub cache: CacheConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    /// Embedded replica file for a remote database.
    pub local_path: Option<String>,
    /// Applied to every local connection; the API and the worker share one file.
    pub busy_timeout_ms: u64,
    pub journal_mode: JournalMode,
    pub synchronous: SynchronousMode,
}

impl DatabaseConfig {
    /// A local database file with default pragmas.
    pub fn local_file(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            url: format!("file:{}", path.as_ref().display()),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: JournalMode::default(),
            synchronous: SynchronousMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Memory => "MEMORY",
            Self::Wal => "WAL",
            Self::Off => "OFF",
        }
    }
}

impl std::str::FromStr for JournalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DELETE" => Ok(Self::Delete),
            "TRUNCATE" => Ok(Self::Truncate),
            "PERSIST" => Ok(Self::Persist),
            "MEMORY" => Ok(Self::Memory),
            "WAL" => Ok(Self::Wal),
            "OFF" => Ok(Self::Off),
            _ => Err(format!("Unknown journal mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SynchronousMode {
    Off,
    #[default]
    Normal,
    Full,
    Extra,
}

impl SynchronousMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

impl std::str::FromStr for SynchronousMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OFF" => Ok(Self::Off),
            "NORMAL" => Ok(Self::Normal),
            "FULL" => Ok(Self::Full),
            "EXTRA" => Ok(Self::Extra),
            _ => Err(format!("Unknown synchronous mode: {s}")),
        }
    }
}

/// How documents are downloaded before extraction.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Shape of the reply requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    /// `<title>`, `<summary>`, `<methodology>`, `<takeaways>` markers.
    #[default]
    Tagged,
    /// A single JSON object with the same four fields.
    Json,
}

impl std::str::FromStr for ReplyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tagged" | "xml" => Ok(Self::Tagged),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown reply format: {s}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Extracted text beyond this many characters is dropped before prompting.
    pub max_chars: usize,
    pub takeaways: usize,
    pub reply_format: ReplyFormat,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_chars: 900_000,
            takeaways: 4,
            reply_format: ReplyFormat::Tagged,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 0 keeps every entry forever; anything else bounds the cache with LRU eviction.
    pub capacity: usize,
}

/// LLM configuration for the summarization provider
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("PAPERSUM_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("PAPERSUM_PORT", 3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:jobs.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: parse_env_or("DATABASE_JOURNAL_MODE", JournalMode::Wal),
                synchronous: parse_env_or("DATABASE_SYNCHRONOUS", SynchronousMode::Normal),
            },
            fetch: FetchConfig {
                timeout_secs: parse_env_or("FETCH_TIMEOUT_SECS", 30),
                user_agent: env::var("FETCH_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
                max_bytes: parse_env_or("FETCH_MAX_BYTES", 50 * 1024 * 1024),
            },
            analysis: AnalysisConfig {
                max_chars: parse_env_or("ANALYSIS_MAX_CHARS", 900_000),
                takeaways: parse_env_or("ANALYSIS_TAKEAWAYS", 4),
                reply_format: parse_env_or("ANALYSIS_REPLY_FORMAT", ReplyFormat::Tagged),
            },
            worker: WorkerConfig {
                poll_interval_secs: parse_env_or("WORKER_POLL_INTERVAL_SECS", 5),
            },
            watch: WatchConfig {
                interval_ms: parse_env_or("WATCH_INTERVAL_MS", 1000),
            },
            cache: CacheConfig {
                capacity: parse_env_or("CACHE_CAPACITY", 0),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 120),
                temperature: parse_env_opt("LLM_TEMPERATURE"),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "gemini"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}
