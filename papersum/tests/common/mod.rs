#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

use papersum::config::{
    AnalysisConfig, CacheConfig, Config, DatabaseConfig, FetchConfig, LlmConfig, ServerConfig,
    WatchConfig, WorkerConfig,
};
use papersum::db::{Database, DatabaseBackend, LibSqlBackend};

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Config pointing the job store at `dir` and the provider at `llm_server`.
pub fn test_config(dir: &TempDir, llm_server: &MockServer) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig::local_file(dir.path().join("jobs.db")),
        fetch: FetchConfig {
            timeout_secs: 5,
            ..FetchConfig::default()
        },
        analysis: AnalysisConfig::default(),
        worker: WorkerConfig {
            poll_interval_secs: 1,
        },
        watch: WatchConfig { interval_ms: 25 },
        cache: CacheConfig { capacity: 0 },
        llm: Some(LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: Some("test-key".to_string()),
            base_url: Some(llm_server.uri()),
            timeout_secs: 5,
            temperature: None,
        }),
    }
}

pub async fn open_store(config: &Config) -> Arc<dyn DatabaseBackend> {
    let db = Database::new(&config.database)
        .await
        .expect("open test database");
    Arc::new(LibSqlBackend::new(db))
}

/// An OpenAI-style chat completion whose reply text is `content`.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

pub const SLEEP_STUDY_REPLY: &str = "<analysis>\n\
  <title>Sleep Helps Memory</title>\n\
  <summary>Researchers looked at how sleep helps memory.</summary>\n\
  <methodology>A survey of 500 students.</methodology>\n\
  <takeaways>\n\
    <item>Sleep helps</item>\n\
    <item>Naps help a little</item>\n\
  </takeaways>\n\
</analysis>";

// Re-export commonly used crates for convenience
pub use serial_test::serial;
pub use tempfile;
pub use wiremock;
