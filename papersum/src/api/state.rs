use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::llm::LlmProvider;
use crate::processing::AnalysisPipeline;
use crate::services::{cache_store_for_capacity, JobService, ResultCache, StatusWatcher};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub llm: LlmProvider,
    pub jobs: JobService,
    pub watcher: StatusWatcher,
    /// In-memory results of `POST /analyze`; not shared with the job queue.
    pub cache: ResultCache,
}

impl AppState {
    pub fn new(config: Config, db: Arc<dyn DatabaseBackend>, pipeline: AnalysisPipeline) -> Self {
        let config = Arc::new(config);
        let llm = pipeline.llm().clone();
        let jobs = JobService::new(db.clone());
        let watcher = StatusWatcher::new(
            db.clone(),
            Duration::from_millis(config.watch.interval_ms),
        );
        let cache = ResultCache::new(cache_store_for_capacity(config.cache.capacity), pipeline);

        Self {
            config,
            db,
            llm,
            jobs,
            watcher,
            cache,
        }
    }
}
