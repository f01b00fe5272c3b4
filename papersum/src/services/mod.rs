mod cache;
mod jobs;
mod processor;
mod watch;

pub use cache::{
    cache_store_for_capacity, normalize_url, CacheStore, LruCacheStore, ResultCache,
    UnboundedCacheStore,
};
pub use jobs::{validate_source_url, JobService};
pub use processor::JobProcessor;
pub use watch::{StatusWatcher, WatchEvent};
