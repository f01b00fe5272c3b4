pub mod analyze;
pub(crate) mod health;
pub mod jobs;
pub mod watch;

pub use health::health_check;
