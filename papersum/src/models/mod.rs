mod analysis;
mod job;

pub use analysis::*;
pub use job::*;
