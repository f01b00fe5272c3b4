mod extractor;
pub mod parser;
mod pipeline;

pub use extractor::{ContentExtractor, ContentKind, ExtractedText};
pub use parser::parse_reply;
pub use pipeline::AnalysisPipeline;
