//! Document ingestion: chunking for retrieval and packing for summarization

pub mod chunker;
pub mod packer;
pub mod pipeline;

pub use chunker::TextChunker;
pub use packer::pack;
pub use pipeline::{IngestPipeline, IngestReport};
