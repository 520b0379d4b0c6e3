//! Document summarization

pub mod summarizer;

pub use summarizer::{RecursiveSummarizer, CHUNK_SUMMARY_FAILED, SUMMARY_FAILED};
