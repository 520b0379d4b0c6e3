//! Prompting and answer generation

pub mod answer;
pub mod ollama;
pub mod prompt;

pub use answer::{Answer, AnswerGenerator};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
