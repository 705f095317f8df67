pub mod llm;
pub mod parser;
pub mod scoring;

pub use llm::{LlmClient, ModelInvoker, OutputMode};
pub use scoring::ScoringService;
