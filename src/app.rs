//! Application state and service initialization
//!
//! Centralizes service construction so the dependency graph is built
//! once at process start and is read-only thereafter.

use std::sync::Arc;

use crate::model::Config;
use crate::service::{LlmClient, ScoringService};

const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Application state containing all services
pub struct AppState {
    /// Note scoring pipeline
    pub scoring_service: Arc<ScoringService>,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. LLM client initialization (requires OPENAI_API_KEY)
    /// 2. Scoring pipeline construction around the shared client
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let api_key = std::env::var(ENV_OPENAI_API_KEY)
            .map_err(|_| AppError::MissingConfig(ENV_OPENAI_API_KEY))?;

        let llm_client = LlmClient::new(&api_key, &config.pipeline);

        let scoring_service = Arc::new(ScoringService::new(Arc::new(llm_client)));

        Ok(Self { scoring_service })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),
}
