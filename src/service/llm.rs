//! Shared LLM client and invocation contract
//!
//! Provides the single seam between the pipeline and the OpenAI API.
//! The pipeline only sees the `ModelInvoker` trait, so tests substitute
//! a scripted stub without touching the network.

use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use crate::model::PipelineConfig;

/// Environment variable overriding the pipeline model
const ENV_MODEL: &str = "ILAE_MODEL";

/// Default model for all three pipeline stages
const DEFAULT_MODEL: &str = openai::GPT_4O;

/// Base delay for rate-limit backoff, doubled per attempt
const BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Cap on the backoff exponent; bounds the delay at 64s per attempt
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Requested response shape for a model invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Free-form text
    #[allow(dead_code)] // Every active pipeline stage requests JSON
    Text,
    /// JSON-constrained response where the provider supports it
    Json,
}

/// Error type for model invocation
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum InvocationError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM rate limit persisted after {0} retries")]
    RateLimited(u32),
}

/// Contract for sending a prompt to the external model service
///
/// One invocation is one network call; the returned text is delivered
/// as-is, without content inspection.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str, mode: OutputMode) -> Result<String, InvocationError>;
}

/// Production invoker backed by the OpenAI API
#[derive(Clone)]
pub struct LlmClient {
    client: openai::Client,
    model: String,
    request_timeout: Duration,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new LLM client with the provided API key
    ///
    /// Uses the ILAE_MODEL env var for the model id (defaults to gpt-4o);
    /// timeout and retry caps come from the pipeline configuration.
    pub fn new(api_key: &str, pipeline: &PipelineConfig) -> Self {
        let client = openai::Client::new(api_key);

        let model = std::env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        tracing::info!(
            model = %model,
            request_timeout_secs = pipeline.request_timeout_secs,
            max_retries = pipeline.max_retries,
            "LLM client initialized"
        );

        Self {
            client,
            model,
            request_timeout: Duration::from_secs(pipeline.request_timeout_secs),
            max_retries: pipeline.max_retries,
        }
    }

    async fn invoke_once(&self, prompt: &str, mode: OutputMode) -> Result<String, String> {
        let mut builder = self.client.agent(&self.model).temperature(0.0);

        if mode == OutputMode::Json {
            builder = builder.additional_params(serde_json::json!({
                "response_format": { "type": "json_object" }
            }));
        }

        let agent = builder.build();
        agent.prompt(prompt).await.map_err(|e| e.to_string())
    }
}

/// Whether an error message indicates a provider rate limit
fn is_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests")
}

/// Backoff delay for a retry attempt, exponential with a capped exponent
fn backoff_delay(attempt: u32) -> Duration {
    BACKOFF_BASE * 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT))
}

#[async_trait]
impl ModelInvoker for LlmClient {
    async fn invoke(&self, prompt: &str, mode: OutputMode) -> Result<String, InvocationError> {
        let mut attempt = 0;

        loop {
            let start_time = std::time::Instant::now();

            let outcome =
                tokio::time::timeout(self.request_timeout, self.invoke_once(prompt, mode)).await;

            match outcome {
                Ok(Ok(text)) => {
                    tracing::debug!(
                        model = %self.model,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        prompt_length = prompt.len(),
                        response_length = text.len(),
                        "LLM call completed"
                    );
                    return Ok(text);
                }
                Ok(Err(message)) if is_rate_limited(&message) => {
                    if attempt >= self.max_retries {
                        tracing::error!(
                            model = %self.model,
                            retries = self.max_retries,
                            "LLM rate limit persisted, giving up"
                        );
                        return Err(InvocationError::RateLimited(self.max_retries));
                    }
                    let delay = backoff_delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        model = %self.model,
                        attempt = attempt,
                        delay_secs = delay.as_secs(),
                        "LLM rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(Err(message)) => {
                    tracing::error!(
                        model = %self.model,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        prompt_length = prompt.len(),
                        error = %message,
                        "LLM call failed"
                    );
                    return Err(InvocationError::RequestFailed(message));
                }
                Err(_) => {
                    tracing::error!(
                        model = %self.model,
                        timeout_secs = self.request_timeout.as_secs(),
                        prompt_length = prompt.len(),
                        "LLM call timed out"
                    );
                    return Err(InvocationError::Timeout(self.request_timeout.as_secs()));
                }
            }
        }
    }
}
