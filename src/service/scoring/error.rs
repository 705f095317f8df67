//! Error types for the scoring pipeline

use thiserror::Error;

use crate::service::llm::InvocationError;
use crate::service::parser::ParseError;

/// Error type for note scoring
///
/// Any stage failure is terminal for the request; no partial result is
/// produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("LLM invocation failed during {stage}: {source}")]
    Invocation {
        stage: &'static str,
        #[source]
        source: InvocationError,
    },

    #[error("failed to parse {stage} response: {source}")]
    Parse {
        stage: &'static str,
        #[source]
        source: ParseError,
    },
}
