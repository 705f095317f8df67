//! Response parsing for LLM output
//!
//! Model replies are requested as JSON but frequently arrive wrapped in
//! prose or code fences. Decoding tries the raw text first, then the
//! first balanced `{...}` block. No repair of malformed JSON is
//! attempted; a reply without a decodable object is a terminal failure
//! for the request.

use serde::de::DeserializeOwned;

/// Error type for response parsing
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoJsonObject,

    #[error("malformed JSON in model response: {0}")]
    InvalidJson(String),

    #[error("model response does not match the expected schema: {0}")]
    InvalidSchema(String),
}

/// Extract a JSON object from raw model text
///
/// Direct decode first; on failure, scan for the first balanced brace
/// block (string- and escape-aware, across lines) and decode that.
pub fn extract_json(raw: &str) -> Result<serde_json::Value, ParseError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed)
        && value.is_object()
    {
        return Ok(value);
    }

    let candidate = first_balanced_object(trimmed).ok_or(ParseError::NoJsonObject)?;

    serde_json::from_str(candidate).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

/// Extract and deserialize a stage output in one step
///
/// A missing required field surfaces as `InvalidSchema`.
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let value = extract_json(raw)?;
    serde_json::from_value(value).map_err(|e| ParseError::InvalidSchema(e.to_string()))
}

/// Locate the first balanced `{...}` block in the text
///
/// Brace depth ignores braces inside JSON string literals, including
/// escaped quotes.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}
