//! Grounding checks for extracted supporting texts
//!
//! The rendering layer highlights each `supporting_text` by
//! case-insensitive substring match against the original note, so every
//! non-sentinel supporting text leaving stage 1 must actually occur in
//! the note. Ungrounded quotes are degraded to the "Not found in the
//! clinical note" sentinel rather than failing the request; the
//! extracted value itself is kept.

use crate::model::entities::NOT_FOUND_IN_NOTE;
use crate::model::{ExtractedEntities, ExtractedEntity};

/// Result of the grounding pass over stage-1 output
#[derive(Debug, Default)]
pub struct GroundingResult {
    /// Field names whose supporting text was replaced with the sentinel
    pub degraded_fields: Vec<&'static str>,
}

impl GroundingResult {
    pub fn is_fully_grounded(&self) -> bool {
        self.degraded_fields.is_empty()
    }
}

/// Enforce the substring invariant on all four entities
///
/// Grounded quotes are stored trimmed, so the retained text is itself
/// a substring of the note even when the model pads it with whitespace.
pub fn enforce_grounding(entities: &mut ExtractedEntities, note: &str) -> GroundingResult {
    let mut result = GroundingResult::default();

    for (field, entity) in entities.iter_mut_named() {
        match grounded_quote(entity, note) {
            Quote::Sentinel => {}
            Quote::Grounded(trimmed) => {
                if trimmed.len() != entity.supporting_text.len() {
                    entity.supporting_text = trimmed;
                }
            }
            Quote::Ungrounded => {
                tracing::warn!(
                    field = field,
                    supporting_text = %entity.supporting_text.chars().take(100).collect::<String>(),
                    "Supporting text not found in clinical note, degrading to sentinel"
                );
                entity.supporting_text = NOT_FOUND_IN_NOTE.to_string();
                result.degraded_fields.push(field);
            }
        }
    }

    result
}

enum Quote {
    Sentinel,
    Grounded(String),
    Ungrounded,
}

/// Whether an entity's supporting text satisfies the highlighting contract
fn grounded_quote(entity: &ExtractedEntity, note: &str) -> Quote {
    if entity.has_sentinel_support() {
        return Quote::Sentinel;
    }

    let quote = entity.supporting_text.trim();
    if quote.is_empty() {
        return Quote::Ungrounded;
    }

    if note.to_lowercase().contains(&quote.to_lowercase()) {
        Quote::Grounded(quote.to_string())
    } else {
        Quote::Ungrounded
    }
}
