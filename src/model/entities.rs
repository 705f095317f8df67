//! Domain types for clinical note scoring
//!
//! These mirror the JSON shapes exchanged with the LLM at each pipeline
//! stage and the two artifacts surfaced to the rendering layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel for a value the model could not determine
pub const UNKNOWN: &str = "I don't know";

/// Sentinel for supporting text absent from the clinical note
pub const NOT_FOUND_IN_NOTE: &str = "Not found in the clinical note";

/// Sentinel for supporting text that was never supplied
pub const NOT_PROVIDED: &str = "Not provided";

/// Score value used when the model declines to classify
pub const INDETERMINATE: &str = "indeterminate";

/// A single clinical variable extracted from the note
///
/// `value` is a judgment token ("Yes"/"No"/"I don't know") or a numeric
/// string. `supporting_text` is a verbatim quote from the note or one of
/// the sentinels; the grounding check in `service::scoring::validation`
/// enforces this before the entity leaves stage 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedEntity {
    pub value: String,
    pub supporting_text: String,
}

impl ExtractedEntity {
    /// Whether the supporting text is one of the defined sentinels
    pub fn has_sentinel_support(&self) -> bool {
        self.supporting_text == NOT_FOUND_IN_NOTE || self.supporting_text == NOT_PROVIDED
    }
}

/// The four clinical variables produced by stage 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ExtractedEntities {
    pub presence_of_seizure_freedom: ExtractedEntity,
    pub presence_of_auras: ExtractedEntity,
    pub baseline_seizure_days: ExtractedEntity,
    pub seizure_days_per_year: ExtractedEntity,
}

impl ExtractedEntities {
    /// Iterate the entities with their JSON field names
    pub fn iter_mut_named(&mut self) -> [(&'static str, &mut ExtractedEntity); 4] {
        [
            (
                "presence_of_seizure_freedom",
                &mut self.presence_of_seizure_freedom,
            ),
            ("presence_of_auras", &mut self.presence_of_auras),
            ("baseline_seizure_days", &mut self.baseline_seizure_days),
            ("seizure_days_per_year", &mut self.seizure_days_per_year),
        ]
    }
}

/// Stage 2 output: the classification and its full reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreResult {
    /// "1".."6" or "indeterminate"
    pub ilae_score: String,
    pub detailed_explanation: String,
}

/// Stage 3 output: a summary derived solely from the detailed explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConciseResult {
    pub concise_explanation: String,
}

/// Primary artifact returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinalOutput {
    pub ilae_score: String,
    pub concise_explanation: String,
    pub extracted_entities: ExtractedEntities,
}

/// Companion artifact carrying the full reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailedOutput {
    pub detailed_explanation: String,
}
