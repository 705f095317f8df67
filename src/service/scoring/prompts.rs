//! Prompt templates for the three pipeline stages
//!
//! Each builder is pure string construction: fixed task instructions,
//! the expected JSON reply schema with its sentinel fallbacks, and the
//! interpolated prior-stage data.

use crate::model::ExtractedEntities;
use crate::model::entities::INDETERMINATE;
use crate::service::scoring::metric::PercentReduction;

/// Build the stage-1 prompt: entity extraction from the raw note
pub fn build_extraction_prompt(clinical_note: &str) -> String {
    format!(
        r#"You are a clinical information extractor. Your task is to extract the following entities from the provided clinical note, quoting the exact text from the note that supports each entity.

Entities to extract:

1. **Presence of seizure freedom** (Yes/No/I don't know)
2. **Presence of auras** (Yes/No/I don't know)
3. **Baseline seizure days (pre-treatment)** (Numeric value or "I don't know")
4. **Seizure days per year (post-treatment)** (Numeric value or "I don't know")

For each entity, provide:

- **Value**: As specified above.
- **Supporting text**: Exact quote from the clinical note that supports the value.

**Important Guidelines:**

- **Use only the information in the clinical note**. Do not add any information not present.
- **Quote the supporting text exactly** as it appears in the clinical note.
- **Do not paraphrase, summarize, or interpret** beyond the given text.
- If the information is **not present or cannot be determined**, set the value to "I don't know" and the supporting text to "Not found in the clinical note".

**Output Format:**

Provide **only** the extracted entities in the following JSON format (without any additional text):

{{
  "presence_of_seizure_freedom": {{
    "value": "...",
    "supporting_text": "..."
  }},
  "presence_of_auras": {{
    "value": "...",
    "supporting_text": "..."
  }},
  "baseline_seizure_days": {{
    "value": "...",
    "supporting_text": "..."
  }},
  "seizure_days_per_year": {{
    "value": "...",
    "supporting_text": "..."
  }}
}}

**Clinical Note:**

{clinical_note}
"#
    )
}

/// Build the stage-2 prompt: ILAE classification from extracted entities
pub fn build_scoring_prompt(
    entities: &ExtractedEntities,
    percent_reduction: &PercentReduction,
) -> String {
    format!(
        r#"You are a medical expert specializing in epilepsy. Your task is to calculate the ILAE score based on the provided clinical information extracted from the clinical note. Use the ILAE Outcome Scale criteria below to determine the correct score. Provide detailed reasoning for each entity influencing the score, citing the exact text from the clinical note that supports your reasoning.

**ILAE Outcome Scale:**
- **Class 1**: Completely seizure free; no auras
- **Class 2**: Only auras; no other seizures
- **Class 3**: 1 to 3 seizure days per year; ± auras
- **Class 4**: 4 seizure days per year to 50% reduction of baseline seizure days; ± auras
- **Class 5**: Less than 50% reduction of baseline seizure days; ± auras
- **Class 6**: More than 100% increase of baseline seizure days; ± auras

**Extracted Entities and Supporting Texts:**
1. Presence of seizure freedom: {seizure_freedom}
   - Supporting text: {seizure_freedom_support}
2. Presence of auras: {auras}
   - Supporting text: {auras_support}
3. Baseline seizure days (pre-treatment): {baseline}
   - Supporting text: {baseline_support}
4. Seizure days per year (post-treatment): {post}
   - Supporting text: {post_support}
5. Percent reduction in seizure days: {percent_reduction}

**Instructions:**
- Use the provided information to calculate the ILAE score.
- Provide detailed reasoning for each entity influencing the score.
- Cite the supporting texts in your reasoning.
- If any information is uncertain or not available, acknowledge this in your reasoning and proceed based on the available data.
- If the patient has **only auras, no other seizures**, the score is **Class 2** even when baseline or post-treatment seizure-day counts are unknown.
- **If you cannot determine the ILAE score based on the available data, set `"ilae_score"` to `"{indeterminate}"`. Do not guess.**

**Output Format:**

Provide the output in the following JSON format (without any additional text):

{{
  "ilae_score": "...",
  "detailed_explanation": "..."
}}

Calculate the ILAE score using this information.
"#,
        seizure_freedom = entities.presence_of_seizure_freedom.value,
        seizure_freedom_support = entities.presence_of_seizure_freedom.supporting_text,
        auras = entities.presence_of_auras.value,
        auras_support = entities.presence_of_auras.supporting_text,
        baseline = entities.baseline_seizure_days.value,
        baseline_support = entities.baseline_seizure_days.supporting_text,
        post = entities.seizure_days_per_year.value,
        post_support = entities.seizure_days_per_year.supporting_text,
        percent_reduction = percent_reduction,
        indeterminate = INDETERMINATE,
    )
}

/// Build the stage-3 prompt: concise summary of the detailed explanation
pub fn build_summary_prompt(detailed_explanation: &str) -> String {
    format!(
        r#"You are an assistant tasked with providing a concise and clear explanation of the ILAE score based on the detailed explanation from the previous calculation. Do not recalculate or re-present the ILAE score. Your role is to summarize the detailed explanation into a concise explanation suitable for display on the frontend.

**Instructions:**

- Summarize the detailed explanation provided.
- Do not recalculate or re-present the ILAE score.
- Provide the concise explanation without any unnecessary details.

**Output Format:**

Provide the output in the following JSON format (without any additional text):

{{
  "concise_explanation": "..."
}}

**Detailed Explanation from the previous calculation:**

{detailed_explanation}
"#
    )
}
