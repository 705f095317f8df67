//! Note scoring pipeline
//!
//! Three chained LLM stages: entity extraction, ILAE classification,
//! concise summarization. Each stage builds a prompt from the prior
//! stage's structured output, invokes the model in JSON mode, and
//! parses the reply. A percent-reduction computation is injected
//! between stages 1 and 2. Strictly linear, fail-fast: any invocation
//! or parse failure aborts the request with no partial output.

use std::sync::Arc;

use crate::model::{
    ConciseResult, DetailedOutput, ExtractedEntities, FinalOutput, ScoreResult,
};
use crate::service::llm::{ModelInvoker, OutputMode};
use crate::service::parser;

pub mod error;
pub mod metric;
pub mod prompts;
pub mod validation;

pub use error::ScoringError;

use metric::{SeizureCount, percent_reduction};

const STAGE_EXTRACTION: &str = "extraction";
const STAGE_SCORING: &str = "scoring";
const STAGE_SUMMARY: &str = "summary";

/// Service orchestrating the three-stage scoring pipeline
///
/// Holds no per-request state; concurrent notes only share the
/// read-only invoker.
pub struct ScoringService {
    invoker: Arc<dyn ModelInvoker>,
}

impl ScoringService {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self { invoker }
    }

    /// Score a clinical note
    pub async fn process(
        &self,
        clinical_note: &str,
    ) -> Result<(FinalOutput, DetailedOutput), ScoringError> {
        let start_time = std::time::Instant::now();

        // Stage 1: extract clinical variables
        let prompt = prompts::build_extraction_prompt(clinical_note);
        let raw = self.invoke_stage(STAGE_EXTRACTION, &prompt).await?;
        let mut entities: ExtractedEntities = Self::parse_stage(STAGE_EXTRACTION, &raw)?;

        let grounding = validation::enforce_grounding(&mut entities, clinical_note);
        if !grounding.is_fully_grounded() {
            tracing::warn!(
                degraded_fields = ?grounding.degraded_fields,
                "Extraction produced ungrounded supporting texts"
            );
        }

        // Derived metric, consumed only by stage 2
        let baseline = SeizureCount::parse(&entities.baseline_seizure_days.value);
        let post = SeizureCount::parse(&entities.seizure_days_per_year.value);
        let reduction = percent_reduction(baseline, post);

        tracing::debug!(
            baseline = %baseline,
            post = %post,
            percent_reduction = %reduction,
            "Computed percent reduction"
        );

        // Stage 2: classify
        let prompt = prompts::build_scoring_prompt(&entities, &reduction);
        let raw = self.invoke_stage(STAGE_SCORING, &prompt).await?;
        let score: ScoreResult = Self::parse_stage(STAGE_SCORING, &raw)?;

        // Stage 3: summarize the reasoning
        let prompt = prompts::build_summary_prompt(&score.detailed_explanation);
        let raw = self.invoke_stage(STAGE_SUMMARY, &prompt).await?;
        let concise: ConciseResult = Self::parse_stage(STAGE_SUMMARY, &raw)?;

        tracing::info!(
            ilae_score = %score.ilae_score,
            note_length = clinical_note.len(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "Note scoring complete"
        );

        let final_output = FinalOutput {
            ilae_score: score.ilae_score,
            concise_explanation: concise.concise_explanation,
            extracted_entities: entities,
        };
        let detailed_output = DetailedOutput {
            detailed_explanation: score.detailed_explanation,
        };

        Ok((final_output, detailed_output))
    }

    async fn invoke_stage(
        &self,
        stage: &'static str,
        prompt: &str,
    ) -> Result<String, ScoringError> {
        let start_time = std::time::Instant::now();

        tracing::debug!(
            stage = stage,
            prompt_length = prompt.len(),
            "Invoking pipeline stage"
        );

        match self.invoker.invoke(prompt, OutputMode::Json).await {
            Ok(raw) => {
                tracing::debug!(
                    stage = stage,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    response_length = raw.len(),
                    "Pipeline stage completed"
                );
                Ok(raw)
            }
            Err(source) => {
                tracing::error!(
                    stage = stage,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    error = %source,
                    "Pipeline stage invocation failed"
                );
                Err(ScoringError::Invocation { stage, source })
            }
        }
    }

    fn parse_stage<T: serde::de::DeserializeOwned>(
        stage: &'static str,
        raw: &str,
    ) -> Result<T, ScoringError> {
        parser::parse_response(raw).map_err(|source| {
            tracing::error!(
                stage = stage,
                error = %source,
                response_preview = %raw.chars().take(200).collect::<String>(),
                "Pipeline stage response was not parseable"
            );
            ScoringError::Parse { stage, source }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entities::NOT_FOUND_IN_NOTE;
    use crate::service::llm::InvocationError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const NOTE: &str = "Patient post-surgery 12 months ago. Pre-surgery: 96 seizure days per year. Current: Completely seizure-free, no auras.";

    /// Invoker that replays scripted responses and records prompts
    struct ScriptedInvoker {
        responses: Mutex<VecDeque<Result<String, InvocationError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedInvoker {
        fn new(responses: Vec<Result<String, InvocationError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("prompts lock").clone()
        }
    }

    #[async_trait]
    impl ModelInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            prompt: &str,
            _mode: OutputMode,
        ) -> Result<String, InvocationError> {
            self.prompts
                .lock()
                .expect("prompts lock")
                .push(prompt.to_string());
            self.responses
                .lock()
                .expect("responses lock")
                .pop_front()
                .expect("script exhausted")
        }
    }

    fn extraction_reply() -> String {
        serde_json::json!({
            "presence_of_seizure_freedom": {
                "value": "Yes",
                "supporting_text": "Completely seizure-free"
            },
            "presence_of_auras": {
                "value": "No",
                "supporting_text": "no auras"
            },
            "baseline_seizure_days": {
                "value": "96",
                "supporting_text": "96 seizure days per year"
            },
            "seizure_days_per_year": {
                "value": "0",
                "supporting_text": "Completely seizure-free"
            }
        })
        .to_string()
    }

    fn scoring_reply() -> String {
        serde_json::json!({
            "ilae_score": "1",
            "detailed_explanation": "The patient is completely seizure-free (\"Completely seizure-free\") with no auras, a 100% reduction from the 96 baseline seizure days, consistent with Class 1."
        })
        .to_string()
    }

    fn summary_reply() -> String {
        serde_json::json!({
            "concise_explanation": "Seizure-free with no auras: Class 1 outcome."
        })
        .to_string()
    }

    #[tokio::test]
    async fn end_to_end_seizure_free_note() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(extraction_reply()),
            Ok(scoring_reply()),
            Ok(summary_reply()),
        ]));
        let service = ScoringService::new(invoker.clone());

        let (final_output, detailed_output) = service.process(NOTE).await.expect("pipeline runs");

        assert_eq!(final_output.ilae_score, "1");
        assert_eq!(
            final_output.extracted_entities.presence_of_seizure_freedom.value,
            "Yes"
        );
        assert_eq!(final_output.extracted_entities.presence_of_auras.value, "No");
        assert!(!final_output.concise_explanation.is_empty());
        assert!(detailed_output.detailed_explanation.contains("seizure-free"));

        // All four top-level keys survive serialization
        let serialized = serde_json::to_value(&final_output).expect("serializes");
        for key in ["ilae_score", "concise_explanation", "extracted_entities"] {
            assert!(serialized.get(key).is_some(), "missing {key}");
        }
    }

    #[tokio::test]
    async fn stage_outputs_feed_the_next_prompt() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(extraction_reply()),
            Ok(scoring_reply()),
            Ok(summary_reply()),
        ]));
        let service = ScoringService::new(invoker.clone());

        service.process(NOTE).await.expect("pipeline runs");

        let prompts = invoker.prompts();
        assert_eq!(prompts.len(), 3);
        // Stage 1 sees the note
        assert!(prompts[0].contains(NOTE));
        // Stage 2 sees the extracted values and the injected metric
        assert!(prompts[1].contains("Presence of seizure freedom: Yes"));
        assert!(prompts[1].contains("Percent reduction in seizure days: 100.0%"));
        // Stage 3 sees only the detailed explanation
        assert!(prompts[2].contains("consistent with Class 1"));
        assert!(!prompts[2].contains("Percent reduction"));
    }

    #[tokio::test]
    async fn invocation_failure_aborts_without_partial_output() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(extraction_reply()),
            Err(InvocationError::RequestFailed("connection refused".to_string())),
        ]));
        let service = ScoringService::new(invoker);

        let err = service.process(NOTE).await.expect_err("must fail");
        assert!(matches!(
            err,
            ScoringError::Invocation {
                stage: "scoring",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unparseable_extraction_aborts() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![Ok(
            "I'm sorry, I cannot help with that.".to_string(),
        )]));
        let service = ScoringService::new(invoker);

        let err = service.process(NOTE).await.expect_err("must fail");
        assert!(matches!(
            err,
            ScoringError::Parse {
                stage: "extraction",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_score_field_aborts() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(extraction_reply()),
            Ok(r#"{"ilae_score": "1"}"#.to_string()),
        ]));
        let service = ScoringService::new(invoker);

        let err = service.process(NOTE).await.expect_err("must fail");
        assert!(matches!(err, ScoringError::Parse { stage: "scoring", .. }));
    }

    #[tokio::test]
    async fn ungrounded_supporting_text_is_degraded_not_fatal() {
        let mut reply: serde_json::Value =
            serde_json::from_str(&extraction_reply()).expect("valid json");
        reply["presence_of_auras"]["supporting_text"] =
            serde_json::Value::String("paraphrased claim about auras".to_string());

        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(reply.to_string()),
            Ok(scoring_reply()),
            Ok(summary_reply()),
        ]));
        let service = ScoringService::new(invoker.clone());

        let (final_output, _) = service.process(NOTE).await.expect("pipeline runs");

        assert_eq!(
            final_output.extracted_entities.presence_of_auras.supporting_text,
            NOT_FOUND_IN_NOTE
        );
        // Stage 2 saw the sentinel, not the fabricated quote
        assert!(invoker.prompts()[1].contains(NOT_FOUND_IN_NOTE));
    }

    #[tokio::test]
    async fn unknown_counts_inject_unknown_reduction() {
        let reply = serde_json::json!({
            "presence_of_seizure_freedom": {
                "value": "I don't know",
                "supporting_text": "Not found in the clinical note"
            },
            "presence_of_auras": {
                "value": "Yes",
                "supporting_text": "no auras"
            },
            "baseline_seizure_days": {
                "value": "I don't know",
                "supporting_text": "Not found in the clinical note"
            },
            "seizure_days_per_year": {
                "value": "I don't know",
                "supporting_text": "Not found in the clinical note"
            }
        })
        .to_string();

        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(reply),
            Ok(serde_json::json!({
                "ilae_score": "2",
                "detailed_explanation": "Only auras are reported; with no other seizures this is Class 2 despite unknown seizure-day counts."
            })
            .to_string()),
            Ok(summary_reply()),
        ]));
        let service = ScoringService::new(invoker.clone());

        let (final_output, _) = service.process(NOTE).await.expect("pipeline runs");

        assert_eq!(final_output.ilae_score, "2");
        assert!(
            invoker.prompts()[1].contains("Percent reduction in seizure days: I don't know")
        );
    }

    #[tokio::test]
    async fn fenced_stage_replies_are_tolerated() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            Ok(format!("```json\n{}\n```", extraction_reply())),
            Ok(format!("Here you go:\n{}", scoring_reply())),
            Ok(summary_reply()),
        ]));
        let service = ScoringService::new(invoker);

        let (final_output, _) = service.process(NOTE).await.expect("pipeline runs");
        assert_eq!(final_output.ilae_score, "1");
    }
}
