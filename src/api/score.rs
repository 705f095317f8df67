//! REST API endpoint for scoring clinical notes

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::error::ApiError;
use crate::model::{DetailedOutput, FinalOutput};
use crate::service::ScoringService;

/// Request body for note scoring
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScoreRequest {
    /// Raw UTF-8 text of the clinic note
    pub clinical_note: String,
}

/// Response body for note scoring
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    pub final_output: FinalOutput,
    pub detailed_output: DetailedOutput,
}

/// Score a clinical note
///
/// Runs the three-stage pipeline and returns the ILAE classification
/// with its supporting entities and explanations. A failure at any
/// stage fails the whole request; no partial result is returned.
#[utoipa::path(
    post,
    path = "/v1/score",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Note scored successfully", body = ScoreResponse),
        (status = 400, description = "Empty or invalid clinical note"),
        (status = 422, description = "Model response could not be parsed"),
        (status = 502, description = "LLM service unavailable")
    ),
    tag = "scoring"
)]
#[post("/v1/score")]
pub async fn score_note(
    service: web::Data<ScoringService>,
    request: web::Json<ScoreRequest>,
) -> Result<HttpResponse, ApiError> {
    let note = request.clinical_note.trim();
    if note.is_empty() {
        return Err(ApiError::BadRequest(
            "clinical_note must not be empty".to_string(),
        ));
    }

    tracing::info!(note_length = note.len(), "Scoring request received");

    let (final_output, detailed_output) = service.process(note).await?;

    Ok(HttpResponse::Ok().json(ScoreResponse {
        final_output,
        detailed_output,
    }))
}

/// OpenAPI documentation for the scoring API
#[derive(OpenApi)]
#[openapi(
    paths(score_note, crate::api::health::liveness, crate::api::health::readiness),
    components(schemas(
        ScoreRequest,
        ScoreResponse,
        crate::model::FinalOutput,
        crate::model::DetailedOutput,
        crate::model::ExtractedEntities,
        crate::model::ExtractedEntity,
    )),
    tags(
        (name = "scoring", description = "Clinical note scoring"),
        (name = "health", description = "Service health probes")
    )
)]
pub struct ApiDoc;

/// Configure scoring routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(score_note);
}
