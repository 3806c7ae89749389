//! Axum route handlers for the Generation API.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::{AppError, FieldErrors};
use crate::generation::service::{create_generation, CreateGenerationResponse};
use crate::state::AppState;

const SOURCE_TEXT_MIN: usize = 1000;
const SOURCE_TEXT_MAX: usize = 10000;

#[derive(Debug, Deserialize)]
pub struct CreateGenerationRequest {
    pub source_text: String,
}

impl CreateGenerationRequest {
    fn validate(&self) -> Result<(), AppError> {
        let length = self.source_text.chars().count();
        if length < SOURCE_TEXT_MIN || length > SOURCE_TEXT_MAX {
            let mut fields = FieldErrors::new();
            fields.insert(
                "source_text".to_string(),
                vec![format!(
                    "source_text must be between {SOURCE_TEXT_MIN} and {SOURCE_TEXT_MAX} characters (got {length})"
                )],
            );
            return Err(AppError::ValidationFields(fields));
        }
        Ok(())
    }
}

/// POST /api/v1/generations
///
/// Generates flashcard proposals from the submitted source text and records
/// the generation for audit. Proposals are not persisted as flashcards until
/// the user explicitly saves them via POST /api/v1/flashcards.
pub async fn handle_create_generation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateGenerationRequest>,
) -> Result<(StatusCode, Json<CreateGenerationResponse>), AppError> {
    request.validate()?;

    let response = create_generation(
        &state.db,
        &state.openrouter,
        user.id,
        &request.source_text,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
