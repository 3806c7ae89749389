//! Axum route handlers for the Flashcards API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::flashcards::requests::{
    validate_create_batch, validate_update, CreateFlashcardCommand, ListFlashcardsQuery,
    UpdateFlashcardCommand,
};
use crate::flashcards::service;
use crate::flashcards::service::PaginatedResponse;
use crate::models::flashcard::FlashcardDto;
use crate::state::AppState;

/// GET /api/v1/flashcards
pub async fn handle_list_flashcards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListFlashcardsQuery>,
) -> Result<Json<PaginatedResponse<FlashcardDto>>, AppError> {
    query.validate()?;
    let page = service::list_flashcards(&state.db, user.id, &query).await?;
    Ok(Json(page))
}

/// POST /api/v1/flashcards
///
/// Batch create: 1-100 cards in one request. This is also the path by which
/// accepted AI proposals become persisted flashcards.
pub async fn handle_create_flashcards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(commands): Json<Vec<CreateFlashcardCommand>>,
) -> Result<(StatusCode, Json<Vec<FlashcardDto>>), AppError> {
    validate_create_batch(&commands)?;
    let created = service::create_flashcards(&state.db, user.id, &commands).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/flashcards/:id
pub async fn handle_get_flashcard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<FlashcardDto>, AppError> {
    let flashcard = service::get_flashcard_by_id(&state.db, id, user.id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(flashcard))
}

/// PUT /api/v1/flashcards/:id
pub async fn handle_update_flashcard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(command): Json<UpdateFlashcardCommand>,
) -> Result<Json<FlashcardDto>, AppError> {
    validate_update(&command)?;
    let updated = service::update_flashcard(&state.db, id, user.id, &command)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(updated))
}

/// DELETE /api/v1/flashcards/:id
pub async fn handle_delete_flashcard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = service::delete_flashcard(&state.db, id, user.id).await?;
    if deleted == 0 {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

// One message for both missing and not-owned, so existence never leaks.
fn not_found() -> AppError {
    AppError::NotFound("Flashcard not found or access denied".to_string())
}
