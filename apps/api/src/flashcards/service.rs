//! Database operations for flashcards. Every query filters on `user_id`;
//! "not found" and "not owned" are indistinguishable to callers.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::flashcards::requests::{
    CreateFlashcardCommand, ListFlashcardsQuery, UpdateFlashcardCommand,
};
use crate::models::flashcard::{FlashcardDto, FlashcardRow, FlashcardSource};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

pub async fn list_flashcards(
    pool: &PgPool,
    user_id: Uuid,
    query: &ListFlashcardsQuery,
) -> Result<PaginatedResponse<FlashcardDto>, AppError> {
    let mut select = QueryBuilder::new("SELECT * FROM flashcards WHERE user_id = ");
    select.push_bind(user_id);
    push_filters(&mut select, query);
    select.push(format!(
        " ORDER BY {} {}",
        query.sort.column(),
        query.order.sql()
    ));
    select.push(" LIMIT ");
    select.push_bind(query.limit);
    select.push(" OFFSET ");
    select.push_bind(query.offset());

    let rows: Vec<FlashcardRow> = select.build_query_as().fetch_all(pool).await?;

    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM flashcards WHERE user_id = ");
    count.push_bind(user_id);
    push_filters(&mut count, query);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    Ok(PaginatedResponse {
        data: rows.into_iter().map(FlashcardDto::from).collect(),
        pagination: Pagination {
            current_page: query.page,
            limit: query.limit,
            total,
        },
    })
}

fn push_filters(builder: &mut QueryBuilder<'_, sqlx::Postgres>, query: &ListFlashcardsQuery) {
    if let Some(source) = query.source {
        builder.push(" AND source = ");
        builder.push_bind(source.as_str());
    }
    if let Some(generation_id) = query.generation_id {
        builder.push(" AND generation_id = ");
        builder.push_bind(generation_id);
    }
}

pub async fn create_flashcards(
    pool: &PgPool,
    user_id: Uuid,
    commands: &[CreateFlashcardCommand],
) -> Result<Vec<FlashcardDto>, AppError> {
    let mut created = Vec::with_capacity(commands.len());

    for command in commands {
        let row: FlashcardRow = sqlx::query_as(
            r#"
            INSERT INTO flashcards (user_id, front, back, source)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&command.front)
        .bind(&command.back)
        .bind(command.source.as_str())
        .fetch_one(pool)
        .await?;

        created.push(FlashcardDto::from(row));
    }

    info!("Created {} flashcards for user {}", created.len(), user_id);
    Ok(created)
}

pub async fn get_flashcard_by_id(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
) -> Result<Option<FlashcardDto>, AppError> {
    let row: Option<FlashcardRow> =
        sqlx::query_as("SELECT * FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(FlashcardDto::from))
}

/// Replaces front/back. An `ai-full` card becomes `ai-edited` on its first
/// edit; `ai-edited` and `manual` keep their source. Returns `None` when the
/// card does not exist or belongs to another user.
pub async fn update_flashcard(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    command: &UpdateFlashcardCommand,
) -> Result<Option<FlashcardDto>, AppError> {
    let current_source: Option<String> =
        sqlx::query_scalar("SELECT source FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    let Some(current_source) = current_source else {
        return Ok(None);
    };

    let new_source = promoted_source(&current_source).unwrap_or(current_source.as_str());

    let row: Option<FlashcardRow> = sqlx::query_as(
        r#"
        UPDATE flashcards
        SET front = $1, back = $2, source = $3, updated_at = now()
        WHERE id = $4 AND user_id = $5
        RETURNING *
        "#,
    )
    .bind(&command.front)
    .bind(&command.back)
    .bind(new_source)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(FlashcardDto::from))
}

/// Returns the number of deleted rows: 0 means missing or not owned.
pub async fn delete_flashcard(pool: &PgPool, id: i64, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// The one-way source promotion applied on edit.
fn promoted_source(current: &str) -> Option<&'static str> {
    if current == FlashcardSource::AiFull.as_str() {
        Some(FlashcardSource::AiEdited.as_str())
    } else {
        None
    }
}
