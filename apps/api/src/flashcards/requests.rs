//! Request DTOs and field-level validation for the flashcard endpoints.

use serde::Deserialize;

use crate::errors::{AppError, FieldErrors};
use crate::models::flashcard::FlashcardSource;

pub const FRONT_MAX: usize = 200;
pub const BACK_MAX: usize = 500;
pub const BATCH_MAX: usize = 100;
pub const PAGE_LIMIT_MAX: i64 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlashcardCommand {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateFlashcardCommand {
    pub front: String,
    pub back: String,
}

/// Whitelisted sort columns. Deserializing from the query string means an
/// unknown column can never reach the SQL builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Source,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Source => "source",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListFlashcardsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default = "default_sort")]
    pub sort: SortField,
    #[serde(default = "default_order")]
    pub order: SortOrder,
    pub source: Option<FlashcardSource>,
    pub generation_id: Option<i64>,
}

fn default_page() -> i64 {
    1
}
fn default_limit() -> i64 {
    20
}
fn default_sort() -> SortField {
    SortField::CreatedAt
}
fn default_order() -> SortOrder {
    SortOrder::Desc
}

impl ListFlashcardsQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = FieldErrors::new();
        if self.page < 1 {
            push_error(&mut fields, "page", "page must be at least 1");
        }
        if self.limit < 1 || self.limit > PAGE_LIMIT_MAX {
            push_error(
                &mut fields,
                "limit",
                &format!("limit must be between 1 and {PAGE_LIMIT_MAX}"),
            );
        }
        if let Some(id) = self.generation_id {
            if id <= 0 {
                push_error(&mut fields, "generation_id", "generation_id must be positive");
            }
        }
        finish(fields)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Validates a batch of create commands. Errors are keyed by index and field,
/// e.g. `2.front`, so clients can point at the offending card.
pub fn validate_create_batch(commands: &[CreateFlashcardCommand]) -> Result<(), AppError> {
    let mut fields = FieldErrors::new();

    if commands.is_empty() || commands.len() > BATCH_MAX {
        push_error(
            &mut fields,
            "flashcards",
            &format!("expected between 1 and {BATCH_MAX} flashcards, got {}", commands.len()),
        );
        return finish(fields);
    }

    for (index, command) in commands.iter().enumerate() {
        validate_text(&mut fields, &format!("{index}.front"), &command.front, FRONT_MAX);
        validate_text(&mut fields, &format!("{index}.back"), &command.back, BACK_MAX);
    }
    finish(fields)
}

pub fn validate_update(command: &UpdateFlashcardCommand) -> Result<(), AppError> {
    let mut fields = FieldErrors::new();
    validate_text(&mut fields, "front", &command.front, FRONT_MAX);
    validate_text(&mut fields, "back", &command.back, BACK_MAX);
    finish(fields)
}

fn validate_text(fields: &mut FieldErrors, key: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length == 0 {
        push_error(fields, key, "must not be empty");
    } else if length > max {
        push_error(fields, key, &format!("must be {max} or fewer characters (got {length})"));
    }
}

fn push_error(fields: &mut FieldErrors, key: &str, message: &str) {
    fields
        .entry(key.to_string())
        .or_default()
        .push(message.to_string());
}

fn finish(fields: FieldErrors) -> Result<(), AppError> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFields(fields))
    }
}
