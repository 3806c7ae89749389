//! Generation orchestrator.
//!
//! Flow: validate input → hash source text → build prompts → structured
//! OpenRouter call → persist generation record → map proposals.
//! On any failure an error-log row is written best-effort and the original
//! error is re-raised; the log write never masks it.

use std::time::Instant;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::prompts::{build_user_prompt, GENERATION_SYSTEM};
use crate::models::flashcard::FlashcardSource;
use crate::openrouter::{OpenRouterClient, OpenRouterError, DEFAULT_MODEL};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A single flashcard as produced by the model. The length bounds are part of
/// the derived schema, so the provider-side strict mode and our own
/// validation both enforce them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(inline)]
pub struct AiFlashcard {
    /// Question or term on the front of the card.
    #[schemars(length(min = 3, max = 500))]
    pub front: String,
    /// Answer or definition on the back of the card.
    #[schemars(length(min = 3, max = 1000))]
    pub back: String,
}

/// Expected top-level shape of the structured completion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AiFlashcardsResponse {
    /// Generated flashcards derived from the source text.
    #[schemars(length(min = 1, max = 20))]
    pub flashcards: Vec<AiFlashcard>,
}

/// An AI-generated card that has not been saved yet. Held only in the
/// response; persisting it is a separate, explicit user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardProposal {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateGenerationResponse {
    pub generation_id: i64,
    pub flashcards_proposals: Vec<FlashcardProposal>,
    pub generated_count: i32,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Runs one generation: exactly one AI call, one generation-record insert.
/// Concurrent submissions are independent; there is no dedup or debounce.
pub async fn create_generation(
    pool: &PgPool,
    openrouter: &OpenRouterClient,
    user_id: Uuid,
    source_text: &str,
) -> Result<CreateGenerationResponse, AppError> {
    // The route layer already enforces 1000-10000 chars; this only guards
    // direct callers.
    if source_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Source text cannot be empty".to_string(),
        ));
    }

    let source_text_hash = sha256_hex(source_text);
    let source_text_length = source_text.chars().count() as i32;

    let started = Instant::now();
    let result = generate_flashcards(openrouter, source_text).await;
    let generation_duration_ms = started.elapsed().as_millis() as i64;

    let proposals = match result {
        Ok(proposals) => proposals,
        Err(error) => {
            log_generation_error(pool, user_id, &source_text_hash, source_text_length, &error)
                .await;
            return Err(error);
        }
    };

    let insert_result = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO generations
            (user_id, model, generated_count, accepted_unedited_count,
             accepted_edited_count, source_text_hash, source_text_length,
             generation_duration)
        VALUES ($1, $2, $3, 0, 0, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_MODEL)
    .bind(proposals.len() as i32)
    .bind(&source_text_hash)
    .bind(source_text_length)
    .bind(generation_duration_ms)
    .fetch_one(pool)
    .await;

    let generation_id = match insert_result {
        Ok(id) => id,
        Err(e) => {
            let error = AppError::Database(e);
            log_generation_error(pool, user_id, &source_text_hash, source_text_length, &error)
                .await;
            return Err(error);
        }
    };

    info!(
        "Generation {} produced {} proposals for user {} in {}ms",
        generation_id,
        proposals.len(),
        user_id,
        generation_duration_ms
    );

    Ok(CreateGenerationResponse {
        generation_id,
        generated_count: proposals.len() as i32,
        flashcards_proposals: proposals,
    })
}

/// Calls OpenRouter with the fixed prompt pair and maps the validated cards
/// into proposals tagged `ai-full`. Provider failures are translated into
/// user-facing messages here; the typed cause rides along for logging.
async fn generate_flashcards(
    openrouter: &OpenRouterClient,
    source_text: &str,
) -> Result<Vec<FlashcardProposal>, AppError> {
    let user_prompt = build_user_prompt(source_text);

    let response = openrouter
        .generate_structured_completion::<AiFlashcardsResponse>(
            GENERATION_SYSTEM,
            &user_prompt,
            Some(DEFAULT_MODEL),
            &json!({ "temperature": 0.7, "max_tokens": 4000 }),
        )
        .await
        .map_err(map_openrouter_error)?;

    Ok(response
        .flashcards
        .into_iter()
        .map(|card| FlashcardProposal {
            front: card.front,
            back: card.back,
            source: FlashcardSource::AiFull,
        })
        .collect())
}

/// Layers a user-facing message over auth and rate-limit failures; every
/// other provider failure gets the generic API-failure message.
fn map_openrouter_error(error: OpenRouterError) -> AppError {
    let message = match &error {
        OpenRouterError::Auth(_) => {
            "OpenRouter API authentication failed. Check the API key configuration.".to_string()
        }
        OpenRouterError::RateLimit(_) => {
            "OpenRouter API request limit exceeded. Try again later.".to_string()
        }
        other => format!("OpenRouter API error: {other}"),
    };
    AppError::Generation {
        message,
        source: error,
    }
}

/// Best-effort audit write. A failure here is warned and swallowed so it
/// never masks the original generation error.
async fn log_generation_error(
    pool: &PgPool,
    user_id: Uuid,
    source_text_hash: &str,
    source_text_length: i32,
    error: &AppError,
) {
    let error_code = match error {
        AppError::Generation { source, .. } => source.code(),
        other => other.code(),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO generation_error_logs
            (user_id, model, source_text_hash, source_text_length,
             error_code, error_message)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_MODEL)
    .bind(source_text_hash)
    .bind(source_text_length)
    .bind(error_code)
    .bind(error.to_string())
    .execute(pool)
    .await;

    if let Err(log_error) = result {
        warn!("Failed to write generation error log: {log_error}");
    }
}

/// Hex-encoded SHA-256 digest of the source text, recorded for audit and
/// deduplication analysis (never used for dedup logic).
fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrouter::schema::provider_schema;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex("abc").len(), 64);
    }

    #[test]
    fn test_response_schema_carries_all_bounds() {
        let schema = provider_schema::<AiFlashcardsResponse>();
        let cards = &schema["properties"]["flashcards"];
        assert_eq!(cards["minItems"], 1);
        assert_eq!(cards["maxItems"], 20);

        let card = &cards["items"];
        assert_eq!(card["properties"]["front"]["minLength"], 3);
        assert_eq!(card["properties"]["front"]["maxLength"], 500);
        assert_eq!(card["properties"]["back"]["minLength"], 3);
        assert_eq!(card["properties"]["back"]["maxLength"], 1000);
    }

    #[test]
    fn test_auth_and_rate_limit_errors_get_user_messages() {
        let mapped = map_openrouter_error(OpenRouterError::Auth("401".into()));
        match mapped {
            AppError::Generation { message, .. } => assert!(message.contains("authentication")),
            other => panic!("expected Generation, got {other:?}"),
        }

        let mapped = map_openrouter_error(OpenRouterError::RateLimit("429".into()));
        match mapped {
            AppError::Generation { message, .. } => assert!(message.contains("limit")),
            other => panic!("expected Generation, got {other:?}"),
        }

        let mapped = map_openrouter_error(OpenRouterError::Server("HTTP 503".into()));
        match mapped {
            AppError::Generation { message, .. } => {
                assert!(message.contains("OpenRouter API error"))
            }
            other => panic!("expected Generation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_source_text_fails_before_any_call() {
        // Lazy pool: no connection is ever established because validation
        // rejects the input first.
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let client = OpenRouterClient::new("key".to_string(), "http://localhost".to_string())
            .unwrap();

        let result = create_generation(&pool, &client, Uuid::new_v4(), "   \n\t ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_proposals_are_tagged_ai_full() {
        let response = AiFlashcardsResponse {
            flashcards: vec![AiFlashcard {
                front: "What is ownership?".to_string(),
                back: "Rust's compile-time memory management model.".to_string(),
            }],
        };
        let proposals: Vec<FlashcardProposal> = response
            .flashcards
            .into_iter()
            .map(|card| FlashcardProposal {
                front: card.front,
                back: card.back,
                source: FlashcardSource::AiFull,
            })
            .collect();
        assert_eq!(proposals[0].source, FlashcardSource::AiFull);
        let json = serde_json::to_value(&proposals[0]).unwrap();
        assert_eq!(json["source"], "ai-full");
    }
}
