use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Provenance of a flashcard. `AiFull` is untouched AI output; editing an
/// `AiFull` card promotes it to `AiEdited` — the transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlashcardSource {
    Manual,
    AiFull,
    AiEdited,
}

impl FlashcardSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashcardSource::Manual => "manual",
            FlashcardSource::AiFull => "ai-full",
            FlashcardSource::AiEdited => "ai-edited",
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FlashcardRow {
    pub id: i64,
    pub user_id: Uuid,
    pub generation_id: Option<i64>,
    pub front: String,
    pub back: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flashcard as exposed over the API — the owning user id is never serialized out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardDto {
    pub id: i64,
    pub generation_id: Option<i64>,
    pub front: String,
    pub back: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FlashcardRow> for FlashcardDto {
    fn from(row: FlashcardRow) -> Self {
        FlashcardDto {
            id: row.id,
            generation_id: row.generation_id,
            front: row.front,
            back: row.back,
            source: row.source,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trips_through_kebab_case() {
        for (variant, text) in [
            (FlashcardSource::Manual, "manual"),
            (FlashcardSource::AiFull, "ai-full"),
            (FlashcardSource::AiEdited, "ai-edited"),
        ] {
            assert_eq!(variant.as_str(), text);
            let json = serde_json::to_string(&variant).unwrap();
            assert_eq!(json, format!("\"{text}\""));
            let parsed: FlashcardSource = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, variant);
        }
        assert!(serde_json::from_str::<FlashcardSource>("\"ai_full\"").is_err());
    }
}
