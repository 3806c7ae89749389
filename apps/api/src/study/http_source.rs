//! HTTP-backed [`CardSource`] used by the study session runner. Fetches the
//! newest flashcards from the Flashcards API, forwarding the session cookie.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::flashcards::service::PaginatedResponse;
use crate::models::flashcard::FlashcardDto;
use crate::study::session::{CardSource, CardSourceError};

pub struct HttpCardSource {
    client: Client,
    base_url: String,
    session_token: String,
}

impl HttpCardSource {
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        HttpCardSource {
            client: Client::new(),
            base_url: base_url.into(),
            session_token: session_token.into(),
        }
    }
}

#[async_trait]
impl CardSource for HttpCardSource {
    async fn recent_cards(&self, limit: i64) -> Result<Vec<FlashcardDto>, CardSourceError> {
        let url = format!(
            "{}/api/v1/flashcards?page=1&limit={limit}&sort=created_at&order=desc",
            self.base_url
        );

        let response = self
            .client
            .get(url)
            .header("Cookie", format!("session={}", self.session_token))
            .send()
            .await
            .map_err(|e| CardSourceError::Other(format!("could not load flashcards: {e}")))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(CardSourceError::Unauthorized);
        }
        if !response.status().is_success() {
            return Err(CardSourceError::Other(format!(
                "could not load flashcards: HTTP {}",
                response.status().as_u16()
            )));
        }

        let page: PaginatedResponse<FlashcardDto> = response
            .json()
            .await
            .map_err(|e| CardSourceError::Other(format!("invalid flashcards response: {e}")))?;

        Ok(page.data)
    }
}
