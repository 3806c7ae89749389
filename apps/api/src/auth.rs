//! Session-cookie authentication middleware.
//!
//! Sessions are created and expired by the external auth provider; this
//! middleware only reads the session table to resolve the calling user.
//! Missing or invalid sessions answer 401 before any handler runs.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// The authenticated user, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Middleware protecting every route that touches user-owned data.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("session="))
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let user_id = lookup_session(&state, token).await?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}

/// Resolves a session token to a user id. Expired or unknown tokens are a
/// 401, not an error — the auth provider prunes rows on its own schedule.
async fn lookup_session(state: &AppState, token: &str) -> Result<Uuid, AppError> {
    let user_id: Option<Uuid> = sqlx::query_scalar(
        "SELECT user_id FROM auth_sessions WHERE token = $1 AND expires_at > now()",
    )
    .bind(token)
    .fetch_optional(&state.db)
    .await?;

    match user_id {
        Some(id) => Ok(id),
        None => {
            debug!("rejected request with unknown or expired session token");
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cookie parsing mirrors the middleware's inline logic; kept in a helper
    // here so the edge cases are covered without a live database.
    fn extract_token(cookie_header: &str) -> Option<&str> {
        cookie_header
            .split(';')
            .find_map(|c| c.trim().strip_prefix("session="))
            .filter(|t| !t.is_empty())
    }

    #[test]
    fn test_extracts_session_among_other_cookies() {
        assert_eq!(
            extract_token("theme=dark; session=abc123; lang=pl"),
            Some("abc123")
        );
    }

    #[test]
    fn test_missing_or_empty_session_is_rejected() {
        assert_eq!(extract_token("theme=dark"), None);
        assert_eq!(extract_token("session="), None);
    }
}
