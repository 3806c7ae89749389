pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::require_auth;
use crate::flashcards::handlers as flashcards;
use crate::generation::handlers as generation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Everything except /health sits behind the session middleware.
    let protected = Router::new()
        .route(
            "/api/v1/generations",
            post(generation::handle_create_generation),
        )
        .route(
            "/api/v1/flashcards",
            get(flashcards::handle_list_flashcards).post(flashcards::handle_create_flashcards),
        )
        .route(
            "/api/v1/flashcards/:id",
            get(flashcards::handle_get_flashcard)
                .put(flashcards::handle_update_flashcard)
                .delete(flashcards::handle_delete_flashcard),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::openrouter::OpenRouterClient;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;
    use tower::ServiceExt;

    /// State with a lazy pool: no database connection is made unless a
    /// handler actually runs a query.
    fn test_state() -> AppState {
        AppState {
            db: PgPool::connect_lazy("postgres://localhost/unused").unwrap(),
            openrouter: OpenRouterClient::new(
                "test-key".to_string(),
                "http://localhost".to_string(),
            )
            .unwrap(),
            config: Config {
                database_url: "postgres://localhost/unused".to_string(),
                openrouter_api_key: "test-key".to_string(),
                site_url: "http://localhost".to_string(),
                port: 8080,
                rust_log: "info".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_health_is_open() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unauthenticated_generation_is_401_without_any_side_effect() {
        // No session cookie: the middleware rejects before the handler can
        // touch the provider or the database.
        let app = build_router(test_state());
        let body = serde_json::json!({ "source_text": "x".repeat(1000) }).to_string();
        let response = app
            .oneshot(
                Request::post("/api/v1/generations")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unauthenticated_flashcard_routes_are_401() {
        for (method, uri) in [
            ("GET", "/api/v1/flashcards"),
            ("POST", "/api/v1/flashcards"),
            ("PUT", "/api/v1/flashcards/1"),
            ("DELETE", "/api/v1/flashcards/1"),
        ] {
            let app = build_router(test_state());
            let response = app
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .header("content-type", "application/json")
                        .body(Body::from("[]"))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }
}
