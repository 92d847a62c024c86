use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::http::middleware::auth;
use crate::http::routes::{comments, health, posts};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = build_cors(&state);
    let mut router = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route("/api/posts/my", get(posts::list_my_posts))
        .route(
            "/api/posts/{post_id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::remove_post),
        )
        .route(
            "/api/posts/{post_id}/comments-daily-breakdown",
            get(posts::comments_daily_breakdown),
        )
        .route(
            "/api/posts/{post_id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/posts/{post_id}/comments/my",
            get(comments::list_my_comments),
        )
        .route(
            "/api/posts/{post_id}/comments/{comment_id}",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::remove_comment),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ))
        .with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router
}

fn build_cors(state: &AppState) -> Option<CorsLayer> {
    let mut origins = Vec::new();
    let mut allow_any = false;
    for origin in state.config.cors_allow_origins.iter() {
        if is_wildcard_origin(origin) {
            allow_any = true;
            break;
        }
        match HeaderValue::from_str(origin.trim()) {
            Ok(value) => origins.push(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin ignored");
            }
        }
    }

    if !should_enable_cors(allow_any, &origins) {
        return None;
    }

    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]);
    if allow_any {
        Some(cors.allow_origin(Any).allow_headers(Any))
    } else {
        Some(
            cors.allow_origin(AllowOrigin::list(origins))
                .allow_credentials(true)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        )
    }
}

fn is_wildcard_origin(origin: &str) -> bool {
    origin.trim() == "*"
}

fn should_enable_cors(allow_any: bool, origins: &[HeaderValue]) -> bool {
    allow_any || !origins.is_empty()
}
