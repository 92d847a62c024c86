use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub modules: HealthModules,
}

#[derive(Debug, Serialize)]
pub struct HealthModules {
    pub store: StoreStatus,
    pub moderation: ModerationStatus,
    pub auth: AuthStatus,
}

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub kind: &'static str,
    pub database_configured: bool,
    pub reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct ModerationStatus {
    pub words: usize,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub configured: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = match state.store.ping().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "store health check failed");
            false
        }
    };
    let auth_configured = state
        .config
        .token_secret
        .as_ref()
        .is_some_and(|value| !value.is_empty());

    Json(HealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        modules: HealthModules {
            store: StoreStatus {
                kind: state.store.kind(),
                database_configured: state.db.is_some(),
                reachable,
            },
            moderation: ModerationStatus {
                words: state.words.len(),
            },
            auth: AuthStatus {
                configured: auth_configured,
            },
        },
    })
}
