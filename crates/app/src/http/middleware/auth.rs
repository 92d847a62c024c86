use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Authenticated caller, inserted by [`authenticate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token auth not configured")]
    MissingConfig,
    #[error("bearer token required")]
    MissingToken,
    #[error("bearer token invalid")]
    InvalidToken,
    #[error("token issuance failed")]
    TokenIssue,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: i64,
    exp: i64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Resolves a bearer token into [`CurrentUser`]. Requests without a token
/// pass through; handlers that need a user reject them via the extractor.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(token) = extract_bearer_token(&request) else {
        return Ok(next.run(request).await);
    };
    let secret = state
        .config
        .token_secret
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingConfig)?;
    let id = verify_token(secret, &token).ok_or(AuthError::InvalidToken)?;
    request.extensions_mut().insert(CurrentUser { id });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

pub fn issue_token(secret: &str, user_id: i64, max_age_secs: i64) -> Result<String, AuthError> {
    let exp = Utc::now().timestamp().saturating_add(max_age_secs);
    let payload = TokenPayload { sub: user_id, exp };
    let json = serde_json::to_vec(&payload).map_err(|_| AuthError::TokenIssue)?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(json);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::TokenIssue)?;
    mac.update(payload_b64.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload_b64}.{signature}"))
}

fn verify_token(secret: &str, token: &str) -> Option<i64> {
    let (payload_b64, sig_b64) = token.split_once('.')?;
    if payload_b64.is_empty() || sig_b64.is_empty() {
        return None;
    }
    let signature = URL_SAFE_NO_PAD.decode(sig_b64.as_bytes()).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature).ok()?;
    let bytes = URL_SAFE_NO_PAD.decode(payload_b64.as_bytes()).ok()?;
    let payload: TokenPayload = serde_json::from_slice(&bytes).ok()?;
    (payload.exp > Utc::now().timestamp()).then_some(payload.sub)
}

fn extract_bearer_token<B>(request: &Request<B>) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let value = header.trim().strip_prefix("Bearer ")?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingConfig => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenIssue => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;

    use super::{extract_bearer_token, issue_token, verify_token};

    #[test]
    fn issued_token_verifies_to_user() {
        let token = issue_token("secret", 42, 60).unwrap();
        assert_eq!(verify_token("secret", &token), Some(42));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("secret", 42, 60).unwrap();
        assert_eq!(verify_token("other", &token), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token("secret", 42, -1).unwrap();
        assert_eq!(verify_token("secret", &token), None);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = issue_token("secret", 42, 60).unwrap();
        let forged = issue_token("secret", 43, 60).unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let (payload, _) = forged.split_once('.').unwrap();
        assert_eq!(verify_token("secret", &format!("{payload}.{sig}")), None);
        assert_eq!(verify_token("secret", "garbage"), None);
    }

    #[test]
    fn bearer_header_is_parsed() {
        let request = Request::builder()
            .header("authorization", "Bearer abc.def ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&request).as_deref(), Some("abc.def"));
        let basic = Request::builder()
            .header("authorization", "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer_token(&basic), None);
    }
}
