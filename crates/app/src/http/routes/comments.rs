use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use postboard_core::domain::comments::{Comment, CommentDraft};
use postboard_core::error::CoreError;

use crate::http::middleware::auth::CurrentUser;
use crate::http::routes::ListParams;
use crate::services::ServiceError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum CommentsApiError {
    #[error("invalid request: {0}")]
    Invalid(#[from] CoreError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Comment>>, CommentsApiError> {
    let page = params.page(&state)?;
    Ok(Json(state.comments.list(post_id, None, page).await?))
}

pub async fn list_my_comments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Comment>>, CommentsApiError> {
    let page = params.page(&state)?;
    Ok(Json(state.comments.list(post_id, Some(user.id), page).await?))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<Comment>, CommentsApiError> {
    Ok(Json(state.comments.get(post_id, comment_id).await?))
}

/// Responds once the comment is stored, and after the auto reply when one
/// was requested.
pub async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
    Json(draft): Json<CommentDraft>,
) -> Result<(StatusCode, Json<Comment>), CommentsApiError> {
    let comment = state.comments.create(draft, post_id, user.id).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    Json(draft): Json<CommentDraft>,
) -> Result<Json<Comment>, CommentsApiError> {
    let comment = state
        .comments
        .update(comment_id, post_id, user.id, draft)
        .await?;
    Ok(Json(comment))
}

pub async fn remove_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> Result<Json<Comment>, CommentsApiError> {
    Ok(Json(state.comments.remove(comment_id, post_id, user.id).await?))
}

impl IntoResponse for CommentsApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            CommentsApiError::Invalid(_) | CommentsApiError::Service(ServiceError::Invalid(_)) => {
                StatusCode::BAD_REQUEST
            }
            CommentsApiError::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            CommentsApiError::Service(ServiceError::Store(err)) => {
                error!(error = %err, "comment store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
