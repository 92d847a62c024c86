use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use postboard_core::domain::comments::DailyCommentCounts;
use postboard_core::domain::posts::{Post, PostDraft, PostWithComments};
use postboard_core::error::CoreError;
use postboard_core::types::date_range::DateRange;

use crate::http::middleware::auth::CurrentUser;
use crate::http::routes::ListParams;
use crate::services::ServiceError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BreakdownParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Error)]
pub enum PostsApiError {
    #[error("{0} is required")]
    MissingParam(&'static str),
    #[error("invalid request: {0}")]
    Invalid(#[from] CoreError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostWithComments>>, PostsApiError> {
    let page = params.page(&state)?;
    Ok(Json(state.posts.list(None, page).await?))
}

pub async fn list_my_posts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostWithComments>>, PostsApiError> {
    let page = params.page(&state)?;
    Ok(Json(state.posts.list(Some(user.id), page).await?))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostWithComments>, PostsApiError> {
    Ok(Json(state.posts.get(post_id).await?))
}

pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(draft): Json<PostDraft>,
) -> Result<(StatusCode, Json<Post>), PostsApiError> {
    let post = state.posts.create(draft, user.id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
    Json(draft): Json<PostDraft>,
) -> Result<Json<Post>, PostsApiError> {
    Ok(Json(state.posts.update(post_id, user.id, draft).await?))
}

pub async fn remove_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, PostsApiError> {
    Ok(Json(state.posts.remove(post_id, user.id).await?))
}

pub async fn comments_daily_breakdown(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Query(params): Query<BreakdownParams>,
) -> Result<Json<BTreeMap<NaiveDate, DailyCommentCounts>>, PostsApiError> {
    let from = params
        .date_from
        .ok_or(PostsApiError::MissingParam("date_from"))?;
    let to = params.date_to.ok_or(PostsApiError::MissingParam("date_to"))?;
    let range = DateRange::parse(&from, &to)?;
    Ok(Json(state.posts.comments_daily_breakdown(post_id, &range).await?))
}

impl IntoResponse for PostsApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            PostsApiError::MissingParam(_)
            | PostsApiError::Invalid(_)
            | PostsApiError::Service(ServiceError::Invalid(_)) => StatusCode::BAD_REQUEST,
            PostsApiError::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            PostsApiError::Service(ServiceError::Store(err)) => {
                error!(error = %err, "post store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}
