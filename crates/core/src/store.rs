//! Persistence seam for posts and comments.
//!
//! Mutations that need ownership take the owner (and parent post) as part of
//! the key and must apply the whole key in a single statement, so the lookup
//! doubles as the authorization check.

use std::error::Error as StdError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::comments::{Comment, CommentChanges, CommentKey, NewComment};
use crate::domain::posts::{NewPost, Post, PostChanges};
use crate::types::page::Page;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A comment was written against a post that no longer exists.
    #[error("post {0} does not exist")]
    MissingPost(i64),
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub user_id: Option<i64>,
    pub blocked: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post_id: Option<i64>,
    /// Restricts to comments of any of these posts.
    pub post_ids: Option<Vec<i64>>,
    pub user_id: Option<i64>,
    pub blocked: Option<bool>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl CommentFilter {
    pub fn visible_on_post(post_id: i64) -> Self {
        Self {
            post_id: Some(post_id),
            blocked: Some(false),
            ..Self::default()
        }
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.post_id.is_none_or(|id| comment.post_id == id)
            && self
                .post_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&comment.post_id))
            && self.user_id.is_none_or(|id| comment.user_id == id)
            && self.blocked.is_none_or(|blocked| comment.blocked == blocked)
            && self.created_from.is_none_or(|from| comment.created_at >= from)
            && self.created_before.is_none_or(|before| comment.created_at < before)
    }
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        self.user_id.is_none_or(|id| post.user_id == id)
            && self.blocked.is_none_or(|blocked| post.blocked == blocked)
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError>;

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError>;

    /// Ordered by creation time, oldest first.
    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError>;

    async fn update_post(
        &self,
        post_id: i64,
        user_id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, StoreError>;

    /// Deletes the post and its comments.
    async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<Option<Post>, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;

    async fn find_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, StoreError>;

    /// Ordered by creation time, oldest first. `None` returns every match.
    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: Option<Page>,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn update_comment(
        &self,
        key: CommentKey,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, StoreError>;

    async fn delete_comment(&self, key: CommentKey) -> Result<Option<Comment>, StoreError>;
}

#[async_trait]
pub trait Store: PostStore + CommentStore {
    fn kind(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;
}
