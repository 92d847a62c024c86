use async_trait::async_trait;
use postboard_core::domain::comments::{Comment, CommentChanges, CommentKey, NewComment};
use postboard_core::domain::posts::{NewPost, Post, PostChanges};
use postboard_core::store::{
    CommentFilter, CommentStore, PostFilter, PostStore, Store, StoreError,
};
use postboard_core::types::page::Page;

use super::{comments_repo, posts_repo, CommentsRepoError, DbPool, PostsRepoError};

/// Postgres-backed store delegating to the repo functions.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl From<PostsRepoError> for StoreError {
    fn from(err: PostsRepoError) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

impl From<CommentsRepoError> for StoreError {
    fn from(err: CommentsRepoError) -> Self {
        match err {
            CommentsRepoError::MissingPost(post_id) => StoreError::MissingPost(post_id),
            other => StoreError::Backend(Box::new(other)),
        }
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        Ok(posts_repo::insert_post(&self.pool, &post).await?)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError> {
        Ok(posts_repo::find_post(&self.pool, post_id).await?)
    }

    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError> {
        Ok(posts_repo::list_posts(&self.pool, filter, page).await?)
    }

    async fn update_post(
        &self,
        post_id: i64,
        user_id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, StoreError> {
        Ok(posts_repo::update_post(&self.pool, post_id, user_id, &changes).await?)
    }

    async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<Option<Post>, StoreError> {
        Ok(posts_repo::delete_post(&self.pool, post_id, user_id).await?)
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        Ok(comments_repo::insert_comment(&self.pool, &comment).await?)
    }

    async fn find_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, StoreError> {
        Ok(comments_repo::find_comment(&self.pool, post_id, comment_id).await?)
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: Option<Page>,
    ) -> Result<Vec<Comment>, StoreError> {
        Ok(comments_repo::list_comments(&self.pool, filter, page).await?)
    }

    async fn update_comment(
        &self,
        key: CommentKey,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, StoreError> {
        Ok(comments_repo::update_comment(&self.pool, key, &changes).await?)
    }

    async fn delete_comment(&self, key: CommentKey) -> Result<Option<Comment>, StoreError> {
        Ok(comments_repo::delete_comment(&self.pool, key).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn kind(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(())
    }
}
