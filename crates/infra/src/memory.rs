//! In-process store used when no database is configured, and by tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use postboard_core::domain::comments::{Comment, CommentChanges, CommentKey, NewComment};
use postboard_core::domain::posts::{NewPost, Post, PostChanges};
use postboard_core::store::{
    CommentFilter, CommentStore, PostFilter, PostStore, Store, StoreError,
};
use postboard_core::types::page::Page;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    last_post_id: i64,
    last_comment_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.inner.read().await.posts.len()
    }

    pub async fn comment_count(&self) -> usize {
        self.inner.read().await.comments.len()
    }
}

fn paginate<T>(mut items: Vec<T>, page: Option<Page>) -> Vec<T> {
    let Some(page) = page else {
        return items;
    };
    let skip = page.skip_usize().min(items.len());
    items.drain(..skip);
    items.truncate(page.limit_usize());
    items
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
        let mut tables = self.inner.write().await;
        tables.last_post_id += 1;
        let now = Utc::now();
        let record = Post {
            id: tables.last_post_id,
            text: post.text,
            attachment: post.attachment,
            done: post.done,
            blocked: post.blocked,
            user_id: post.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError> {
        Ok(self.inner.read().await.posts.get(&post_id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter, page: Page) -> Result<Vec<Post>, StoreError> {
        let tables = self.inner.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|post| filter.matches(post))
            .cloned()
            .collect();
        posts.sort_by_key(|post| (post.created_at, post.id));
        Ok(paginate(posts, Some(page)))
    }

    async fn update_post(
        &self,
        post_id: i64,
        user_id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, StoreError> {
        let mut tables = self.inner.write().await;
        let Some(post) = tables
            .posts
            .get_mut(&post_id)
            .filter(|post| post.user_id == user_id)
        else {
            return Ok(None);
        };
        post.text = changes.text;
        post.attachment = changes.attachment;
        post.done = changes.done;
        post.blocked = changes.blocked;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: i64, user_id: i64) -> Result<Option<Post>, StoreError> {
        let mut tables = self.inner.write().await;
        let owned = tables
            .posts
            .get(&post_id)
            .is_some_and(|post| post.user_id == user_id);
        if !owned {
            return Ok(None);
        }
        tables.comments.retain(|_, comment| comment.post_id != post_id);
        Ok(tables.posts.remove(&post_id))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.inner.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(StoreError::MissingPost(comment.post_id));
        }
        tables.last_comment_id += 1;
        let now = Utc::now();
        let record = Comment {
            id: tables.last_comment_id,
            text: comment.text,
            done: comment.done,
            blocked: comment.blocked,
            user_id: comment.user_id,
            post_id: comment.post_id,
            auto_reply_flag: comment.auto_reply_flag,
            auto_reply_time: comment.auto_reply_time,
            created_at: now,
            updated_at: now,
        };
        tables.comments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|comment| comment.post_id == post_id)
            .cloned())
    }

    async fn list_comments(
        &self,
        filter: &CommentFilter,
        page: Option<Page>,
    ) -> Result<Vec<Comment>, StoreError> {
        let tables = self.inner.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|comment| filter.matches(comment))
            .cloned()
            .collect();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));
        Ok(paginate(comments, page))
    }

    async fn update_comment(
        &self,
        key: CommentKey,
        changes: CommentChanges,
    ) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.inner.write().await;
        let Some(comment) = tables
            .comments
            .get_mut(&key.comment_id)
            .filter(|comment| comment.post_id == key.post_id && comment.user_id == key.user_id)
        else {
            return Ok(None);
        };
        comment.text = changes.text;
        comment.done = changes.done;
        comment.blocked = changes.blocked;
        comment.updated_at = Utc::now();
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, key: CommentKey) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.inner.write().await;
        let owned = tables.comments.get(&key.comment_id).is_some_and(|comment| {
            comment.post_id == key.post_id && comment.user_id == key.user_id
        });
        if !owned {
            return Ok(None);
        }
        Ok(tables.comments.remove(&key.comment_id))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
