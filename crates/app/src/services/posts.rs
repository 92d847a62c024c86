use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use postboard_core::domain::comments::{daily_breakdown, Comment, DailyCommentCounts};
use postboard_core::domain::posts::{NewPost, Post, PostChanges, PostDraft, PostWithComments};
use postboard_core::moderation::WordFilter;
use postboard_core::store::{CommentFilter, PostFilter, Store};
use postboard_core::types::date_range::DateRange;
use postboard_core::types::page::Page;
use tracing::info;

use super::ServiceError;

/// Post lifecycle. Text is classified on create and again on every update.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn Store>,
    filter: Arc<WordFilter>,
}

impl PostService {
    pub fn new(store: Arc<dyn Store>, filter: Arc<WordFilter>) -> Self {
        Self { store, filter }
    }

    pub async fn create(&self, draft: PostDraft, author_id: i64) -> Result<Post, ServiceError> {
        draft.validate()?;
        let blocked = self.filter.is_blocked(&draft.text);
        let post = self
            .store
            .insert_post(NewPost {
                text: draft.text,
                attachment: draft.attachment,
                done: draft.done,
                blocked,
                user_id: author_id,
            })
            .await?;
        info!(post_id = post.id, blocked, "post created");
        Ok(post)
    }

    pub async fn update(
        &self,
        post_id: i64,
        author_id: i64,
        draft: PostDraft,
    ) -> Result<Post, ServiceError> {
        draft.validate()?;
        let changes = PostChanges {
            blocked: self.filter.is_blocked(&draft.text),
            text: draft.text,
            attachment: draft.attachment,
            done: draft.done,
        };
        let post = self
            .store
            .update_post(post_id, author_id, changes)
            .await?
            .ok_or(ServiceError::NotFound("post"))?;
        info!(post_id, blocked = post.blocked, "post updated");
        Ok(post)
    }

    pub async fn remove(&self, post_id: i64, author_id: i64) -> Result<Post, ServiceError> {
        let post = self
            .store
            .delete_post(post_id, author_id)
            .await?
            .ok_or(ServiceError::NotFound("post"))?;
        info!(post_id, "post removed");
        Ok(post)
    }

    /// Visible posts, each with its visible comments.
    pub async fn list(
        &self,
        author_id: Option<i64>,
        page: Page,
    ) -> Result<Vec<PostWithComments>, ServiceError> {
        let filter = PostFilter {
            user_id: author_id,
            blocked: Some(false),
        };
        let posts = self.store.list_posts(&filter, page).await?;
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let filter = CommentFilter {
            post_ids: Some(posts.iter().map(|post| post.id).collect()),
            blocked: Some(false),
            ..CommentFilter::default()
        };
        let mut by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for comment in self.store.list_comments(&filter, None).await? {
            by_post.entry(comment.post_id).or_default().push(comment);
        }
        Ok(posts
            .into_iter()
            .map(|post| PostWithComments {
                comments: by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }

    /// A visible post with its visible comments.
    pub async fn get(&self, post_id: i64) -> Result<PostWithComments, ServiceError> {
        let post = self
            .store
            .find_post(post_id)
            .await?
            .filter(|post| !post.blocked)
            .ok_or(ServiceError::NotFound("post"))?;
        let comments = self
            .store
            .list_comments(&CommentFilter::visible_on_post(post_id), None)
            .await?;
        Ok(PostWithComments { post, comments })
    }

    pub async fn comments_daily_breakdown(
        &self,
        post_id: i64,
        range: &DateRange,
    ) -> Result<BTreeMap<NaiveDate, DailyCommentCounts>, ServiceError> {
        if self.store.find_post(post_id).await?.is_none() {
            return Err(ServiceError::NotFound("post"));
        }
        let (from, before) = range.to_utc_bounds();
        let filter = CommentFilter {
            post_id: Some(post_id),
            created_from: Some(from),
            created_before: Some(before),
            ..CommentFilter::default()
        };
        let comments = self.store.list_comments(&filter, None).await?;
        Ok(daily_breakdown(range, &comments))
    }
}
