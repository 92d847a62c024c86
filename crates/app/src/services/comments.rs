use std::sync::Arc;

use postboard_core::domain::comments::{
    Comment, CommentChanges, CommentDraft, CommentKey, NewComment,
};
use postboard_core::domain::validate_text;
use postboard_core::moderation::WordFilter;
use postboard_core::reply;
use postboard_core::store::{CommentFilter, Store, StoreError};
use postboard_core::types::page::Page;
use tracing::{debug, info, warn};

use super::{Delay, ServiceError};

/// Comment lifecycle: moderation on every write, plus the delayed auto reply.
#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn Store>,
    filter: Arc<WordFilter>,
    delay: Arc<dyn Delay>,
    max_auto_reply_secs: u64,
}

impl CommentService {
    pub fn new(
        store: Arc<dyn Store>,
        filter: Arc<WordFilter>,
        delay: Arc<dyn Delay>,
        max_auto_reply_secs: u64,
    ) -> Self {
        Self {
            store,
            filter,
            delay,
            max_auto_reply_secs,
        }
    }

    /// Stores the comment and returns it. When the comment asks for an
    /// automatic reply, the call is held for `auto_reply_time` seconds while
    /// the reply is generated and stored; a failed reply is logged and does
    /// not affect the stored original.
    pub async fn create(
        &self,
        draft: CommentDraft,
        post_id: i64,
        author_id: i64,
    ) -> Result<Comment, ServiceError> {
        let comment = self.persist(draft, post_id, author_id).await?;
        if !comment.auto_reply_flag {
            return Ok(comment);
        }

        // Runs on its own task so a dropped request still completes the reply.
        let service = self.clone();
        let source = comment.clone();
        let task = tokio::spawn(async move { service.deliver_reply(&source).await });
        match task.await {
            Ok(Ok(reply)) => info!(
                comment_id = comment.id,
                reply_id = reply.id,
                post_id,
                "auto reply delivered"
            ),
            Ok(Err(err)) => warn!(
                comment_id = comment.id,
                post_id,
                error = %err,
                "auto reply failed"
            ),
            Err(err) => warn!(
                comment_id = comment.id,
                post_id,
                error = %err,
                "auto reply task did not complete"
            ),
        }
        Ok(comment)
    }

    pub async fn update(
        &self,
        comment_id: i64,
        post_id: i64,
        author_id: i64,
        draft: CommentDraft,
    ) -> Result<Comment, ServiceError> {
        // Auto-reply fields only matter on create.
        validate_text(&draft.text)?;
        let key = CommentKey {
            comment_id,
            post_id,
            user_id: author_id,
        };
        let changes = CommentChanges {
            blocked: self.filter.is_blocked(&draft.text),
            text: draft.text,
            done: draft.done,
        };
        let comment = self
            .store
            .update_comment(key, changes)
            .await?
            .ok_or(ServiceError::NotFound("comment"))?;
        info!(
            comment_id,
            post_id,
            blocked = comment.blocked,
            "comment updated"
        );
        Ok(comment)
    }

    pub async fn remove(
        &self,
        comment_id: i64,
        post_id: i64,
        author_id: i64,
    ) -> Result<Comment, ServiceError> {
        let key = CommentKey {
            comment_id,
            post_id,
            user_id: author_id,
        };
        let comment = self
            .store
            .delete_comment(key)
            .await?
            .ok_or(ServiceError::NotFound("comment"))?;
        info!(comment_id, post_id, "comment removed");
        Ok(comment)
    }

    /// Visible comments of a post, optionally restricted to one author.
    pub async fn list(
        &self,
        post_id: i64,
        author_id: Option<i64>,
        page: Page,
    ) -> Result<Vec<Comment>, ServiceError> {
        let filter = CommentFilter {
            user_id: author_id,
            ..CommentFilter::visible_on_post(post_id)
        };
        Ok(self.store.list_comments(&filter, Some(page)).await?)
    }

    pub async fn get(&self, post_id: i64, comment_id: i64) -> Result<Comment, ServiceError> {
        self.store
            .find_comment(post_id, comment_id)
            .await?
            .filter(|comment| !comment.blocked)
            .ok_or(ServiceError::NotFound("comment"))
    }

    async fn persist(
        &self,
        draft: CommentDraft,
        post_id: i64,
        author_id: i64,
    ) -> Result<Comment, ServiceError> {
        draft.validate(self.max_auto_reply_secs)?;
        if self.store.find_post(post_id).await?.is_none() {
            return Err(ServiceError::NotFound("post"));
        }
        let blocked = self.filter.is_blocked(&draft.text);
        let comment = self
            .store
            .insert_comment(NewComment {
                text: draft.text,
                done: draft.done,
                blocked,
                user_id: author_id,
                post_id,
                auto_reply_flag: draft.auto_reply_flag,
                auto_reply_time: draft.auto_reply_time,
            })
            .await
            .map_err(|err| match err {
                StoreError::MissingPost(_) => ServiceError::NotFound("post"),
                other => ServiceError::Store(other),
            })?;
        info!(
            comment_id = comment.id,
            post_id,
            blocked,
            auto_reply = comment.auto_reply_flag,
            "comment created"
        );
        Ok(comment)
    }

    async fn deliver_reply(&self, source: &Comment) -> Result<Comment, ServiceError> {
        let delay_secs = source.reply_delay_secs();
        debug!(comment_id = source.id, delay_secs, "waiting before auto reply");
        self.delay.sleep(delay_secs).await;
        let text = reply::generate(&source.text);
        self.persist(CommentDraft::reply(text), source.post_id, source.user_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use postboard_core::domain::comments::{
        Comment, CommentChanges, CommentDraft, CommentKey, NewComment,
    };
    use postboard_core::domain::posts::{NewPost, Post, PostChanges};
    use postboard_core::moderation::WordFilter;
    use postboard_core::reply::{DEFAULT_REPLY, HELP_REPLY, ISSUE_REPLY};
    use postboard_core::store::{
        CommentFilter, CommentStore, PostFilter, PostStore, Store, StoreError,
    };
    use postboard_core::types::page::Page;
    use postboard_infra::memory::MemoryStore;

    use super::CommentService;
    use crate::services::testing::RecordingDelay;
    use crate::services::{Delay, ServiceError, TokioDelay};

    const AUTHOR: i64 = 7;

    async fn setup(delay: Arc<dyn Delay>) -> (Arc<MemoryStore>, CommentService, i64) {
        let store = Arc::new(MemoryStore::new());
        let post = store
            .insert_post(NewPost {
                text: "a post".to_string(),
                attachment: None,
                done: false,
                blocked: false,
                user_id: 1,
            })
            .await
            .unwrap();
        let service = CommentService::new(
            store.clone(),
            Arc::new(WordFilter::new(["bad"])),
            delay,
            60,
        );
        (store, service, post.id)
    }

    fn draft(text: &str) -> CommentDraft {
        CommentDraft {
            text: text.to_string(),
            done: false,
            auto_reply_flag: false,
            auto_reply_time: None,
        }
    }

    fn auto_reply(text: &str, secs: i32) -> CommentDraft {
        CommentDraft {
            auto_reply_flag: true,
            auto_reply_time: Some(secs),
            ..draft(text)
        }
    }

    async fn all_comments(store: &MemoryStore, post_id: i64) -> Vec<Comment> {
        let filter = CommentFilter {
            post_id: Some(post_id),
            ..CommentFilter::default()
        };
        store.list_comments(&filter, None).await.unwrap()
    }

    #[tokio::test]
    async fn plain_comment_is_stored_once() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let comment = service.create(draft("nice post"), post_id, AUTHOR).await.unwrap();
        assert!(!comment.blocked);
        assert_eq!(comment.user_id, AUTHOR);
        assert_eq!(all_comments(&store, post_id).await.len(), 1);
    }

    #[tokio::test]
    async fn auto_reply_adds_exactly_one_reply() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let original = service
            .create(auto_reply("can you help me", 0), post_id, AUTHOR)
            .await
            .unwrap();
        assert!(original.auto_reply_flag);
        assert_eq!(original.text, "can you help me");

        let comments = all_comments(&store, post_id).await;
        assert_eq!(comments.len(), 2);
        let reply = &comments[1];
        assert_eq!(reply.text, HELP_REPLY);
        assert!(!reply.auto_reply_flag);
        assert_eq!(reply.auto_reply_time, None);
        assert_eq!(reply.user_id, AUTHOR);
        assert_eq!(reply.post_id, post_id);
    }

    #[tokio::test]
    async fn auto_reply_waits_requested_delay() {
        let delay = RecordingDelay::new();
        let (store, service, post_id) = setup(delay.clone()).await;
        service
            .create(auto_reply("hello", 5), post_id, AUTHOR)
            .await
            .unwrap();
        assert_eq!(delay.calls(), vec![5]);
        let comments = all_comments(&store, post_id).await;
        assert_eq!(comments[1].text, DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn auto_reply_without_time_uses_zero_delay() {
        let delay = RecordingDelay::new();
        let (_store, service, post_id) = setup(delay.clone()).await;
        let mut request = auto_reply("hello", 0);
        request.auto_reply_time = None;
        service.create(request, post_id, AUTHOR).await.unwrap();
        assert_eq!(delay.calls(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_reply_holds_the_call_for_the_delay() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let started = tokio::time::Instant::now();
        service
            .create(auto_reply("hello", 30), post_id, AUTHOR)
            .await
            .unwrap();
        assert!(started.elapsed() >= std::time::Duration::from_secs(30));
        assert_eq!(all_comments(&store, post_id).await.len(), 2);
    }

    /// Wraps [`MemoryStore`]: comment inserts fail once `inserts_left` runs
    /// out, and `drop_post_on_find` deletes the post right after it is found.
    struct ScriptedStore {
        inner: MemoryStore,
        inserts_left: AtomicUsize,
        drop_post_on_find: bool,
    }

    impl ScriptedStore {
        fn new(inserts_left: usize, drop_post_on_find: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                inserts_left: AtomicUsize::new(inserts_left),
                drop_post_on_find,
            }
        }
    }

    #[async_trait]
    impl PostStore for ScriptedStore {
        async fn insert_post(&self, post: NewPost) -> Result<Post, StoreError> {
            self.inner.insert_post(post).await
        }

        async fn find_post(&self, post_id: i64) -> Result<Option<Post>, StoreError> {
            let found = self.inner.find_post(post_id).await?;
            if let (true, Some(post)) = (self.drop_post_on_find, found.as_ref()) {
                self.inner.delete_post(post.id, post.user_id).await?;
            }
            Ok(found)
        }

        async fn list_posts(
            &self,
            filter: &PostFilter,
            page: Page,
        ) -> Result<Vec<Post>, StoreError> {
            self.inner.list_posts(filter, page).await
        }

        async fn update_post(
            &self,
            post_id: i64,
            user_id: i64,
            changes: PostChanges,
        ) -> Result<Option<Post>, StoreError> {
            self.inner.update_post(post_id, user_id, changes).await
        }

        async fn delete_post(
            &self,
            post_id: i64,
            user_id: i64,
        ) -> Result<Option<Post>, StoreError> {
            self.inner.delete_post(post_id, user_id).await
        }
    }

    #[async_trait]
    impl CommentStore for ScriptedStore {
        async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
            let left = self.inserts_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::Backend("insert refused".into()));
            }
            self.inserts_left.store(left - 1, Ordering::SeqCst);
            self.inner.insert_comment(comment).await
        }

        async fn find_comment(
            &self,
            post_id: i64,
            comment_id: i64,
        ) -> Result<Option<Comment>, StoreError> {
            self.inner.find_comment(post_id, comment_id).await
        }

        async fn list_comments(
            &self,
            filter: &CommentFilter,
            page: Option<Page>,
        ) -> Result<Vec<Comment>, StoreError> {
            self.inner.list_comments(filter, page).await
        }

        async fn update_comment(
            &self,
            key: CommentKey,
            changes: CommentChanges,
        ) -> Result<Option<Comment>, StoreError> {
            self.inner.update_comment(key, changes).await
        }

        async fn delete_comment(&self, key: CommentKey) -> Result<Option<Comment>, StoreError> {
            self.inner.delete_comment(key).await
        }
    }

    #[async_trait]
    impl Store for ScriptedStore {
        fn kind(&self) -> &'static str {
            "scripted"
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    async fn scripted(store: ScriptedStore) -> (Arc<ScriptedStore>, CommentService, i64) {
        let store = Arc::new(store);
        let post = store
            .insert_post(NewPost {
                text: "a post".to_string(),
                attachment: None,
                done: false,
                blocked: false,
                user_id: 1,
            })
            .await
            .unwrap();
        let service = CommentService::new(
            store.clone(),
            Arc::new(WordFilter::default()),
            Arc::new(TokioDelay),
            60,
        );
        (store, service, post.id)
    }

    #[tokio::test]
    async fn failed_reply_keeps_stored_original() {
        let (store, service, post_id) = scripted(ScriptedStore::new(1, false)).await;
        let original = service
            .create(auto_reply("help", 0), post_id, AUTHOR)
            .await
            .unwrap();
        assert_eq!(original.text, "help");
        assert_eq!(store.inner.comment_count().await, 1);
        let stored = store.find_comment(post_id, original.id).await.unwrap();
        assert_eq!(stored, Some(original));
    }

    #[tokio::test]
    async fn post_deleted_before_insert_is_not_found() {
        let (store, service, post_id) = scripted(ScriptedStore::new(10, true)).await;
        let result = service.create(draft("late"), post_id, AUTHOR).await;
        assert!(matches!(result, Err(ServiceError::NotFound("post"))));
        assert_eq!(store.inner.comment_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_still_delivers_reply() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let request = service.create(auto_reply("any issue?", 30), post_id, AUTHOR);
        let outcome = tokio::time::timeout(Duration::from_secs(1), request).await;
        assert!(outcome.is_err());
        assert_eq!(all_comments(&store, post_id).await.len(), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        let comments = all_comments(&store, post_id).await;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].text, ISSUE_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_reply_does_not_block_other_comments() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let slow_service = service.clone();
        let slow = tokio::spawn(async move {
            slow_service
                .create(auto_reply("hello", 100), post_id, AUTHOR)
                .await
        });
        tokio::task::yield_now().await;

        let started = tokio::time::Instant::now();
        service.create(draft("quick"), post_id, AUTHOR + 1).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(!slow.is_finished());

        slow.await.unwrap().unwrap();
        assert_eq!(all_comments(&store, post_id).await.len(), 3);
    }

    #[tokio::test]
    async fn blocked_comment_is_stored_but_hidden() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let blocked = service.create(draft("this is BAD"), post_id, AUTHOR).await.unwrap();
        assert!(blocked.blocked);
        service.create(draft("badly phrased"), post_id, AUTHOR).await.unwrap();
        assert_eq!(all_comments(&store, post_id).await.len(), 2);

        let visible = service.list(post_id, None, Page::default()).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert!(visible.iter().all(|comment| !comment.blocked));
        assert!(matches!(
            service.get(post_id, blocked.id).await,
            Err(ServiceError::NotFound("comment"))
        ));
    }

    #[tokio::test]
    async fn blocked_reply_source_still_gets_reply() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        service
            .create(auto_reply("bad issue", 0), post_id, AUTHOR)
            .await
            .unwrap();
        let comments = all_comments(&store, post_id).await;
        assert_eq!(comments.len(), 2);
        assert!(comments[0].blocked);
        assert!(!comments[1].blocked);
    }

    #[tokio::test]
    async fn list_filters_by_author() {
        let (_store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        service.create(draft("mine"), post_id, AUTHOR).await.unwrap();
        service.create(draft("theirs"), post_id, AUTHOR + 1).await.unwrap();
        let mine = service.list(post_id, Some(AUTHOR), Page::default()).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].text, "mine");
    }

    #[tokio::test]
    async fn create_on_missing_post_is_not_found() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let result = service.create(draft("hello"), post_id + 100, AUTHOR).await;
        assert!(matches!(result, Err(ServiceError::NotFound("post"))));
        assert_eq!(store.comment_count().await, 0);
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_storage() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        assert!(matches!(
            service.create(draft("   "), post_id, AUTHOR).await,
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            service.create(auto_reply("hi", 61), post_id, AUTHOR).await,
            Err(ServiceError::Invalid(_))
        ));
        assert_eq!(store.comment_count().await, 0);
    }

    #[tokio::test]
    async fn update_reclassifies_and_checks_owner() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let comment = service.create(draft("fine"), post_id, AUTHOR).await.unwrap();

        let denied = service
            .update(comment.id, post_id, AUTHOR + 1, draft("changed"))
            .await;
        assert!(matches!(denied, Err(ServiceError::NotFound("comment"))));
        assert_eq!(all_comments(&store, post_id).await[0].text, "fine");

        let updated = service
            .update(comment.id, post_id, AUTHOR, draft("now bad"))
            .await
            .unwrap();
        assert!(updated.blocked);
        let cleaned = service
            .update(comment.id, post_id, AUTHOR, draft("clean again"))
            .await
            .unwrap();
        assert!(!cleaned.blocked);
    }

    #[tokio::test]
    async fn update_never_triggers_reply() {
        let delay = RecordingDelay::new();
        let (store, service, post_id) = setup(delay.clone()).await;
        let comment = service.create(draft("fine"), post_id, AUTHOR).await.unwrap();
        service
            .update(comment.id, post_id, AUTHOR, auto_reply("help", 0))
            .await
            .unwrap();
        assert!(delay.calls().is_empty());
        assert_eq!(store.comment_count().await, 1);
    }

    #[tokio::test]
    async fn update_ignores_auto_reply_time() {
        let (_store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let comment = service.create(draft("fine"), post_id, AUTHOR).await.unwrap();
        let updated = service
            .update(comment.id, post_id, AUTHOR, auto_reply("edited", 3600))
            .await
            .unwrap();
        assert_eq!(updated.text, "edited");
        assert!(matches!(
            service
                .update(comment.id, post_id, AUTHOR, auto_reply(" ", 0))
                .await,
            Err(ServiceError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn remove_missing_triple_is_not_found() {
        let (store, service, post_id) = setup(Arc::new(TokioDelay)).await;
        let comment = service.create(draft("keep me"), post_id, AUTHOR).await.unwrap();
        for (comment_id, post, author) in [
            (comment.id + 1, post_id, AUTHOR),
            (comment.id, post_id + 1, AUTHOR),
            (comment.id, post_id, AUTHOR + 1),
        ] {
            assert!(matches!(
                service.remove(comment_id, post, author).await,
                Err(ServiceError::NotFound("comment"))
            ));
        }
        assert_eq!(store.comment_count().await, 1);
        let removed = service.remove(comment.id, post_id, AUTHOR).await.unwrap();
        assert_eq!(removed.id, comment.id);
        assert_eq!(store.comment_count().await, 0);
    }
}
