use std::sync::Arc;

use postboard_core::moderation::WordFilter;
use postboard_core::store::Store;
use postboard_infra::db::DbPool;

use crate::config::AppConfig;
use crate::services::{CommentService, PostService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Option<DbPool>,
    pub store: Arc<dyn Store>,
    pub words: Arc<WordFilter>,
    pub posts: PostService,
    pub comments: CommentService,
}
