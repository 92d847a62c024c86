pub mod comments;
pub mod posts;

use std::time::Duration;

use async_trait::async_trait;
use postboard_core::error::CoreError;
use postboard_core::store::StoreError;
use thiserror::Error;

pub use comments::CommentService;
pub use posts::PostService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation error: {0}")]
    Invalid(#[from] CoreError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Suspends the calling task; the auto-reply wait goes through here.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, secs: u64);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, secs: u64) {
        if secs > 0 {
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }
}
