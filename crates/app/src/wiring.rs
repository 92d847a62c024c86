use std::path::{Path, PathBuf};
use std::sync::Arc;

use postboard_core::error::CoreError;
use postboard_core::moderation::WordFilter;
use postboard_core::store::Store;
use postboard_infra::db::{connect_lazy, DbPool, DbPoolError, PgStore};
use postboard_infra::memory::MemoryStore;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::services::{CommentService, Delay, PostService, TokioDelay};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("failed to read word list {path}: {source}")]
    WordsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("word list error: {0}")]
    Words(#[from] CoreError),
    #[error("db error: {0}")]
    Db(#[from] DbPoolError),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let words = load_words(config.words_path.as_deref())?;
    info!(words = words.len(), "word filter loaded");
    let db = config
        .database_url
        .as_deref()
        .map(|url| connect_lazy(url, config.db_max_connections))
        .transpose()?;
    let store: Arc<dyn Store> = match db.as_ref() {
        Some(pool) => Arc::new(PgStore::new(pool.clone())),
        None => {
            warn!("database not configured; using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(assemble(
        config,
        db,
        store,
        Arc::new(words),
        Arc::new(TokioDelay),
    ))
}

pub fn assemble(
    config: AppConfig,
    db: Option<DbPool>,
    store: Arc<dyn Store>,
    words: Arc<WordFilter>,
    delay: Arc<dyn Delay>,
) -> AppState {
    let posts = PostService::new(store.clone(), words.clone());
    let comments = CommentService::new(
        store.clone(),
        words.clone(),
        delay,
        config.max_auto_reply.as_secs(),
    );
    AppState {
        config: Arc::new(config),
        db,
        store,
        words,
        posts,
        comments,
    }
}

fn load_words(path: Option<&Path>) -> Result<WordFilter, WiringError> {
    let Some(path) = path else {
        return Ok(WordFilter::builtin()?);
    };
    let raw = std::fs::read_to_string(path).map_err(|source| WiringError::WordsIo {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WordFilter::from_json(&raw)?)
}
