pub mod comments;
pub mod health;
pub mod posts;

use serde::Deserialize;

use postboard_core::error::CoreError;
use postboard_core::types::page::Page;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl ListParams {
    fn page(&self, state: &AppState) -> Result<Page, CoreError> {
        Page::new(self.skip, self.limit, state.config.max_page_limit)
    }
}
