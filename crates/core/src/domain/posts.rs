use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::comments::Comment;
use crate::domain::validate_text;
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub attachment: Option<String>,
    pub done: bool,
    pub blocked: bool,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Client-submitted post body, used for both create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDraft {
    pub text: String,
    #[serde(default)]
    pub attachment: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl PostDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_text(&self.text)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub attachment: Option<String>,
    pub done: bool,
    pub blocked: bool,
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub attachment: Option<String>,
    pub done: bool,
    pub blocked: bool,
}
