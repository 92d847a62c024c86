use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validate_text;
use crate::error::CoreError;
use crate::types::date_range::DateRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub done: bool,
    pub blocked: bool,
    pub user_id: i64,
    pub post_id: i64,
    pub auto_reply_flag: bool,
    pub auto_reply_time: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Seconds to wait before the automatic reply is generated.
    pub fn reply_delay_secs(&self) -> u64 {
        self.auto_reply_time
            .and_then(|secs| u64::try_from(secs).ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentDraft {
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub auto_reply_flag: bool,
    #[serde(default)]
    pub auto_reply_time: Option<i32>,
}

impl CommentDraft {
    /// Draft for a synthetic reply. Replies never request a reply of their own.
    pub fn reply(text: String) -> Self {
        Self {
            text,
            done: false,
            auto_reply_flag: false,
            auto_reply_time: None,
        }
    }

    pub fn validate(&self, max_auto_reply_secs: u64) -> Result<(), CoreError> {
        validate_text(&self.text)?;
        if let Some(secs) = self.auto_reply_time {
            if secs < 0 {
                return Err(CoreError::InvalidAutoReplyTime(format!(
                    "{secs} is negative"
                )));
            }
            if u64::try_from(secs).map_or(true, |secs| secs > max_auto_reply_secs) {
                return Err(CoreError::InvalidAutoReplyTime(format!(
                    "{secs} exceeds {max_auto_reply_secs} seconds"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub done: bool,
    pub blocked: bool,
    pub user_id: i64,
    pub post_id: i64,
    pub auto_reply_flag: bool,
    pub auto_reply_time: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CommentChanges {
    pub text: String,
    pub done: bool,
    pub blocked: bool,
}

/// Ownership-scoped address of a comment: id, parent post and author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentKey {
    pub comment_id: i64,
    pub post_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyCommentCounts {
    pub total_count_of_comments: usize,
    pub blocked_count_of_comments: usize,
    pub unblocked_count_of_comments: usize,
}

/// Buckets comments per UTC calendar day. Every day of the range is present,
/// including days without comments; comments outside the range are ignored.
pub fn daily_breakdown(
    range: &DateRange,
    comments: &[Comment],
) -> BTreeMap<NaiveDate, DailyCommentCounts> {
    let mut days: BTreeMap<NaiveDate, DailyCommentCounts> = range
        .days()
        .map(|day| (day, DailyCommentCounts::default()))
        .collect();
    for comment in comments {
        let Some(counts) = days.get_mut(&comment.created_at.date_naive()) else {
            continue;
        };
        counts.total_count_of_comments += 1;
        if comment.blocked {
            counts.blocked_count_of_comments += 1;
        } else {
            counts.unblocked_count_of_comments += 1;
        }
    }
    days
}
