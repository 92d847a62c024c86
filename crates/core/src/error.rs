use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("invalid pagination: {0}")]
    InvalidPage(String),
    #[error("invalid text: {0}")]
    InvalidText(String),
    #[error("invalid auto reply time: {0}")]
    InvalidAutoReplyTime(String),
    #[error("invalid word list: {0}")]
    InvalidWordList(String),
}
