pub mod comments;
pub mod posts;

use crate::error::CoreError;

pub const MAX_TEXT_LEN: usize = 10_000;

pub fn validate_text(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::InvalidText("text is empty".to_string()));
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(CoreError::InvalidText(format!(
            "text has {len} chars (max {MAX_TEXT_LEN})"
        )));
    }
    Ok(())
}
