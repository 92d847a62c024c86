use crate::error::CoreError;

pub const DEFAULT_LIMIT: i64 = 100;

/// Offset/limit window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(skip: Option<i64>, limit: Option<i64>, max_limit: i64) -> Result<Self, CoreError> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIMIT.min(max_limit));
        if skip < 0 {
            return Err(CoreError::InvalidPage(format!("skip {skip} is negative")));
        }
        if limit < 0 || limit > max_limit {
            return Err(CoreError::InvalidPage(format!(
                "limit {limit} outside 0..={max_limit}"
            )));
        }
        Ok(Self { skip, limit })
    }

    pub fn skip_usize(&self) -> usize {
        usize::try_from(self.skip).unwrap_or(usize::MAX)
    }

    pub fn limit_usize(&self) -> usize {
        usize::try_from(self.limit).unwrap_or(0)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, DEFAULT_LIMIT};

    #[test]
    fn defaults_apply() {
        let page = Page::new(None, None, 500).unwrap();
        assert_eq!(page, Page { skip: 0, limit: DEFAULT_LIMIT });
    }

    #[test]
    fn default_limit_respects_smaller_max() {
        let page = Page::new(None, None, 20).unwrap();
        assert_eq!(page.limit, 20);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Page::new(Some(-1), None, 100).is_err());
        assert!(Page::new(None, Some(-5), 100).is_err());
        assert!(Page::new(None, Some(101), 100).is_err());
    }
}
