use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::CoreError;

pub const MAX_RANGE_DAYS: i64 = 366;

/// Inclusive range of UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidDateRange(format!(
                "{start} is later than {end}"
            )));
        }
        if (end - start).num_days() + 1 > MAX_RANGE_DAYS {
            return Err(CoreError::InvalidDateRange(format!(
                "range spans more than {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn parse(from: &str, to: &str) -> Result<Self, CoreError> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|day| *day <= self.end)
    }

    /// Half-open timestamp bounds: midnight of the first day up to midnight
    /// after the last day.
    pub fn to_utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_time(NaiveTime::MIN).and_utc();
        let end = match self.end.succ_opt() {
            Some(next) => next.and_time(NaiveTime::MIN).and_utc(),
            None => DateTime::<Utc>::MAX_UTC,
        };
        (start, end)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, CoreError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .map(|datetime| datetime.date())
        .map_err(|_| CoreError::InvalidDateRange(trimmed.to_string()))
}
