use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Optional inclusive limits on the selectable dates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub min: Option<NaiveDateTime>,
    pub max: Option<NaiveDateTime>,
}

impl DateBounds {
    pub fn new(min: Option<NaiveDateTime>, max: Option<NaiveDateTime>) -> Self {
        DateBounds { min, max }
    }

    /// True only when a minimum is set and `date` is strictly earlier.
    pub fn is_before_min(&self, date: NaiveDateTime) -> bool {
        self.min.is_some_and(|min| date < min)
    }

    /// True only when a maximum is set and `date` is strictly later.
    pub fn is_after_max(&self, date: NaiveDateTime) -> bool {
        self.max.is_some_and(|max| date > max)
    }

    pub fn permits(&self, date: NaiveDateTime) -> bool {
        !self.is_before_min(date) && !self.is_after_max(date)
    }
}

/// Parses `%Y-%m-%d %H:%M` or a bare `%Y-%m-%d` (midnight).
pub fn parse_date_time(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .with_context(|| format!("invalid date '{raw}', expected YYYY-MM-DD [HH:MM]"))
}

/// Parses an optional bound, treating an absent or blank string as unset.
pub fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDateTime>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date_time(s).map(Some),
    }
}

/// Formats a date the way it was entered: time of day only when not midnight.
pub fn format_date_time(date: NaiveDateTime) -> String {
    if date.time() == NaiveTime::MIN {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M").to_string()
    }
}
