use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

pub const DATE_ROWS: usize = 6;
pub const WEEK_LEN: usize = 7;
pub const GRID_CELLS: usize = DATE_ROWS * WEEK_LEN;

/// Number of year cells shown on one page of the Years view.
pub const YEAR_CELLS: i32 = 16;

pub const WEEKDAY_HEADERS: [&str; WEEK_LEN] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One slot of the day grid. `disabled` marks days outside the displayed month.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDateTime,
    pub disabled: bool,
}

/// Full month name for a zero-based month index.
pub(crate) fn month_name(month: u32) -> &'static str {
    MONTH_NAMES.get(month as usize).copied().unwrap_or("Unknown")
}

pub(crate) fn month_abbrev(month: u32) -> &'static str {
    match MONTH_NAMES.get(month as usize) {
        Some(name) => &name[..3],
        None => "???",
    }
}

/// Days in a month; `month` is zero-based.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 11 { (year + 1, 1) } else { (year, month + 2) };
    match (
        NaiveDate::from_ymd_opt(year, month + 1, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 0,
    }
}

/// Folds a month index of 12 or more into the following years.
pub(crate) fn normalize_month(year: i32, month: u32) -> (i32, u32) {
    (year + (month / 12) as i32, month % 12)
}

/// Builds the 6×7 Monday-first grid for `month` (zero-based) of `year`.
///
/// Leading and trailing cells belong to the neighbouring months and are
/// disabled. Every cell carries `time` as its time of day, or midnight.
pub fn build_month_grid(year: i32, month: u32, time: Option<NaiveTime>) -> Vec<CalendarCell> {
    let (year, month) = normalize_month(year, month);
    let time = time.unwrap_or(NaiveTime::MIN);
    let Some(first) = NaiveDate::from_ymd_opt(year, month + 1, 1) else {
        return Vec::new();
    };

    let leading = first.weekday().num_days_from_monday() as i64;
    let start = first - Duration::days(leading);

    let mut cells = Vec::with_capacity(GRID_CELLS);
    let mut current = start;
    while cells.len() < GRID_CELLS {
        cells.push(CalendarCell {
            date: current.and_time(time),
            disabled: current.month0() != month || current.year() != year,
        });
        current = match current.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    cells
}

/// The 16 years of the Years view page containing `year`.
pub fn surrounding_years(year: i32) -> Vec<i32> {
    let start = year - YEAR_CELLS / 2 + 1;
    let end = year + YEAR_CELLS / 2;
    (start..=end).collect()
}

pub(crate) fn is_same_day(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_grid_always_has_42_cells() {
        for year in [1895, 1900, 1999, 2000, 2023, 2024, 2100] {
            for month in 0..12 {
                let cells = build_month_grid(year, month, None);
                assert_eq!(cells.len(), GRID_CELLS, "{year}-{month}");
            }
        }
    }

    #[test]
    fn test_enabled_cells_match_days_in_month() {
        for year in [1895, 2023, 2024] {
            for month in 0..12 {
                let enabled = build_month_grid(year, month, None)
                    .iter()
                    .filter(|c| !c.disabled)
                    .count();
                assert_eq!(enabled as u32, days_in_month(year, month));
            }
        }
    }

    #[test]
    fn test_cells_are_consecutive_days() {
        for year in [1895, 2023, 2024] {
            for month in 0..12 {
                let cells = build_month_grid(year, month, None);
                for pair in cells.windows(2) {
                    assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
                }
            }
        }
    }

    #[test]
    fn test_grid_starts_on_monday() {
        for month in 0..12 {
            let cells = build_month_grid(2025, month, None);
            assert_eq!(cells[0].date.weekday(), Weekday::Mon);
        }
    }

    #[test]
    fn test_february_2024_layout() {
        let cells = build_month_grid(2024, 1, None);
        assert!(cells[..3].iter().all(|c| c.disabled));
        assert!(!cells[3].disabled);
        assert_eq!(cells[3].date.date(), d(2024, 2, 1));
        assert_eq!(cells[3].date.weekday(), Weekday::Thu);
        assert_eq!(cells.iter().filter(|c| !c.disabled).count(), 29);
    }

    #[test]
    fn test_month_starting_monday_has_no_leading_cells() {
        // 2024-01-01 is a Monday
        let cells = build_month_grid(2024, 0, None);
        assert!(!cells[0].disabled);
        assert_eq!(cells[0].date.date(), d(2024, 1, 1));
    }

    #[test]
    fn test_month_starting_sunday_has_six_leading_cells() {
        // 2024-09-01 is a Sunday
        let cells = build_month_grid(2024, 8, None);
        assert!(cells[..6].iter().all(|c| c.disabled));
        assert_eq!(cells[6].date.date(), d(2024, 9, 1));
    }

    #[test]
    fn test_trailing_cells_are_disabled() {
        let cells = build_month_grid(2024, 1, None);
        let last = cells.last().unwrap();
        assert!(last.disabled);
        assert_eq!(last.date.date(), d(2024, 3, 10));
    }

    #[test]
    fn test_time_of_day_carried_onto_cells() {
        let time = NaiveTime::from_hms_opt(14, 30, 0).unwrap();
        let cells = build_month_grid(2024, 5, Some(time));
        assert!(cells.iter().all(|c| c.date.time() == time));
    }

    #[test]
    fn test_month_overflow_carries_into_year() {
        let cells = build_month_grid(2024, 12, None);
        let first_enabled = cells.iter().find(|c| !c.disabled).unwrap();
        assert_eq!(first_enabled.date.date(), d(2025, 1, 1));
    }

    #[test]
    fn test_days_in_month_values() {
        assert_eq!(days_in_month(2025, 0), 31);
        assert_eq!(days_in_month(2025, 1), 28);
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2025, 3), 30);
        assert_eq!(days_in_month(2025, 11), 31);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(0), "January");
        assert_eq!(month_name(11), "December");
        assert_eq!(month_name(12), "Unknown");
        assert_eq!(month_abbrev(8), "Sep");
        assert_eq!(month_abbrev(20), "???");
    }

    #[test]
    fn test_surrounding_years_page() {
        let years = surrounding_years(2024);
        assert_eq!(years.len(), YEAR_CELLS as usize);
        assert_eq!(years[0], 2017);
        assert_eq!(*years.last().unwrap(), 2032);
        assert!(years.contains(&2024));
    }

    #[test]
    fn test_is_same_day() {
        assert!(is_same_day(d(2024, 3, 5), d(2024, 3, 5)));
        assert!(!is_same_day(d(2024, 3, 5), d(2023, 3, 5)));
    }
}
