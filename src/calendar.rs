//! Month view helpers for the appointment calendar.
//!
//! A month is always rendered as 6 weeks of 7 days starting on a Sunday,
//! padded with the tail of the previous month and the head of the next.

use chrono::{Datelike, Days, Local, Months, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

pub const GRID_CELLS: usize = 42;
/// Years a `CalendarMonth` may show; keeps `to_iso_date` at four digits.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub iso_date: String,
    pub is_current_month: bool,
    pub is_today: bool,
}

/// `YYYY-MM-DD` of the calendar date as seen in the value's own timezone.
///
/// Works on `NaiveDate` as well as `DateTime<Tz>`; a `DateTime` is never
/// converted to UTC first, so local midnight keeps its date. Years outside
/// 1..=9999 do not fit `YYYY` and come out with a sign or a fifth digit.
pub fn to_iso_date<D: Datelike>(date: &D) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn today_iso() -> String {
    to_iso_date(&Local::now())
}

/// Builds the 42-cell grid for the month containing `focused_month`.
///
/// Months within six weeks of `NaiveDate::MIN`/`MAX` are out of reach;
/// [`CalendarMonth`] never produces one.
pub fn generate_month_grid(focused_month: NaiveDate, today_iso: &str) -> [CalendarCell; GRID_CELLS] {
    let first_of_month = focused_month.with_day(1).unwrap_or(focused_month);
    let lead = u64::from(first_of_month.weekday().num_days_from_sunday());
    let grid_start = first_of_month - Days::new(lead);

    std::array::from_fn(|i| {
        let date = grid_start + Days::new(i as u64);
        let iso_date = to_iso_date(&date);
        CalendarCell {
            date,
            is_current_month: date.year() == first_of_month.year() && date.month() == first_of_month.month(),
            is_today: iso_date == today_iso,
            iso_date,
        }
    })
}

/// The grid as 6 rows of 7 cells.
pub fn weeks(grid: &[CalendarCell]) -> impl Iterator<Item = &[CalendarCell]> {
    grid.chunks(WEEKDAY_LABELS.len())
}

/// Appointment counts per day, for the badges on each cell.
pub fn count_by_day<I>(dates: I) -> BTreeMap<NaiveDate, usize>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut counts = BTreeMap::new();
    for date in dates {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts
}

/// The month currently shown, with prev/next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    first_day: NaiveDate,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !YEAR_RANGE.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| CalendarMonth { first_day })
    }

    pub fn containing(date: NaiveDate) -> Self {
        CalendarMonth { first_day: date.with_day(1).unwrap_or(date) }
    }

    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }

    /// Accepts `YYYY-MM` with a year in 1..=9999.
    pub fn parse(text: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d").ok()?;
        Self::new(date.year(), date.month())
    }

    /// Stays on the last month when there is no next one.
    pub fn next(&self) -> Self {
        self.first_day
            .checked_add_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    pub fn previous(&self) -> Self {
        self.first_day
            .checked_sub_months(Months::new(1))
            .and_then(|d| Self::new(d.year(), d.month()))
            .unwrap_or(*self)
    }

    /// `"November 2025"`
    pub fn title(&self) -> String {
        self.first_day.format("%B %Y").to_string()
    }

    pub fn grid(&self, today_iso: &str) -> [CalendarCell; GRID_CELLS] {
        generate_month_grid(self.first_day, today_iso)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc, Weekday};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grid_always_has_42_cells_starting_on_sunday() {
        for month in 1..=12 {
            for year in [2024, 2025, 2026] {
                let grid = generate_month_grid(ymd(year, month, 15), "");
                assert_eq!(grid.len(), GRID_CELLS);
                assert_eq!(grid[0].date.weekday(), Weekday::Sun, "{year}-{month}");
                for pair in grid.windows(2) {
                    assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
                }
            }
        }
    }

    #[test]
    fn november_2025_pads_with_october_and_december() {
        let grid = generate_month_grid(ymd(2025, 11, 20), "2025-11-14");

        // Nov 1 2025 is a Saturday, so six October days lead.
        assert_eq!(grid[0].iso_date, "2025-10-26");
        assert!(grid[..6].iter().all(|c| c.date.month() == 10 && !c.is_current_month));
        assert_eq!(grid[6].iso_date, "2025-11-01");
        assert_eq!(grid[35].iso_date, "2025-11-30");
        assert!(grid[6..36].iter().all(|c| c.is_current_month));
        assert_eq!(grid[36].iso_date, "2025-12-01");
        assert_eq!(grid[41].iso_date, "2025-12-06");
        assert!(grid[36..].iter().all(|c| c.date.month() == 12 && !c.is_current_month));

        let today: Vec<_> = grid.iter().filter(|c| c.is_today).collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].date, ymd(2025, 11, 14));
    }

    #[test]
    fn month_starting_on_sunday_has_no_leading_days() {
        // June 2025 starts on a Sunday.
        let grid = generate_month_grid(ymd(2025, 6, 1), "");
        assert_eq!(grid[0].iso_date, "2025-06-01");
        assert!(grid[0].is_current_month);
    }

    #[test]
    fn same_month_of_another_year_is_not_current() {
        let grid = generate_month_grid(ymd(2025, 1, 1), "");
        // Dec 29 2024 .. Dec 31 2024 lead the January grid.
        assert_eq!(grid[0].iso_date, "2024-12-29");
        assert!(!grid[0].is_current_month);
    }

    #[test]
    fn iso_date_of_local_midnight_is_timezone_independent() {
        let midnight = ymd(2025, 11, 1).and_hms_opt(0, 0, 0).unwrap();
        for hours in [-8, 0, 8] {
            let tz = FixedOffset::east_opt(hours * 3600).unwrap();
            let local = tz.from_local_datetime(&midnight).single().unwrap();
            assert_eq!(to_iso_date(&local), "2025-11-01", "offset {hours}");
        }

        // Converting to UTC first is the bug this guards against.
        let east = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = east.from_local_datetime(&midnight).single().unwrap();
        assert_eq!(to_iso_date(&local.with_timezone(&Utc)), "2025-10-31");
    }

    #[test]
    fn weeks_split_grid_into_rows() {
        let grid = generate_month_grid(ymd(2025, 11, 1), "");
        let rows: Vec<_> = weeks(&grid).collect();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.len() == 7 && r[0].date.weekday() == Weekday::Sun));
    }

    #[test]
    fn counts_appointments_per_day() {
        let counts = count_by_day([ymd(2025, 11, 3), ymd(2025, 11, 3), ymd(2025, 11, 5)]);
        assert_eq!(counts.get(&ymd(2025, 11, 3)), Some(&2));
        assert_eq!(counts.get(&ymd(2025, 11, 5)), Some(&1));
        assert_eq!(counts.get(&ymd(2025, 11, 4)), None);
    }

    #[test]
    fn month_navigation_crosses_years() {
        let december = CalendarMonth::new(2025, 12).unwrap();
        assert_eq!(december.next(), CalendarMonth::new(2026, 1).unwrap());
        assert_eq!(december.next().previous(), december);
        assert_eq!(december.title(), "December 2025");
        assert_eq!(CalendarMonth::parse("2025-11"), CalendarMonth::new(2025, 11));
        assert_eq!(CalendarMonth::parse("2025-13"), None);
        assert_eq!(CalendarMonth::new(2025, 0), None);
    }

    #[test]
    fn month_years_stay_four_digits() {
        assert_eq!(CalendarMonth::new(0, 6), None);
        assert_eq!(CalendarMonth::new(10000, 1), None);
        assert_eq!(CalendarMonth::parse("+12345-01"), None);
        assert_eq!(CalendarMonth::parse("-0001-01"), None);

        let last = CalendarMonth::new(9999, 12).unwrap();
        assert_eq!(last.next(), last);
        let first = CalendarMonth::new(1, 1).unwrap();
        assert_eq!(first.previous(), first);

        let grid = first.grid("");
        assert_eq!(grid[0].iso_date, "0000-12-31");
        assert_eq!(last.grid("")[41].iso_date, "10000-01-08");
    }
}
