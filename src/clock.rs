use log::debug;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

static TWELVE_HOUR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*([AaPp][Mm])\s*$").expect("valid 12-hour regex")
});

static TWENTY_FOUR_HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*$").expect("valid 24-hour regex"));

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(hours?|hrs?|minutes?|mins?|days?)\b").expect("valid duration regex")
});

/// `"01:30 PM"` -> `Some(810)`. Returns `None` for anything that is not a
/// 12-hour clock time; callers show the raw string instead.
pub fn parse_clock_time(time: &str) -> Option<u32> {
    let caps = TWELVE_HOUR_RE.captures(time)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }

    let is_pm = caps[3].eq_ignore_ascii_case("pm");
    let hour24 = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Some(hour24 * 60 + minute)
}

/// Minutes since midnight -> `"hh:mm AM"`. Values past a day wrap around.
pub fn format_clock_time(minutes: u32) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hour24 = minutes / 60;
    let period = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{:02}:{:02} {}", hour12, minutes % 60, period)
}

/// `"01:30 PM"` -> `"13:30"`
pub fn to_twenty_four_hour(time: &str) -> Option<String> {
    let minutes = parse_clock_time(time)?;
    Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}

/// `"13:30"` -> `"01:30 PM"`
pub fn from_twenty_four_hour(time: &str) -> Option<String> {
    let caps = TWENTY_FOUR_HOUR_RE.captures(time)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format_clock_time(hour * 60 + minute))
}

/// Reads durations such as `"2 hours"`, `"45 min"` or `"1 day"`.
/// Text without a recognizable amount counts as zero.
pub fn parse_duration_to_minutes(text: &str) -> u32 {
    let Some(caps) = DURATION_RE.captures(text) else {
        if !text.trim().is_empty() {
            debug!("Unrecognized duration '{}', treating as 0 minutes", text);
        }
        return 0;
    };
    let amount: f64 = caps[1].parse().unwrap_or(0.0);
    let unit = caps[2].to_ascii_lowercase();

    let factor = if unit.starts_with('h') {
        60.0
    } else if unit.starts_with('d') {
        f64::from(MINUTES_PER_DAY)
    } else {
        1.0
    };
    let minutes = (amount * factor).round();
    if !minutes.is_finite() || minutes > f64::from(u32::MAX) {
        debug!("Duration '{}' is out of range, treating as 0 minutes", text);
        return 0;
    }
    minutes as u32
}

/// Clock position `minutes` after `start`; whole days drop out.
fn end_of(start: u32, minutes: u32) -> u32 {
    (start % MINUTES_PER_DAY + minutes % MINUTES_PER_DAY) % MINUTES_PER_DAY
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct AppointmentTimeRange {
    pub start_time: String,
    pub end_time: String,
}

impl AppointmentTimeRange {
    /// Both ends normalized to `hh:mm AM/PM`; `None` if the start time
    /// cannot be read.
    pub fn compute(start_time: &str, duration: &str) -> Option<Self> {
        let start = parse_clock_time(start_time)?;
        let end = end_of(start, parse_duration_to_minutes(duration));
        Some(AppointmentTimeRange {
            start_time: format_clock_time(start),
            end_time: format_clock_time(end),
        })
    }
}

/// `("09:00 AM", "1 hour")` -> `"09:00 AM - 10:00 AM"`.
///
/// With no usable duration, or a start time that does not parse, the start
/// time comes back as given.
pub fn format_range(start_time: &str, duration: &str) -> String {
    let minutes = parse_duration_to_minutes(duration);
    if minutes == 0 {
        return start_time.to_string();
    }
    match parse_clock_time(start_time) {
        Some(start) => format!("{} - {}", start_time, format_clock_time(end_of(start, minutes))),
        None => {
            debug!("Cannot parse start time '{}', showing it as-is", start_time);
            start_time.to_string()
        }
    }
}
