use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Date formats accepted from the table, tried in order. Day comes before
/// month whenever the two could be confused.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d-%b-%Y",
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a date cell day-first. Returns `None` (the missing-date marker)
/// for anything unrecognizable.
pub fn parse_day_first(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            // "%Y" happily reads "24" as the year 24; leave those to "%y"
            if format.contains("%Y") && date.year() < 1000 {
                continue;
            }
            return Some(date);
        }
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .map(|dt| dt.date())
}

/// Render a date the way stores persist it: ISO, or empty when missing.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Month label used to group rows, e.g. "January 2024".
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}
