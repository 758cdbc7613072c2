//! Small shared helpers.
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

/// Save stamp in `YYYY-MM-DD HH:MM:SS.cc +HHMM` form (hundredths of a second).
pub fn format_saved_stamp<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let centis = dt.timestamp_subsec_millis().min(999) / 10;
    format!(
        "{}.{centis:02} {}",
        dt.format("%Y-%m-%d %H:%M:%S"),
        dt.format("%z")
    )
}

/// [`format_saved_stamp`] for the current local time.
pub fn saved_stamp_now() -> String {
    format_saved_stamp(&Local::now())
}
