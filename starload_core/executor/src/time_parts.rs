use chrono::{Datelike, NaiveDateTime, Timelike};

/// Calendar fields of a `dim_time` row, computed locally.
///
/// Matches the warehouse `EXTRACT` semantics: `week` is the ISO week and
/// `weekday` counts from Sunday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeParts {
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: u32,
}

impl TimeParts {
    pub fn from_timestamp(ts: NaiveDateTime) -> Self {
        Self {
            hour: ts.hour(),
            day: ts.day(),
            week: ts.iso_week().week(),
            month: ts.month(),
            year: ts.year(),
            weekday: ts.weekday().num_days_from_sunday(),
        }
    }

    /// Parse a timestamp as the warehouse prints it, with or without
    /// fractional seconds.
    pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()
    }

    /// Fields in `dim_time` column order after `start_time`.
    pub fn as_row(&self) -> [i64; 6] {
        [
            i64::from(self.hour),
            i64::from(self.day),
            i64::from(self.week),
            i64::from(self.month),
            i64::from(self.year),
            i64::from(self.weekday),
        ]
    }
}
