//! Rendering helpers for [`TimeData`].
//!
//! `local_timestamp` is already shifted into the location's zone, so it is
//! interpreted here as a naive wall-clock value and never converted again.

use chrono::{DateTime, Datelike, NaiveDateTime, Weekday};

use crate::types::TimeData;

/// Long ("Sunday") or short ("Sun") weekday names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayNameStyle {
    #[default]
    Long,
    Short,
}

impl TimeData {
    /// Wall-clock date and time at the location.
    ///
    /// Returns `None` only for timestamps outside chrono's representable range.
    pub fn local_datetime(&self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.local_timestamp, 0).map(|dt| dt.naive_utc())
    }

    pub fn day_name(&self, style: DayNameStyle) -> Option<&'static str> {
        let weekday = self.local_datetime()?.weekday();
        let long = match weekday {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
            Weekday::Sat => "Saturday",
            Weekday::Sun => "Sunday",
        };
        Some(match style {
            DayNameStyle::Long => long,
            DayNameStyle::Short => &long[..3],
        })
    }

    /// 12-hour clock time such as `"3:45 am"`
    pub fn formatted_time(&self) -> Option<String> {
        self.local_datetime()
            .map(|dt| dt.format("%-I:%M %P").to_string())
    }
}
