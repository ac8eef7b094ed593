//! Text formatting for the face labels.

use core::fmt::Write as _;

use heapless::String;
use time::{Date, Month, PrimitiveDateTime, Weekday};

use crate::settings::{DateStyle, TimeStyle};

/// `HH:MM`. 12-hour style maps 0 to 12 and keeps the zero padding, without
/// an am/pm suffix.
pub fn time_text(time: &PrimitiveDateTime, style: TimeStyle) -> String<8> {
    let hour = match style {
        TimeStyle::H24 => time.hour(),
        TimeStyle::H12 => {
            let hour = time.hour() % 12;
            if hour == 0 {
                12
            } else {
                hour
            }
        }
    };
    let mut out = String::new();
    write!(out, "{:02}:{:02}", hour, time.minute()).unwrap();
    out
}

/// `28 August` or `August 28`, depending on the configured ordering.
pub fn date_text(date: Date, style: DateStyle) -> String<16> {
    let mut out = String::new();
    match style {
        DateStyle::DayMonth => write!(out, "{:02} {}", date.day(), month_name(date.month())),
        DateStyle::MonthDay => write!(out, "{} {:02}", month_name(date.month()), date.day()),
    }
    .unwrap();
    out
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

pub fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

/// `7h30m`
pub fn sleep_text(minutes: u16) -> String<8> {
    let mut out = String::new();
    write!(out, "{}h{:02}m", minutes / 60, minutes % 60).unwrap();
    out
}

/// `60 bpm`
pub fn heart_text(bpm: u8) -> String<8> {
    let mut out = String::new();
    write!(out, "{} bpm", bpm).unwrap();
    out
}

/// `8000 steps`. Sized for the widest `u32`.
pub fn steps_text(steps: u32) -> String<16> {
    let mut out = String::new();
    write!(out, "{} steps", steps).unwrap();
    out
}

/// `78%`
pub fn battery_text(percent: u8) -> String<5> {
    let mut out = String::new();
    write!(out, "{}%", percent).unwrap();
    out
}

/// True when two instants render identically on the face, which shows
/// nothing finer than the minute. A clock sync can move the hour or the
/// date without touching the minute-of-hour, so all three are compared.
pub fn same_face_minute(a: PrimitiveDateTime, b: PrimitiveDateTime) -> bool {
    a.date() == b.date() && a.hour() == b.hour() && a.minute() == b.minute()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn time_24h() {
        assert_eq!(time_text(&datetime!(2026-08-28 13:05), TimeStyle::H24), "13:05");
        assert_eq!(time_text(&datetime!(2026-08-28 00:07), TimeStyle::H24), "00:07");
        assert_eq!(time_text(&datetime!(2026-08-28 12:00), TimeStyle::H24), "12:00");
    }

    #[test]
    fn time_12h_wraps_and_pads() {
        assert_eq!(time_text(&datetime!(2026-08-28 13:05), TimeStyle::H12), "01:05");
        // Midnight is 12, not 0.
        assert_eq!(time_text(&datetime!(2026-08-28 00:07), TimeStyle::H12), "12:07");
        assert_eq!(time_text(&datetime!(2026-08-28 12:00), TimeStyle::H12), "12:00");
        assert_eq!(time_text(&datetime!(2026-08-28 09:59), TimeStyle::H12), "09:59");
    }

    #[test]
    fn date_orders() {
        let date = datetime!(2026-08-05 00:00).date();
        assert_eq!(date_text(date, DateStyle::DayMonth), "05 August");
        assert_eq!(date_text(date, DateStyle::MonthDay), "August 05");
    }

    #[test]
    fn longest_date_fits() {
        let date = datetime!(2026-09-30 00:00).date();
        assert_eq!(date_text(date, DateStyle::DayMonth), "30 September");
    }

    #[test]
    fn weekday_names_are_full() {
        assert_eq!(weekday_name(datetime!(2026-08-28 00:00).weekday()), "Friday");
        assert_eq!(weekday_name(Weekday::Sunday), "Sunday");
    }

    #[test]
    fn face_minute_tracks_date_and_hour() {
        let base = datetime!(2026-08-28 14:05:10);
        assert!(same_face_minute(base, datetime!(2026-08-28 14:05:59)));
        assert!(!same_face_minute(base, datetime!(2026-08-28 14:06:10)));
        // Same minute-of-hour, different hour or date.
        assert!(!same_face_minute(base, datetime!(2026-08-28 15:05:10)));
        assert!(!same_face_minute(base, datetime!(2026-08-29 14:05:10)));
    }

    #[test]
    fn metric_labels() {
        assert_eq!(sleep_text(450), "7h30m");
        assert_eq!(sleep_text(61), "1h01m");
        assert_eq!(heart_text(60), "60 bpm");
        assert_eq!(steps_text(8000), "8000 steps");
        assert_eq!(steps_text(u32::MAX), "4294967295 steps");
        assert_eq!(battery_text(100), "100%");
    }
}
