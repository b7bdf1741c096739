//! Appointment-time extraction from free text.
//!
//! Understands a day anchor ("tomorrow", otherwise today) and a single
//! clock token such as `4pm`, `4:30 pm`, `12am` or `16:00`. Anything richer
//! (weekday names, relative offsets, ranges) is not recognised.
//!
//! An hour without `am`/`pm` is taken literally as a 24-hour value, so a
//! bare `4` means 04:00. That is surprising for spoken requests but kept
//! for compatibility with existing callers.

use chrono::{NaiveDateTime, NaiveTime};
use dialtone_types::AppointmentRequest;
use regex::Regex;
use std::sync::OnceLock;

fn time_token() -> &'static Regex {
    static TIME_TOKEN: OnceLock<Regex> = OnceLock::new();
    TIME_TOKEN.get_or_init(|| {
        Regex::new(r"(?:^|\D)(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\b")
            .expect("time token pattern is valid")
    })
}

/// Meridiem marker attached to a clock token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Converts a parsed clock token to a 24-hour time.
///
/// `pm` adds 12 unless the hour is 12; `12am` is midnight; without a
/// marker the hour is used as-is. Out-of-range results yield `None`.
fn to_time(hour: u32, minute: u32, meridiem: Option<Meridiem>) -> Option<NaiveTime> {
    let hour = match meridiem {
        Some(Meridiem::Pm) if hour != 12 => hour + 12,
        Some(Meridiem::Am) if hour == 12 => 0,
        _ => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Extracts an appointment time from `text`, relative to `now`.
///
/// Returns `None` when the text holds no usable clock token. That is an
/// ordinary outcome, not an error. When several tokens appear, the first
/// one that forms a valid time wins.
pub fn extract(text: &str, now: NaiveDateTime) -> Option<AppointmentRequest> {
    let lowered = text.to_lowercase();

    let anchor = if lowered.contains("tomorrow") {
        now.date().succ_opt()?
    } else {
        now.date()
    };

    let time = time_token().captures_iter(&lowered).find_map(|caps| {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        let meridiem = caps.get(3).map(|m| match m.as_str() {
            "am" => Meridiem::Am,
            _ => Meridiem::Pm,
        });
        to_time(hour, minute, meridiem)
    })?;

    Some(AppointmentRequest {
        when: anchor.and_time(time),
        source_text: text.to_string(),
    })
}
