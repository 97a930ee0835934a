//! Slot template and date resolution for the booking flow.
//!
//! The clinic day is a fixed template: 20-minute slots from 09:00 to 11:40
//! and from 13:00 to 16:40. Availability subtracts active bookings (or thins
//! the template at random in demo mode). Sundays are closed, and a doctor's
//! day is considered full at twenty active appointments.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;
use rusqlite::Connection;

use super::intent::turkish_fold;
use crate::config::SlotMode;
use crate::db::repository::{booked_times, count_active_on_day};
use crate::db::DatabaseError;

pub const MORNING_SLOTS: [&str; 9] = [
    "09:00", "09:20", "09:40", "10:00", "10:20", "10:40", "11:00", "11:20", "11:40",
];

pub const AFTERNOON_SLOTS: [&str; 12] = [
    "13:00", "13:20", "13:40", "14:00", "14:20", "14:40", "15:00", "15:20", "15:40", "16:00",
    "16:20", "16:40",
];

/// Active appointments per doctor-day before the day stops being offered.
pub const DAY_CAPACITY: i64 = 20;

/// How far ahead a date may be booked, starting tomorrow.
pub const BOOKING_WINDOW_DAYS: i64 = 14;

/// Fraction of template slots kept in demo mode.
const DEMO_KEEP_PROBABILITY: f64 = 0.7;

pub fn slot_template() -> Vec<String> {
    MORNING_SLOTS
        .iter()
        .chain(AFTERNOON_SLOTS.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Resolves a date keyword in the utterance: "bugün", "yarın", "bu hafta"
/// (day after tomorrow), anything else falls back to tomorrow. Free-text
/// dates are not parsed. A resolved Sunday rolls forward one day.
pub fn resolve_date(utterance: &str, today: NaiveDate) -> NaiveDate {
    let folded = turkish_fold(utterance);
    let candidate = if folded.contains("bugun") {
        today
    } else if folded.contains("yarin") {
        today + Duration::days(1)
    } else if folded.contains("bu hafta") {
        today + Duration::days(2)
    } else {
        today + Duration::days(1)
    };
    skip_sunday(candidate)
}

fn skip_sunday(date: NaiveDate) -> NaiveDate {
    if date.weekday() == Weekday::Sun {
        date + Duration::days(1)
    } else {
        date
    }
}

/// Free slots for a doctor on a date.
pub fn available_times(
    conn: &Connection,
    doctor_id: i64,
    date: NaiveDate,
    mode: SlotMode,
) -> Result<Vec<String>, DatabaseError> {
    let mut slots = slot_template();
    match mode {
        SlotMode::Booked => {
            let booked = booked_times(conn, doctor_id, date)?;
            slots.retain(|slot| !booked.contains(slot));
        }
        SlotMode::Demo => {
            let mut rng = rand::thread_rng();
            slots.retain(|_| rng.gen_bool(DEMO_KEEP_PROBABILITY));
        }
    }
    Ok(slots)
}

/// Bookable dates for a doctor: the next `BOOKING_WINDOW_DAYS` days, skipping
/// Sundays and days already at capacity. Today is never offered.
pub fn available_dates(
    conn: &Connection,
    doctor_id: i64,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, DatabaseError> {
    let mut dates = Vec::new();
    for offset in 1..=BOOKING_WINDOW_DAYS {
        let date = today + Duration::days(offset);
        if date.weekday() == Weekday::Sun {
            continue;
        }
        if count_active_on_day(conn, doctor_id, date)? >= DAY_CAPACITY {
            continue;
        }
        dates.push(date);
    }
    Ok(dates)
}
