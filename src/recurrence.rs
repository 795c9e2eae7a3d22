//! Occurrence dates for recurring activities.
//!
//! A series starts on the head's own date; every later occurrence is the
//! head date advanced by a whole number of steps. Steps are always taken
//! from the head date rather than from the previous occurrence, so a
//! monthly series on the 31st clamps to the end of short months without
//! drifting (Jan 31, Feb 29, Mar 31, ...).
//!
//! The anchor is whatever record currently heads the series. When a head
//! is deleted and an instance is promoted, the promoted date becomes the
//! anchor for any later extension: a monthly series promoted onto Feb 29
//! extends to Mar 29, Apr 29, ... while existing occurrences keep their dates.

use chrono::{Days, Months, NaiveDate};

use crate::error::{RosterError, RosterResult};
use crate::model::{Recurrence, RecurrenceRule};

/// Upper bound on the occurrences of one series, head included.
pub const MAX_OCCURRENCES: usize = 520;

/// The date of occurrence `step` (0 is the head itself). `None` if the
/// date falls outside chrono's range.
pub fn advance(start: NaiveDate, rule: RecurrenceRule, step: u32) -> Option<NaiveDate> {
    match rule {
        RecurrenceRule::Weekly => start.checked_add_days(Days::new(7 * u64::from(step))),
        RecurrenceRule::Biweekly => start.checked_add_days(Days::new(14 * u64::from(step))),
        // chrono clamps to the last day of the target month.
        RecurrenceRule::Monthly => start.checked_add_months(Months::new(step)),
    }
}

/// Dates of the generated instances of a series starting on `start`:
/// every occurrence strictly after `start` up to and including
/// `recurrence.until`.
pub fn instance_dates(start: NaiveDate, recurrence: Recurrence) -> RosterResult<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    let mut step = 1u32;

    while let Some(next) = advance(start, recurrence.rule, step) {
        if next > recurrence.until {
            break;
        }
        // +1 for the head occurrence.
        if dates.len() + 1 >= MAX_OCCURRENCES {
            return Err(RosterError::InvalidState(format!(
                "series starting {} would exceed {} occurrences",
                start, MAX_OCCURRENCES
            )));
        }
        dates.push(next);
        step += 1;
    }

    Ok(dates)
}
