//! Daily activity streaks and the calendar clock.
//!
//! A streak counts consecutive calendar days with at least one completed
//! challenge. Dates carry no time component and are taken in UTC.

use chrono::{NaiveDate, Utc};

/// Source of "today" for streak bookkeeping.
pub trait Clock: Send + Sync {
    /// The current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock, UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// What happened to the streak on an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// First activity ever.
    Started,
    /// Activity on the day after the last one.
    Incremented(u32),
    /// A day or more was missed.
    Reset,
    /// Another activity on the same day.
    Unchanged,
}

/// Computes the streak after an activity on `today`.
///
/// A `last_activity` in the future (clock moved backwards) counts as a gap.
#[must_use]
pub fn advance_streak(
    streak: u32,
    last_activity: Option<NaiveDate>,
    today: NaiveDate,
) -> (u32, StreakChange) {
    let yesterday = today.pred_opt();

    match last_activity {
        Some(last) if Some(last) == yesterday => {
            let next = streak.saturating_add(1);
            (next, StreakChange::Incremented(next))
        }
        Some(last) if last == today => (streak, StreakChange::Unchanged),
        Some(_) => (1, StreakChange::Reset),
        None => (1, StreakChange::Started),
    }
}
