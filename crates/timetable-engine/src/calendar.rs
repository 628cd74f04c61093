//! Build the sequence of teaching weeks rendered for an academic period.
//!
//! Weeks start on the Monday on or before the period start and advance seven
//! days at a time while the week's Monday is not past the period end. A week
//! is skipped when its Monday falls inside an excluded week range; the other
//! days of the week are never consulted.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::ExcludedWeekRange;

/// Number of teaching days rendered per week (Monday to Friday).
pub const WEEKDAYS: usize = 5;

/// A rendered teaching week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWeek {
    /// 1-based position among the rendered (non-excluded) weeks.
    pub number: u32,
    /// Monday of the week.
    pub start: NaiveDate,
    /// Friday of the week.
    pub end: NaiveDate,
}

impl CalendarWeek {
    /// The five weekday dates, Monday first.
    pub fn days(&self) -> [NaiveDate; WEEKDAYS] {
        let mut days = [self.start; WEEKDAYS];
        for (offset, day) in days.iter_mut().enumerate() {
            *day = self
                .start
                .checked_add_days(Days::new(offset as u64))
                .unwrap_or(NaiveDate::MAX);
        }
        days
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Iterator over the rendered weeks of a period.
///
/// The iterator is `Clone`; clone it before consuming to walk the weeks again.
#[derive(Debug, Clone)]
pub struct CalendarWeeks {
    cursor: Option<NaiveDate>,
    end: NaiveDate,
    excluded: Vec<ExcludedWeekRange>,
    next_number: u32,
}

impl Iterator for CalendarWeeks {
    type Item = CalendarWeek;

    fn next(&mut self) -> Option<CalendarWeek> {
        loop {
            let monday = self.cursor?;
            if monday > self.end {
                self.cursor = None;
                return None;
            }
            self.cursor = monday.checked_add_days(Days::new(7));

            if self.excluded.iter().any(|range| range.contains(monday)) {
                continue;
            }

            let number = self.next_number;
            self.next_number += 1;
            return Some(CalendarWeek {
                number,
                start: monday,
                end: monday
                    .checked_add_days(Days::new(WEEKDAYS as u64 - 1))
                    .unwrap_or(NaiveDate::MAX),
            });
        }
    }
}

/// The Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday();
    date.checked_sub_days(Days::new(back as u64)).unwrap_or(date)
}

/// Build the rendered weeks for a period running from `start` to `end`.
///
/// `start > end` yields an empty sequence, as does a period whose every week
/// is excluded.
pub fn build_weeks(
    start: NaiveDate,
    end: NaiveDate,
    excluded: &[ExcludedWeekRange],
) -> CalendarWeeks {
    let cursor = if start > end {
        None
    } else {
        Some(week_start(start))
    };
    CalendarWeeks {
        cursor,
        end,
        excluded: excluded.to_vec(),
        next_number: 1,
    }
}
