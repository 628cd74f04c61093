//! Core data model: periods, schedules, time slots and their position keys.
//!
//! All references to other entities are bare ids. Payloads that embed whole
//! objects are normalized by [`crate::wire`] before they reach this model.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, CalendarWeeks};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

id_type!(
    /// Persisted identity of a time slot.
    SlotId
);
id_type!(ScheduleId);
id_type!(PeriodId);
id_type!(CourseId);
id_type!(CareerId);
id_type!(YearId);
id_type!(RoomId);
id_type!(SubjectId);
id_type!(TeacherId);
id_type!(ActivityId);

/// A single date the period marks as unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedDay {
    #[serde(alias = "day")]
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

/// An inclusive date range the period marks as unavailable.
///
/// Only the Monday that starts a calendar week is tested against the range;
/// see [`calendar::build_weeks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedWeekRange {
    #[serde(alias = "start_date")]
    pub start: NaiveDate,
    #[serde(alias = "end_date")]
    pub end: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

impl ExcludedWeekRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// An academic period with its unavailable days and week ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicPeriod {
    pub id: PeriodId,
    #[serde(alias = "course")]
    pub course_id: CourseId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub excluded_days: Vec<ExcludedDay>,
    #[serde(default)]
    pub excluded_weeks: Vec<ExcludedWeekRange>,
}

impl AcademicPeriod {
    /// The calendar weeks rendered for this period.
    pub fn weeks(&self) -> CalendarWeeks {
        calendar::build_weeks(self.start, self.end, &self.excluded_weeks)
    }

    pub fn is_excluded_day(&self, date: NaiveDate) -> bool {
        self.excluded_days.iter().any(|d| d.date == date)
    }
}

/// A timetable for one group of one career year within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub period_id: PeriodId,
    pub career_id: CareerId,
    pub year_id: YearId,
    #[serde(default)]
    pub subject_ids: Vec<SubjectId>,
    pub group: String,
    pub room_id: RoomId,
}

/// The uniqueness key of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub date: NaiveDate,
    pub slot_number: u8,
    pub schedule_id: ScheduleId,
}

impl PositionKey {
    pub fn new(date: NaiveDate, slot_number: u8, schedule_id: ScheduleId) -> Self {
        Self {
            date,
            slot_number,
            schedule_id,
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} slot {} (schedule {})",
            self.date, self.slot_number, self.schedule_id
        )
    }
}

/// What a time slot teaches. Activities form a set, so two contents with
/// the same activities in a different order are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotContent {
    pub subject: SubjectId,
    #[serde(default)]
    pub teacher: Option<TeacherId>,
    #[serde(default)]
    pub activities: BTreeSet<ActivityId>,
}

impl SlotContent {
    pub fn new(subject: SubjectId) -> Self {
        Self {
            subject,
            teacher: None,
            activities: BTreeSet::new(),
        }
    }

    pub fn with_teacher(mut self, teacher: TeacherId) -> Self {
        self.teacher = Some(teacher);
        self
    }

    pub fn with_activities(mut self, activities: impl IntoIterator<Item = ActivityId>) -> Self {
        self.activities = activities.into_iter().collect();
        self
    }
}

/// One scheduled assignment ("shift") in a schedule's grid.
///
/// `id` is `None` until the backing store has created the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(default)]
    pub id: Option<SlotId>,
    pub date: NaiveDate,
    pub slot_number: u8,
    pub schedule_id: ScheduleId,
    #[serde(flatten)]
    pub content: SlotContent,
}

impl TimeSlot {
    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.date, self.slot_number, self.schedule_id)
    }

    /// Whether `self` and `other` are the same slot: equal persisted ids, or
    /// both unsaved and sitting on the same position.
    pub fn same_identity(&self, other: &TimeSlot) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.key() == other.key(),
            _ => false,
        }
    }
}

/// Label data for a subject, used when rendering legends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    #[serde(default)]
    pub symbology: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    #[serde(default)]
    pub symbology: String,
}
