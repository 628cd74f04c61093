//! JSON adapter for data coming from the backing store.
//!
//! Store payloads are loose: a reference may be a bare id or an embedded
//! object carrying an `id`, activities may be a list, a single value or
//! `null`, and slot fields may use the store's own names (`day`, `number`,
//! `schedule`). Everything is normalized here to the bare-id model.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};
use crate::model::{
    AcademicPeriod, Activity, ActivityId, ScheduleId, SlotContent, SlotId, Subject, SubjectId,
    Teacher, TeacherId, TimeSlot,
};

/// A reference given either as an id or as an object with an `id` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(u64),
    Object { id: u64 },
}

impl Reference {
    pub fn id(self) -> u64 {
        match self {
            Reference::Id(id) | Reference::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Reference>),
    One(Reference),
}

/// A time slot as the store sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(alias = "day")]
    pub date: NaiveDate,
    #[serde(alias = "number")]
    pub slot_number: u8,
    #[serde(alias = "schedule")]
    pub schedule_id: Reference,
    #[serde(alias = "subject_id")]
    pub subject: Reference,
    #[serde(default, alias = "teacher_id")]
    pub teacher: Option<Reference>,
    #[serde(default)]
    activities: Option<OneOrMany>,
}

impl TryFrom<SlotRecord> for TimeSlot {
    type Error = TimetableError;

    fn try_from(record: SlotRecord) -> Result<Self> {
        if record.slot_number == 0 {
            return Err(TimetableError::InvalidSlot(format!(
                "slot number must start at 1 ({})",
                record.date
            )));
        }
        if record.date.weekday() == Weekday::Sun {
            return Err(TimetableError::InvalidSlot(format!(
                "{} is a Sunday",
                record.date
            )));
        }

        let activities = match record.activities {
            None => Vec::new(),
            Some(OneOrMany::One(r)) => vec![r],
            Some(OneOrMany::Many(rs)) => rs,
        };

        Ok(TimeSlot {
            id: record.id.map(SlotId),
            date: record.date,
            slot_number: record.slot_number,
            schedule_id: ScheduleId(record.schedule_id.id()),
            content: SlotContent {
                subject: SubjectId(record.subject.id()),
                teacher: record.teacher.map(|t| TeacherId(t.id())),
                activities: activities.into_iter().map(|a| ActivityId(a.id())).collect(),
            },
        })
    }
}

/// Everything needed to render and edit one period's schedules.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub period: AcademicPeriod,
    pub slots: Vec<TimeSlot>,
    pub subjects: Vec<Subject>,
    pub teachers: Vec<Teacher>,
    pub activities: Vec<Activity>,
}

#[derive(Deserialize)]
struct RawDataset {
    period: AcademicPeriod,
    #[serde(default)]
    slots: Vec<SlotRecord>,
    #[serde(default)]
    subjects: Vec<Subject>,
    #[serde(default)]
    teachers: Vec<Teacher>,
    #[serde(default)]
    activities: Vec<Activity>,
}

/// Parse a JSON array of store slot records.
pub fn parse_slots(json: &str) -> Result<Vec<TimeSlot>> {
    let records: Vec<SlotRecord> = serde_json::from_str(json)?;
    records.into_iter().map(TimeSlot::try_from).collect()
}

pub fn parse_period(json: &str) -> Result<AcademicPeriod> {
    Ok(serde_json::from_str(json)?)
}

pub fn parse_dataset(json: &str) -> Result<Dataset> {
    let raw: RawDataset = serde_json::from_str(json)?;
    let slots = raw
        .slots
        .into_iter()
        .map(TimeSlot::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset {
        period: raw.period,
        slots,
        subjects: raw.subjects,
        teachers: raw.teachers,
        activities: raw.activities,
    })
}
