//! Detect teachers booked into two slots at the same date and slot number.
//!
//! The scan covers every schedule, not only the one being edited. Results are
//! advisory: nothing in the engine refuses a swap, move or save because of a
//! conflict.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{ScheduleId, TeacherId, TimeSlot};
use crate::store::SlotSet;

/// Whether another slot in `all_slots` books `slot`'s teacher into the same
/// date and slot number. Slots without a teacher never conflict.
pub fn has_conflict(slot: &TimeSlot, all_slots: &[TimeSlot]) -> bool {
    let Some(teacher) = slot.content.teacher else {
        return false;
    };
    all_slots.iter().any(|other| {
        !other.same_identity(slot)
            && other.content.teacher == Some(teacher)
            && other.date == slot.date
            && other.slot_number == slot.slot_number
    })
}

/// One double-booked teacher cell and every slot involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherConflict {
    pub teacher: TeacherId,
    pub date: NaiveDate,
    pub slot_number: u8,
    pub slots: Vec<TimeSlot>,
}

type TeacherCell = (NaiveDate, u8, TeacherId);

/// Read-only index of slots across all schedules, bucketed by teacher cell.
#[derive(Debug, Clone, Default)]
pub struct SlotIndex {
    slots: Vec<TimeSlot>,
    by_cell: HashMap<TeacherCell, Vec<usize>>,
}

impl SlotIndex {
    pub fn new(slots: impl IntoIterator<Item = TimeSlot>) -> Self {
        let slots: Vec<TimeSlot> = slots.into_iter().collect();
        let mut by_cell: HashMap<TeacherCell, Vec<usize>> = HashMap::new();
        for (idx, slot) in slots.iter().enumerate() {
            if let Some(teacher) = slot.content.teacher {
                by_cell
                    .entry((slot.date, slot.slot_number, teacher))
                    .or_default()
                    .push(idx);
            }
        }
        Self { slots, by_cell }
    }

    /// This index with `schedule_id`'s slots replaced by `working`, so the
    /// schedule under edit is judged by its unsaved state.
    pub fn with_schedule_replaced(&self, schedule_id: ScheduleId, working: &SlotSet) -> Self {
        let others = self
            .slots
            .iter()
            .filter(|slot| slot.schedule_id != schedule_id)
            .cloned();
        Self::new(others.chain(working.iter().cloned()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_conflict(&self, slot: &TimeSlot) -> bool {
        let Some(teacher) = slot.content.teacher else {
            return false;
        };
        self.by_cell
            .get(&(slot.date, slot.slot_number, teacher))
            .is_some_and(|bucket| {
                bucket
                    .iter()
                    .any(|&idx| !self.slots[idx].same_identity(slot))
            })
    }

    /// Every double-booked teacher cell, ordered by date, slot and teacher.
    pub fn conflicts(&self) -> Vec<TeacherConflict> {
        let mut found: Vec<TeacherConflict> = self
            .by_cell
            .iter()
            .filter(|(_, bucket)| {
                let first = &self.slots[bucket[0]];
                bucket.iter().any(|&idx| !self.slots[idx].same_identity(first))
            })
            .map(|(&(date, slot_number, teacher), bucket)| {
                let mut slots: Vec<TimeSlot> =
                    bucket.iter().map(|&idx| self.slots[idx].clone()).collect();
                slots.sort_by_key(TimeSlot::key);
                TeacherConflict {
                    teacher,
                    date,
                    slot_number,
                    slots,
                }
            })
            .collect();
        found.sort_by_key(|c| (c.date, c.slot_number, c.teacher));
        found
    }
}
