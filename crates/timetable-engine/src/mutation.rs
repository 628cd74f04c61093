//! Working-set mutations: drag gestures and explicit cell edits.
//!
//! A drop onto an occupied cell swaps the contents of the two slots; both
//! keep their id and position. A drop onto an empty cell removes the source
//! slot and inserts an unsaved slot with the same content at the target, so
//! a later save deletes the old id and creates a new one.
//!
//! Invalid gestures never fail. They come back as [`DragOutcome::Rejected`]
//! and leave the working set untouched.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ActivityId, PositionKey, SlotContent, SlotId, SubjectId, TeacherId, TimeSlot};
use crate::store::{GridSlotStore, SlotSet};

/// Why a gesture or edit left the working set unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// No edit session is active.
    NotEditing,
    /// The dragged slot is not in the working set.
    UnknownSource,
    /// The slot was dropped back onto its own cell.
    SelfDrop,
    /// The target is not a rendered cell of the grid.
    OutsideGrid,
    /// The edit addresses a cell that holds no slot.
    EmptyCell,
    /// A drop arrived without a drag source or hovered target.
    NoDragInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragOutcome {
    /// Contents of source and target were exchanged.
    Swapped,
    /// The source was recreated, without identity, on the empty target.
    Moved,
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOutcome {
    Created,
    Changed,
    Removed,
    Unchanged,
    Rejected(Rejection),
}

/// In-flight drag gesture: the picked-up cell and the cell last hovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    pub source: Option<PositionKey>,
    pub target: Option<(NaiveDate, u8)>,
}

impl GridSlotStore {
    /// Drop the working slot with persisted id `source` onto a cell.
    pub fn mutate(&mut self, source: SlotId, target_date: NaiveDate, target_slot: u8) -> DragOutcome {
        match self.working().position_of(source) {
            Some(key) => self.mutate_at(key, target_date, target_slot),
            None if !self.is_editing() => reject(Rejection::NotEditing),
            None => reject(Rejection::UnknownSource),
        }
    }

    /// Drop the working slot at `source` onto a cell. Unlike [`mutate`],
    /// this also reaches slots that have not been saved yet.
    ///
    /// [`mutate`]: GridSlotStore::mutate
    pub fn mutate_at(
        &mut self,
        source: PositionKey,
        target_date: NaiveDate,
        target_slot: u8,
    ) -> DragOutcome {
        if !self.is_editing() {
            return reject(Rejection::NotEditing);
        }
        if !self.working().contains_key(&source) {
            return reject(Rejection::UnknownSource);
        }
        let target = self.key(target_date, target_slot);
        if target == source {
            return reject(Rejection::SelfDrop);
        }
        if !self.is_cell(target_date, target_slot) {
            return reject(Rejection::OutsideGrid);
        }

        let working = self.working_mut();
        if working.contains_key(&target) {
            swap_contents(working, &source, &target);
            debug!(from = %source, to = %target, "swapped slot contents");
            DragOutcome::Swapped
        } else {
            let Some(moved) = working.remove(&source) else {
                return reject(Rejection::UnknownSource);
            };
            working.insert(TimeSlot {
                id: None,
                date: target_date,
                slot_number: target_slot,
                schedule_id: moved.schedule_id,
                content: moved.content,
            });
            debug!(from = %source, to = %target, "recreated slot on empty cell");
            DragOutcome::Moved
        }
    }

    /// Pick up the working slot at a cell.
    pub fn start_drag(&mut self, date: NaiveDate, slot_number: u8) -> bool {
        let key = self.key(date, slot_number);
        if !self.is_editing() || !self.working().contains_key(&key) {
            return false;
        }
        self.drag = DragState {
            source: Some(key),
            target: None,
        };
        true
    }

    /// Record the cell currently under the dragged slot.
    pub fn hover(&mut self, date: NaiveDate, slot_number: u8) {
        if self.is_editing() && self.drag.source.is_some() {
            self.drag.target = Some((date, slot_number));
        }
    }

    /// Finish the gesture started by [`start_drag`] on the last hovered cell.
    /// The drag state is cleared whatever the outcome.
    ///
    /// [`start_drag`]: GridSlotStore::start_drag
    pub fn drop_dragged(&mut self) -> DragOutcome {
        let state = std::mem::take(&mut self.drag);
        match (state.source, state.target) {
            (Some(source), Some((date, slot_number))) => self.mutate_at(source, date, slot_number),
            _ => reject(Rejection::NoDragInProgress),
        }
    }

    pub fn cancel_drag(&mut self) {
        self.drag = DragState::default();
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Put `content` on a cell, creating an unsaved slot when the cell is
    /// empty and overwriting the content (keeping the id) otherwise.
    pub fn assign(&mut self, date: NaiveDate, slot_number: u8, content: SlotContent) -> EditOutcome {
        if !self.is_editing() {
            return reject_edit(Rejection::NotEditing);
        }
        if !self.is_cell(date, slot_number) {
            return reject_edit(Rejection::OutsideGrid);
        }
        let key = self.key(date, slot_number);
        let schedule_id = self.schedule_id();
        let working = self.working_mut();
        match working.get_mut(&key) {
            Some(slot) if slot.content == content => EditOutcome::Unchanged,
            Some(slot) => {
                slot.content = content;
                EditOutcome::Changed
            }
            None => {
                working.insert(TimeSlot {
                    id: None,
                    date,
                    slot_number,
                    schedule_id,
                    content,
                });
                EditOutcome::Created
            }
        }
    }

    pub fn set_subject(&mut self, date: NaiveDate, slot_number: u8, subject: SubjectId) -> EditOutcome {
        self.edit_content(date, slot_number, |content| content.subject = subject)
    }

    pub fn set_teacher(
        &mut self,
        date: NaiveDate,
        slot_number: u8,
        teacher: Option<TeacherId>,
    ) -> EditOutcome {
        self.edit_content(date, slot_number, |content| content.teacher = teacher)
    }

    pub fn set_activities(
        &mut self,
        date: NaiveDate,
        slot_number: u8,
        activities: BTreeSet<ActivityId>,
    ) -> EditOutcome {
        self.edit_content(date, slot_number, |content| content.activities = activities)
    }

    /// Remove the working slot at a cell.
    pub fn clear(&mut self, date: NaiveDate, slot_number: u8) -> EditOutcome {
        if !self.is_editing() {
            return reject_edit(Rejection::NotEditing);
        }
        let key = self.key(date, slot_number);
        if !self.working().contains_key(&key) {
            return reject_edit(Rejection::EmptyCell);
        }
        self.working_mut().remove(&key);
        EditOutcome::Removed
    }

    fn edit_content(
        &mut self,
        date: NaiveDate,
        slot_number: u8,
        edit: impl FnOnce(&mut SlotContent),
    ) -> EditOutcome {
        if !self.is_editing() {
            return reject_edit(Rejection::NotEditing);
        }
        let key = self.key(date, slot_number);
        let Some(current) = self.working().get(&key) else {
            return reject_edit(Rejection::EmptyCell);
        };

        let mut content = current.content.clone();
        edit(&mut content);
        if content == current.content {
            return EditOutcome::Unchanged;
        }
        if let Some(slot) = self.working_mut().get_mut(&key) {
            slot.content = content;
        }
        EditOutcome::Changed
    }
}

fn swap_contents(working: &mut SlotSet, a: &PositionKey, b: &PositionKey) {
    let Some(content_a) = working.get(a).map(|slot| slot.content.clone()) else {
        return;
    };
    let Some(slot_b) = working.get_mut(b) else {
        return;
    };
    let content_b = std::mem::replace(&mut slot_b.content, content_a);
    if let Some(slot_a) = working.get_mut(a) {
        slot_a.content = content_b;
    }
}

fn reject(reason: Rejection) -> DragOutcome {
    debug!(?reason, "drag rejected");
    DragOutcome::Rejected(reason)
}

fn reject_edit(reason: Rejection) -> EditOutcome {
    debug!(?reason, "edit rejected");
    EditOutcome::Rejected(reason)
}
