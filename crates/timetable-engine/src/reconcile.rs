//! Compute the create/update/delete batch that turns the committed slot set
//! into the working slot set.
//!
//! Both sets are compared position by position:
//!
//! - a committed position missing from the working set is deleted;
//! - a position held by the same id on both sides is updated when its
//!   content (subject, teacher, activity set) differs;
//! - a position whose occupant id changed deletes the old slot and creates
//!   the new one;
//! - a working position missing from the committed set is created.
//!
//! Deletions must reach the backing store before any create or update so a
//! freed position can be reused without tripping its uniqueness constraint.
//! [`crate::persist::save`] issues the phases in that order.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::{PositionKey, ScheduleId, SlotContent, SlotId, TimeSlot};
use crate::store::SlotSet;

/// The persistence phases of a batch, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPhase {
    Delete,
    Create,
    Update,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchPhase::Delete => "delete",
            BatchPhase::Create => "create",
            BatchPhase::Update => "update",
        };
        f.write_str(name)
    }
}

/// Fields sent to the store for a create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPayload {
    pub date: NaiveDate,
    pub slot_number: u8,
    pub schedule_id: ScheduleId,
    #[serde(flatten)]
    pub content: SlotContent,
}

impl SlotPayload {
    pub fn key(&self) -> PositionKey {
        PositionKey::new(self.date, self.slot_number, self.schedule_id)
    }

    pub fn into_slot(self, id: Option<SlotId>) -> TimeSlot {
        TimeSlot {
            id,
            date: self.date,
            slot_number: self.slot_number,
            schedule_id: self.schedule_id,
            content: self.content,
        }
    }
}

impl From<&TimeSlot> for SlotPayload {
    fn from(slot: &TimeSlot) -> Self {
        Self {
            date: slot.date,
            slot_number: slot.slot_number,
            schedule_id: slot.schedule_id,
            content: slot.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub id: SlotId,
    #[serde(flatten)]
    pub payload: SlotPayload,
}

/// The three disjoint operation lists of a save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileBatch {
    pub to_delete: Vec<SlotId>,
    pub to_update: Vec<SlotUpdate>,
    pub to_create: Vec<SlotPayload>,
}

impl ReconcileBatch {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_update.is_empty() && self.to_create.is_empty()
    }

    /// Total number of store calls the batch needs.
    pub fn len(&self) -> usize {
        self.to_delete.len() + self.to_update.len() + self.to_create.len()
    }

    /// Apply the batch to `committed` in memory: deletes, then creates (as
    /// unsaved slots), then updates.
    pub fn apply_to(&self, committed: &SlotSet) -> SlotSet {
        let mut result: BTreeMap<PositionKey, TimeSlot> = committed
            .iter()
            .filter(|slot| !slot.id.is_some_and(|id| self.to_delete.contains(&id)))
            .map(|slot| (slot.key(), slot.clone()))
            .collect();

        for payload in &self.to_create {
            result.insert(payload.key(), payload.clone().into_slot(None));
        }

        for update in &self.to_update {
            result.retain(|_, slot| slot.id != Some(update.id));
            result.insert(
                update.payload.key(),
                update.payload.clone().into_slot(Some(update.id)),
            );
        }

        result.into_values().collect()
    }
}

/// Diff `committed` against `working`.
///
/// Output lists are ordered by position key.
pub fn reconcile(committed: &SlotSet, working: &SlotSet) -> ReconcileBatch {
    let committed_by_key: BTreeMap<PositionKey, &TimeSlot> =
        committed.iter().map(|slot| (slot.key(), slot)).collect();
    let working_by_key: BTreeMap<PositionKey, &TimeSlot> =
        working.iter().map(|slot| (slot.key(), slot)).collect();

    let mut batch = ReconcileBatch::default();

    for (key, original) in &committed_by_key {
        match working_by_key.get(key) {
            None => schedule_delete(&mut batch, original),
            Some(edited) if edited.id == original.id => {
                if edited.content == original.content {
                    continue;
                }
                match original.id {
                    Some(id) => batch.to_update.push(SlotUpdate {
                        id,
                        payload: SlotPayload::from(*edited),
                    }),
                    None => warn!(position = %key, "committed slot has no id, cannot update it"),
                }
            }
            Some(edited) => {
                schedule_delete(&mut batch, original);
                batch.to_create.push(SlotPayload::from(*edited));
            }
        }
    }

    for (key, edited) in &working_by_key {
        if !committed_by_key.contains_key(key) {
            batch.to_create.push(SlotPayload::from(*edited));
        }
    }
    batch.to_create.sort_by_key(SlotPayload::key);

    batch
}

fn schedule_delete(batch: &mut ReconcileBatch, slot: &TimeSlot) {
    match slot.id {
        Some(id) => batch.to_delete.push(id),
        None => warn!(position = %slot.key(), "committed slot has no id, nothing to delete"),
    }
}
