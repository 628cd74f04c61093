//! Committed and working slot collections for one schedule's grid.
//!
//! The committed set is an immutable [`Arc`] snapshot replaced wholesale by
//! [`GridSlotStore::load`]. The working set starts as the same `Arc` and is
//! copied on the first write of an edit session, so the two never share a
//! mutable reference.

use std::collections::hash_map::{self, HashMap};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::calendar::CalendarWeek;
use crate::config::GridSettings;
use crate::model::{AcademicPeriod, PositionKey, ScheduleId, SlotContent, SlotId, TimeSlot};
use crate::mutation::DragState;
use crate::reconcile::{self, ReconcileBatch};

/// Time slots keyed by position. Holding a slot at a key replaces whatever
/// sat there, so a set can never hold two slots for one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotSet {
    slots: HashMap<PositionKey, TimeSlot>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: &PositionKey) -> Option<&TimeSlot> {
        self.slots.get(key)
    }

    pub fn get_mut(&mut self, key: &PositionKey) -> Option<&mut TimeSlot> {
        self.slots.get_mut(key)
    }

    pub fn contains_key(&self, key: &PositionKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Place `slot` at its own key, returning the slot it displaced.
    pub fn insert(&mut self, slot: TimeSlot) -> Option<TimeSlot> {
        self.slots.insert(slot.key(), slot)
    }

    pub fn remove(&mut self, key: &PositionKey) -> Option<TimeSlot> {
        self.slots.remove(key)
    }

    /// Position of the slot carrying persisted id `id`.
    pub fn position_of(&self, id: SlotId) -> Option<PositionKey> {
        self.slots
            .values()
            .find(|slot| slot.id == Some(id))
            .map(TimeSlot::key)
    }

    pub fn iter(&self) -> hash_map::Values<'_, PositionKey, TimeSlot> {
        self.slots.values()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, PositionKey, TimeSlot> {
        self.slots.keys()
    }

    /// All slots ordered by position key.
    pub fn to_sorted_vec(&self) -> Vec<TimeSlot> {
        let mut slots: Vec<TimeSlot> = self.slots.values().cloned().collect();
        slots.sort_by_key(TimeSlot::key);
        slots
    }

    /// Content at every position, ignoring slot identity.
    pub fn contents(&self) -> BTreeMap<PositionKey, SlotContent> {
        self.slots
            .iter()
            .map(|(key, slot)| (*key, slot.content.clone()))
            .collect()
    }

    pub fn max_slot_number(&self) -> Option<u8> {
        self.slots.keys().map(|k| k.slot_number).max()
    }

    pub fn has_slots_on(&self, date: NaiveDate) -> bool {
        self.slots.keys().any(|k| k.date == date)
    }
}

impl FromIterator<TimeSlot> for SlotSet {
    fn from_iter<I: IntoIterator<Item = TimeSlot>>(iter: I) -> Self {
        let mut set = SlotSet::new();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SlotSet {
    type Item = &'a TimeSlot;
    type IntoIter = hash_map::Values<'a, PositionKey, TimeSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.values()
    }
}

/// The committed baseline and working copy of one schedule's grid, plus the
/// calendar the grid is laid out on.
#[derive(Debug, Clone)]
pub struct GridSlotStore {
    schedule_id: ScheduleId,
    settings: GridSettings,
    weeks: Vec<CalendarWeek>,
    teaching_days: BTreeSet<NaiveDate>,
    excluded_days: BTreeSet<NaiveDate>,
    committed: Arc<SlotSet>,
    working: Arc<SlotSet>,
    editing: bool,
    pub(crate) drag: DragState,
}

impl GridSlotStore {
    /// An empty store for `schedule_id`, laid out on the weeks of `period`.
    pub fn new(schedule_id: ScheduleId, period: &AcademicPeriod, settings: GridSettings) -> Self {
        let weeks: Vec<CalendarWeek> = period.weeks().collect();
        let teaching_days = weeks.iter().flat_map(|w| w.days()).collect();
        let excluded_days = period.excluded_days.iter().map(|d| d.date).collect();
        let empty = Arc::new(SlotSet::new());

        Self {
            schedule_id,
            settings,
            weeks,
            teaching_days,
            excluded_days,
            committed: Arc::clone(&empty),
            working: empty,
            editing: false,
            drag: DragState::default(),
        }
    }

    pub fn schedule_id(&self) -> ScheduleId {
        self.schedule_id
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn weeks(&self) -> &[CalendarWeek] {
        &self.weeks
    }

    /// Replace both collections with `slots`, ending any edit session.
    ///
    /// Used for the initial fetch and to re-baseline after a save. Slots that
    /// belong to another schedule are dropped.
    pub fn load(&mut self, slots: impl IntoIterator<Item = TimeSlot>) {
        let mut set = SlotSet::new();
        for slot in slots {
            if slot.schedule_id != self.schedule_id {
                warn!(
                    schedule = %self.schedule_id,
                    foreign = %slot.schedule_id,
                    "ignoring time slot of another schedule"
                );
                continue;
            }
            if let Some(previous) = set.insert(slot) {
                warn!(position = %previous.key(), "duplicate time slot position, keeping the last one");
            }
        }

        info!(schedule = %self.schedule_id, slots = set.len(), "loaded committed time slots");
        self.committed = Arc::new(set);
        self.working = Arc::clone(&self.committed);
        self.editing = false;
        self.drag = DragState::default();
    }

    /// Start an edit session on a fresh copy of the committed set.
    pub fn begin_edit(&mut self) {
        debug!(schedule = %self.schedule_id, "edit session started");
        self.working = Arc::clone(&self.committed);
        self.editing = true;
        self.drag = DragState::default();
    }

    /// Discard the working set and leave edit mode.
    pub fn cancel_edit(&mut self) {
        debug!(schedule = %self.schedule_id, "edit session cancelled");
        self.working = Arc::clone(&self.committed);
        self.editing = false;
        self.drag = DragState::default();
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn committed(&self) -> &SlotSet {
        &self.committed
    }

    /// A shared handle on the committed snapshot.
    pub fn committed_snapshot(&self) -> Arc<SlotSet> {
        Arc::clone(&self.committed)
    }

    pub fn working(&self) -> &SlotSet {
        &self.working
    }

    pub(crate) fn working_mut(&mut self) -> &mut SlotSet {
        Arc::make_mut(&mut self.working)
    }

    /// The working slot at a cell of this schedule.
    pub fn lookup(&self, date: NaiveDate, slot_number: u8) -> Option<&TimeSlot> {
        self.working.get(&self.key(date, slot_number))
    }

    pub(crate) fn key(&self, date: NaiveDate, slot_number: u8) -> PositionKey {
        PositionKey::new(date, slot_number, self.schedule_id)
    }

    /// Grid width K: the highest committed slot number, capped by the
    /// settings and never below 1.
    pub fn width(&self) -> u8 {
        self.committed
            .max_slot_number()
            .unwrap_or(1)
            .min(self.settings.max_slots_per_day)
            .max(1)
    }

    /// A day renders without cells when it is an excluded day and the
    /// committed set has nothing on it.
    pub fn is_free_day(&self, date: NaiveDate) -> bool {
        self.excluded_days.contains(&date) && !self.committed.has_slots_on(date)
    }

    /// Whether `(date, slot_number)` is a rendered, droppable cell.
    pub fn is_cell(&self, date: NaiveDate, slot_number: u8) -> bool {
        (1..=self.width()).contains(&slot_number)
            && self.teaching_days.contains(&date)
            && !self.is_free_day(date)
    }

    /// The batch that would turn the committed set into the working set.
    pub fn pending_batch(&self) -> ReconcileBatch {
        reconcile::reconcile(&self.committed, &self.working)
    }

    pub fn has_changes(&self) -> bool {
        !self.pending_batch().is_empty()
    }
}
