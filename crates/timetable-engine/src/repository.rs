//! Collaborator interfaces for the backing store and reference lookups, plus
//! in-memory implementations of both.

use std::collections::{BTreeMap, HashMap};

use crate::error::RepositoryError;
use crate::model::{
    AcademicPeriod, Activity, ActivityId, PeriodId, PositionKey, ScheduleId, SlotId, Subject,
    SubjectId, Teacher, TeacherId, TimeSlot,
};
use crate::reconcile::SlotPayload;

/// The backing store holding periods and time slots.
pub trait TimetableRepository {
    fn period(&self, id: PeriodId) -> Result<AcademicPeriod, RepositoryError>;

    fn slots_for_schedule(&self, schedule_id: ScheduleId) -> Result<Vec<TimeSlot>, RepositoryError>;

    /// Slots of every schedule, for conflict detection.
    fn all_slots(&self) -> Result<Vec<TimeSlot>, RepositoryError>;

    /// Persist a new slot and return it with its assigned id.
    fn create_slot(&mut self, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError>;

    fn update_slot(&mut self, id: SlotId, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError>;

    fn delete_slot(&mut self, id: SlotId) -> Result<(), RepositoryError>;
}

/// Read-only label lookups for reference entities.
pub trait ReferenceCatalog {
    fn subject(&self, id: SubjectId) -> Option<&Subject>;
    fn teacher(&self, id: TeacherId) -> Option<&Teacher>;
    fn activity(&self, id: ActivityId) -> Option<&Activity>;
}

/// Reference data fetched once for an editing session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    subjects: HashMap<SubjectId, Subject>,
    teachers: HashMap<TeacherId, Teacher>,
    activities: HashMap<ActivityId, Activity>,
}

impl Catalog {
    pub fn new(
        subjects: impl IntoIterator<Item = Subject>,
        teachers: impl IntoIterator<Item = Teacher>,
        activities: impl IntoIterator<Item = Activity>,
    ) -> Self {
        Self {
            subjects: subjects.into_iter().map(|s| (s.id, s)).collect(),
            teachers: teachers.into_iter().map(|t| (t.id, t)).collect(),
            activities: activities.into_iter().map(|a| (a.id, a)).collect(),
        }
    }
}

impl ReferenceCatalog for Catalog {
    fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    fn teacher(&self, id: TeacherId) -> Option<&Teacher> {
        self.teachers.get(&id)
    }

    fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.get(&id)
    }
}

/// In-memory store enforcing one slot per position and assigning
/// sequential ids on create.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    periods: BTreeMap<PeriodId, AcademicPeriod>,
    slots: BTreeMap<SlotId, TimeSlot>,
    next_id: u64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store. Slots without an id receive one.
    pub fn with_data(
        periods: impl IntoIterator<Item = AcademicPeriod>,
        slots: impl IntoIterator<Item = TimeSlot>,
    ) -> Self {
        let mut repo = Self::new();
        for period in periods {
            repo.periods.insert(period.id, period);
        }
        let slots: Vec<TimeSlot> = slots.into_iter().collect();
        repo.next_id = slots
            .iter()
            .filter_map(|s| s.id.map(|id| id.0))
            .max()
            .unwrap_or(0);
        for mut slot in slots {
            let id = match slot.id {
                Some(id) => id,
                None => repo.allocate_id(),
            };
            slot.id = Some(id);
            repo.slots.insert(id, slot);
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, id: SlotId) -> Option<&TimeSlot> {
        self.slots.get(&id)
    }

    fn allocate_id(&mut self) -> SlotId {
        self.next_id += 1;
        SlotId(self.next_id)
    }

    fn occupant(&self, key: PositionKey) -> Option<SlotId> {
        self.slots
            .values()
            .find(|slot| slot.key() == key)
            .and_then(|slot| slot.id)
    }
}

impl TimetableRepository for MemoryRepository {
    fn period(&self, id: PeriodId) -> Result<AcademicPeriod, RepositoryError> {
        self.periods
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::PeriodNotFound(id.0))
    }

    fn slots_for_schedule(&self, schedule_id: ScheduleId) -> Result<Vec<TimeSlot>, RepositoryError> {
        Ok(self
            .slots
            .values()
            .filter(|slot| slot.schedule_id == schedule_id)
            .cloned()
            .collect())
    }

    fn all_slots(&self) -> Result<Vec<TimeSlot>, RepositoryError> {
        Ok(self.slots.values().cloned().collect())
    }

    fn create_slot(&mut self, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError> {
        if self.occupant(payload.key()).is_some() {
            return Err(RepositoryError::PositionTaken(payload.key().to_string()));
        }
        let id = self.allocate_id();
        let slot = payload.clone().into_slot(Some(id));
        self.slots.insert(id, slot.clone());
        Ok(slot)
    }

    fn update_slot(&mut self, id: SlotId, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError> {
        if !self.slots.contains_key(&id) {
            return Err(RepositoryError::SlotNotFound(id));
        }
        if self.occupant(payload.key()).is_some_and(|other| other != id) {
            return Err(RepositoryError::PositionTaken(payload.key().to_string()));
        }
        let slot = payload.clone().into_slot(Some(id));
        self.slots.insert(id, slot.clone());
        Ok(slot)
    }

    fn delete_slot(&mut self, id: SlotId) -> Result<(), RepositoryError> {
        self.slots
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::SlotNotFound(id))
    }
}
