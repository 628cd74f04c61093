//! Tests for writing reconciled batches to a repository and re-baselining.

use chrono::NaiveDate;
use timetable_engine::model::{CourseId, PeriodId, SubjectId, TeacherId};
use timetable_engine::persist::{execute_batch, open_grid};
use timetable_engine::reconcile::{BatchPhase, SlotPayload};
use timetable_engine::{
    save, AcademicPeriod, GridSettings, GridSlotStore, MemoryRepository, RepositoryError,
    SaveReport, ScheduleId, SlotContent, SlotId, TimeSlot, TimetableError, TimetableRepository,
};

const SCHEDULE: ScheduleId = ScheduleId(1);
const PERIOD: PeriodId = PeriodId(1);

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

fn period() -> AcademicPeriod {
    AcademicPeriod {
        id: PERIOD,
        course_id: CourseId(1),
        start: date(3, 4),
        end: date(3, 22),
        excluded_days: vec![],
        excluded_weeks: vec![],
    }
}

fn slot(id: u64, schedule: ScheduleId, date: NaiveDate, slot_number: u8, subject: u64) -> TimeSlot {
    TimeSlot {
        id: Some(SlotId(id)),
        date,
        slot_number,
        schedule_id: schedule,
        content: SlotContent::new(SubjectId(subject)).with_teacher(TeacherId(subject * 10)),
    }
}

fn seeded_repo() -> MemoryRepository {
    MemoryRepository::with_data(
        [period()],
        [
            slot(1, SCHEDULE, date(3, 4), 1, 10),
            slot(2, SCHEDULE, date(3, 4), 2, 11),
            slot(3, SCHEDULE, date(3, 5), 1, 12),
            slot(4, ScheduleId(2), date(3, 4), 1, 20),
        ],
    )
}

fn open(repo: &impl TimetableRepository) -> GridSlotStore {
    let mut store = open_grid(repo, SCHEDULE, PERIOD, GridSettings::default()).unwrap();
    store.begin_edit();
    store
}

// -----------------------------------------------------------------------------
// Test doubles
// -----------------------------------------------------------------------------

/// Records every write call in order before delegating.
struct Recording {
    inner: MemoryRepository,
    calls: Vec<String>,
}

impl TimetableRepository for Recording {
    fn period(&self, id: PeriodId) -> Result<AcademicPeriod, RepositoryError> {
        self.inner.period(id)
    }

    fn slots_for_schedule(&self, schedule_id: ScheduleId) -> Result<Vec<TimeSlot>, RepositoryError> {
        self.inner.slots_for_schedule(schedule_id)
    }

    fn all_slots(&self) -> Result<Vec<TimeSlot>, RepositoryError> {
        self.inner.all_slots()
    }

    fn create_slot(&mut self, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError> {
        self.calls.push(format!("create {}#{}", payload.date, payload.slot_number));
        self.inner.create_slot(payload)
    }

    fn update_slot(&mut self, id: SlotId, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError> {
        self.calls.push(format!("update {}", id));
        self.inner.update_slot(id, payload)
    }

    fn delete_slot(&mut self, id: SlotId) -> Result<(), RepositoryError> {
        self.calls.push(format!("delete {}", id));
        self.inner.delete_slot(id)
    }
}

/// Fails the first call of a chosen phase, or the reload after writes.
struct Failing {
    inner: MemoryRepository,
    fail_phase: Option<BatchPhase>,
    fail_reload: bool,
}

impl Failing {
    fn check(&self, phase: BatchPhase) -> Result<(), RepositoryError> {
        if self.fail_phase == Some(phase) {
            return Err(RepositoryError::Rejected(format!("{} refused", phase)));
        }
        Ok(())
    }
}

impl TimetableRepository for Failing {
    fn period(&self, id: PeriodId) -> Result<AcademicPeriod, RepositoryError> {
        self.inner.period(id)
    }

    fn slots_for_schedule(&self, schedule_id: ScheduleId) -> Result<Vec<TimeSlot>, RepositoryError> {
        if self.fail_reload {
            return Err(RepositoryError::Rejected("store unavailable".to_string()));
        }
        self.inner.slots_for_schedule(schedule_id)
    }

    fn all_slots(&self) -> Result<Vec<TimeSlot>, RepositoryError> {
        self.inner.all_slots()
    }

    fn create_slot(&mut self, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError> {
        self.check(BatchPhase::Create)?;
        self.inner.create_slot(payload)
    }

    fn update_slot(&mut self, id: SlotId, payload: &SlotPayload) -> Result<TimeSlot, RepositoryError> {
        self.check(BatchPhase::Update)?;
        self.inner.update_slot(id, payload)
    }

    fn delete_slot(&mut self, id: SlotId) -> Result<(), RepositoryError> {
        self.check(BatchPhase::Delete)?;
        self.inner.delete_slot(id)
    }
}

// -----------------------------------------------------------------------------
// open_grid
// -----------------------------------------------------------------------------

#[test]
fn open_grid_loads_only_the_requested_schedule() {
    let repo = seeded_repo();
    let store = open_grid(&repo, SCHEDULE, PERIOD, GridSettings::default()).unwrap();
    assert_eq!(store.committed().len(), 3);
    assert_eq!(store.weeks().len(), 3);
    assert!(!store.is_editing());
}

#[test]
fn open_grid_with_unknown_period_fails() {
    let repo = seeded_repo();
    let err = open_grid(&repo, SCHEDULE, PeriodId(99), GridSettings::default()).unwrap_err();
    assert!(matches!(
        err,
        TimetableError::Repository(RepositoryError::PeriodNotFound(99))
    ));
}

// -----------------------------------------------------------------------------
// save
// -----------------------------------------------------------------------------

#[test]
fn save_without_changes_makes_no_calls() {
    let mut repo = Recording {
        inner: seeded_repo(),
        calls: vec![],
    };
    let mut store = open(&repo);
    let report = save(&mut store, &mut repo).unwrap();
    assert_eq!(report, SaveReport::default());
    assert!(repo.calls.is_empty());
}

#[test]
fn save_reloads_and_rebaselines() {
    let mut repo = seeded_repo();
    let mut store = open(&repo);
    store.mutate(SlotId(1), date(3, 4), 2);
    store.mutate(SlotId(3), date(3, 6), 1);

    let report = save(&mut store, &mut repo).unwrap();
    assert_eq!(
        report,
        SaveReport {
            deleted: 1,
            created: 1,
            updated: 2
        }
    );

    assert!(!store.is_editing());
    assert!(!store.has_changes());
    assert_eq!(store.working(), store.committed());

    let moved = store.lookup(date(3, 6), 1).expect("moved slot reloaded");
    assert_eq!(moved.id, Some(SlotId(5)), "store assigned a fresh id");
    assert!(repo.slot(SlotId(3)).is_none());
    assert_eq!(
        store.lookup(date(3, 4), 1).unwrap().content.subject,
        SubjectId(11)
    );
}

#[test]
fn other_schedules_are_untouched_by_save() {
    let mut repo = seeded_repo();
    let mut store = open(&repo);
    store.clear(date(3, 4), 1);
    save(&mut store, &mut repo).unwrap();

    assert_eq!(repo.slot(SlotId(4)).unwrap().schedule_id, ScheduleId(2));
    assert_eq!(repo.len(), 3);
}

#[test]
fn deletes_run_before_creates_on_a_reused_position() {
    let mut repo = Recording {
        inner: seeded_repo(),
        calls: vec![],
    };
    let mut store = open(&repo);
    // Replace slot 1 with a fresh slot on the same cell.
    store.clear(date(3, 4), 1);
    store.assign(date(3, 4), 1, SlotContent::new(SubjectId(30)));
    // And move slot 3 onto an empty cell.
    store.mutate(SlotId(3), date(3, 7), 2);

    save(&mut store, &mut repo).unwrap();

    let first_create = repo
        .calls
        .iter()
        .position(|c| c.starts_with("create"))
        .unwrap();
    let last_delete = repo
        .calls
        .iter()
        .rposition(|c| c.starts_with("delete"))
        .unwrap();
    assert!(last_delete < first_create, "calls: {:?}", repo.calls);
    assert_eq!(
        store.lookup(date(3, 4), 1).unwrap().content.subject,
        SubjectId(30)
    );
}

#[test]
fn creates_run_before_updates() {
    let mut repo = Recording {
        inner: seeded_repo(),
        calls: vec![],
    };
    let mut store = open(&repo);
    store.set_teacher(date(3, 4), 2, None);
    store.assign(date(3, 6), 1, SlotContent::new(SubjectId(30)));

    save(&mut store, &mut repo).unwrap();
    assert_eq!(repo.calls, vec!["create 2024-03-06#1", "update 2"]);
}

#[test]
fn failed_update_keeps_the_session_intact() {
    let mut repo = Failing {
        inner: seeded_repo(),
        fail_phase: Some(BatchPhase::Update),
        fail_reload: false,
    };
    let mut store = open(&repo);
    store.clear(date(3, 5), 1);
    store.set_teacher(date(3, 4), 2, None);
    let committed_before = store.committed().clone();
    let working_before = store.working().clone();

    let err = save(&mut store, &mut repo).unwrap_err();
    match err {
        TimetableError::Persistence {
            phase, completed, ..
        } => {
            assert_eq!(phase, BatchPhase::Update);
            assert_eq!(completed, 1, "the delete went through");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(store.is_editing());
    assert_eq!(store.committed(), &committed_before);
    assert_eq!(store.working(), &working_before);
    assert!(repo.inner.slot(SlotId(3)).is_none(), "no rollback");
}

#[test]
fn failed_delete_stops_before_any_create() {
    let mut repo = Failing {
        inner: seeded_repo(),
        fail_phase: Some(BatchPhase::Delete),
        fail_reload: false,
    };
    let mut store = open(&repo);
    store.mutate(SlotId(1), date(3, 6), 2);

    let err = save(&mut store, &mut repo).unwrap_err();
    assert!(matches!(
        err,
        TimetableError::Persistence {
            phase: BatchPhase::Delete,
            completed: 0,
            ..
        }
    ));
    assert_eq!(repo.inner.len(), 4, "nothing was created");
}

#[test]
fn failed_reload_is_reported_after_writes() {
    let mut repo = Failing {
        inner: seeded_repo(),
        fail_phase: None,
        fail_reload: false,
    };
    let mut store = open(&repo);
    store.clear(date(3, 4), 1);
    repo.fail_reload = true;

    let err = save(&mut store, &mut repo).unwrap_err();
    assert!(matches!(err, TimetableError::Repository(_)));
    assert!(store.is_editing(), "store keeps its unsaved view");
    assert!(repo.inner.slot(SlotId(1)).is_none());
}

#[test]
fn persistence_error_names_the_phase() {
    let mut repo = Failing {
        inner: seeded_repo(),
        fail_phase: Some(BatchPhase::Create),
        fail_reload: false,
    };
    let mut store = open(&repo);
    store.assign(date(3, 6), 1, SlotContent::new(SubjectId(30)));

    let message = save(&mut store, &mut repo).unwrap_err().to_string();
    assert!(message.contains("create phase"), "{message}");
    assert!(message.contains("create refused"), "{message}");
}

// -----------------------------------------------------------------------------
// execute_batch
// -----------------------------------------------------------------------------

#[test]
fn batch_on_taken_position_is_rejected_by_memory_store() {
    let mut repo = seeded_repo();
    let mut store = open(&repo);
    store.assign(date(3, 6), 1, SlotContent::new(SubjectId(30)));
    let batch = store.pending_batch();

    // Someone else takes the cell first.
    repo.create_slot(&batch.to_create[0]).unwrap();
    let err = execute_batch(&mut repo, &batch).unwrap_err();
    assert!(matches!(
        err,
        TimetableError::Persistence {
            phase: BatchPhase::Create,
            source: RepositoryError::PositionTaken(_),
            ..
        }
    ));
}
