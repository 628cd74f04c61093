//! Property-based tests for edit sessions using proptest.
//!
//! Random committed grids are edited with random gestures. Whatever the
//! sequence, the reconciled batch must carry the committed set to exactly
//! the working contents, both in memory and through a store that enforces
//! one slot per position.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use proptest::prelude::*;
use timetable_engine::model::{ActivityId, CourseId, PeriodId, SubjectId, TeacherId};
use timetable_engine::persist::open_grid;
use timetable_engine::{
    build_weeks, reconcile, save, AcademicPeriod, DragOutcome, ExcludedWeekRange, GridSettings,
    GridSlotStore, MemoryRepository, ScheduleId, SlotContent, SlotId, TimeSlot,
};

const SCHEDULE: ScheduleId = ScheduleId(1);
const PERIOD: PeriodId = PeriodId(1);
/// Teaching days in the three-week test period.
const DAYS: usize = 15;

type Cell = (usize, u8);

#[derive(Debug, Clone)]
enum Op {
    Drag { from: Cell, to: Cell },
    Clear(Cell),
    Assign(Cell, SlotContent),
    Teacher(Cell, Option<u64>),
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_cell() -> impl Strategy<Value = Cell> {
    (0..DAYS, 1u8..=4)
}

fn arb_content() -> impl Strategy<Value = SlotContent> {
    (
        1u64..=5,
        prop::option::of(1u64..=4),
        prop::collection::btree_set(1u64..=4, 0..3),
    )
        .prop_map(|(subject, teacher, activities)| {
            let mut content =
                SlotContent::new(SubjectId(subject)).with_activities(activities.into_iter().map(ActivityId));
            content.teacher = teacher.map(TeacherId);
            content
        })
}

fn arb_committed() -> impl Strategy<Value = BTreeMap<Cell, SlotContent>> {
    prop::collection::btree_map(arb_cell(), arb_content(), 0..20)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_cell(), arb_cell()).prop_map(|(from, to)| Op::Drag { from, to }),
        1 => arb_cell().prop_map(Op::Clear),
        1 => (arb_cell(), arb_content()).prop_map(|(cell, content)| Op::Assign(cell, content)),
        1 => (arb_cell(), prop::option::of(1u64..=4)).prop_map(|(cell, t)| Op::Teacher(cell, t)),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 0..25)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(index: usize) -> NaiveDate {
    let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let offset = (index / 5) * 7 + index % 5;
    monday.checked_add_days(Days::new(offset as u64)).unwrap()
}

fn period() -> AcademicPeriod {
    AcademicPeriod {
        id: PERIOD,
        course_id: CourseId(1),
        start: day(0),
        end: day(DAYS - 1),
        excluded_days: vec![],
        excluded_weeks: vec![],
    }
}

fn committed_slots(committed: &BTreeMap<Cell, SlotContent>) -> Vec<TimeSlot> {
    committed
        .iter()
        .enumerate()
        .map(|(i, ((d, n), content))| TimeSlot {
            id: Some(SlotId(i as u64 + 1)),
            date: day(*d),
            slot_number: *n,
            schedule_id: SCHEDULE,
            content: content.clone(),
        })
        .collect()
}

fn editing_store(slots: Vec<TimeSlot>) -> GridSlotStore {
    let mut store = GridSlotStore::new(SCHEDULE, &period(), GridSettings::default());
    store.load(slots);
    store.begin_edit();
    store
}

fn apply(store: &mut GridSlotStore, op: &Op) {
    match op {
        Op::Drag { from, to } => {
            if store.start_drag(day(from.0), from.1) {
                store.hover(day(to.0), to.1);
                store.drop_dragged();
            }
        }
        Op::Clear((d, n)) => {
            store.clear(day(*d), *n);
        }
        Op::Assign((d, n), content) => {
            store.assign(day(*d), *n, content.clone());
        }
        Op::Teacher((d, n), teacher) => {
            store.set_teacher(day(*d), *n, teacher.map(TeacherId));
        }
    }
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Applying the batch to the committed set yields the working contents
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn batch_round_trips_in_memory(committed in arb_committed(), ops in arb_ops()) {
        let mut store = editing_store(committed_slots(&committed));
        for op in &ops {
            apply(&mut store, op);
        }

        let batch = reconcile(store.committed(), store.working());
        let applied = batch.apply_to(store.committed());
        prop_assert_eq!(applied.contents(), store.working().contents());
    }
}

// ---------------------------------------------------------------------------
// Property 2: Saving through a unique-position store never collides and
// reloads exactly the working contents
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn save_reproduces_working_contents(committed in arb_committed(), ops in arb_ops()) {
        let mut repo = MemoryRepository::with_data([period()], committed_slots(&committed));
        let mut store = open_grid(&repo, SCHEDULE, PERIOD, GridSettings::default()).unwrap();
        store.begin_edit();
        for op in &ops {
            apply(&mut store, op);
        }
        let expected = store.working().contents();

        let result = save(&mut store, &mut repo);
        prop_assert!(result.is_ok(), "save failed: {:?}", result.err());
        prop_assert_eq!(store.committed().contents(), expected);
        prop_assert!(!store.has_changes());
        prop_assert!(store.committed().iter().all(|slot| slot.id.is_some()));
    }
}

// ---------------------------------------------------------------------------
// Property 3: Batch lists are disjoint and no id is deleted twice
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn batch_lists_are_disjoint(committed in arb_committed(), ops in arb_ops()) {
        let mut store = editing_store(committed_slots(&committed));
        for op in &ops {
            apply(&mut store, op);
        }
        let batch = store.pending_batch();

        let mut deleted = batch.to_delete.clone();
        deleted.sort();
        deleted.dedup();
        prop_assert_eq!(deleted.len(), batch.to_delete.len());
        for update in &batch.to_update {
            prop_assert!(!batch.to_delete.contains(&update.id));
        }
        prop_assert!(batch.len() <= store.committed().len() + store.working().len());
    }
}

// ---------------------------------------------------------------------------
// Property 4: Drags never change the number of slots
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn drags_preserve_slot_count(
        committed in arb_committed(),
        drags in prop::collection::vec((arb_cell(), arb_cell()), 0..25),
    ) {
        let mut store = editing_store(committed_slots(&committed));
        let count = store.working().len();
        for (from, to) in drags {
            apply(&mut store, &Op::Drag { from, to });
            prop_assert_eq!(store.working().len(), count);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: A swap undone by the reverse swap restores the working set,
// and a self-drop changes nothing
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn swap_is_an_involution(committed in arb_committed(), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        prop_assume!(committed.len() >= 2);
        let mut store = editing_store(committed_slots(&committed));
        let before = store.working().clone();
        let cells: Vec<Cell> = committed.keys().copied().collect();
        let (da, na) = cells[a.index(cells.len())];
        let (db, nb) = cells[b.index(cells.len())];
        let id_a = store.lookup(day(da), na).and_then(|s| s.id).unwrap();
        let id_b = store.lookup(day(db), nb).and_then(|s| s.id).unwrap();

        let first = store.mutate(id_a, day(db), nb);
        if (da, na) == (db, nb) {
            prop_assert_eq!(first, DragOutcome::Rejected(timetable_engine::Rejection::SelfDrop));
        } else {
            prop_assert_eq!(first, DragOutcome::Swapped);
            prop_assert_eq!(store.mutate(id_b, day(da), na), DragOutcome::Swapped);
        }
        prop_assert_eq!(store.working(), &before);
    }
}

// ---------------------------------------------------------------------------
// Property 6: Rendered weeks start on Mondays inside the period and skip
// excluded week starts
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn weeks_skip_excluded_mondays(
        start_offset in 0u64..60,
        length in 0u64..120,
        excluded in prop::collection::vec((0u64..180, 0u64..20), 0..3),
    ) {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let start = origin.checked_add_days(Days::new(start_offset)).unwrap();
        let end = start.checked_add_days(Days::new(length)).unwrap();
        let ranges: Vec<ExcludedWeekRange> = excluded
            .into_iter()
            .map(|(offset, len)| {
                let from = origin.checked_add_days(Days::new(offset)).unwrap();
                ExcludedWeekRange {
                    start: from,
                    end: from.checked_add_days(Days::new(len)).unwrap(),
                    reason: String::new(),
                }
            })
            .collect();

        for (i, week) in build_weeks(start, end, &ranges).enumerate() {
            prop_assert_eq!(week.start.weekday(), Weekday::Mon);
            prop_assert!(week.start <= end);
            prop_assert!(week.start.checked_add_days(Days::new(7)).unwrap() > start);
            prop_assert!(!ranges.iter().any(|r| r.contains(week.start)));
            prop_assert_eq!(week.number as usize, i + 1);
        }
    }
}
