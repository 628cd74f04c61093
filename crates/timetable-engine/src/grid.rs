//! Lay the working slots of a store out as weeks × weekdays × slot cells.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::CalendarWeek;
use crate::conflict::SlotIndex;
use crate::model::{ScheduleId, TimeSlot};
use crate::store::GridSlotStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "slot", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Occupied(TimeSlot),
    /// Occupied, and the slot's teacher is booked elsewhere at the same time.
    Conflicted(TimeSlot),
}

impl Cell {
    pub fn slot(&self) -> Option<&TimeSlot> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(slot) | Cell::Conflicted(slot) => Some(slot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayColumn {
    /// An excluded day with nothing scheduled; rendered without cells.
    Free { date: NaiveDate },
    Slots { date: NaiveDate, cells: Vec<Cell> },
}

impl DayColumn {
    pub fn date(&self) -> NaiveDate {
        match self {
            DayColumn::Free { date } | DayColumn::Slots { date, .. } => *date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekRow {
    pub week: CalendarWeek,
    pub days: Vec<DayColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedGrid {
    pub schedule_id: ScheduleId,
    pub width: u8,
    pub weeks: Vec<WeekRow>,
}

impl RenderedGrid {
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.weeks
            .iter()
            .flat_map(|w| w.days.iter())
            .flat_map(|d| match d {
                DayColumn::Free { .. } => &[] as &[Cell],
                DayColumn::Slots { cells, .. } => cells.as_slice(),
            })
    }

    pub fn conflicted_count(&self) -> usize {
        self.cells()
            .filter(|c| matches!(c, Cell::Conflicted(_)))
            .count()
    }
}

/// Render the store's working set. Slot numbers above the grid width are not
/// shown. Conflicts are judged against `index`.
pub fn render_grid(store: &GridSlotStore, index: &SlotIndex) -> RenderedGrid {
    let width = store.width();
    let weeks = store
        .weeks()
        .iter()
        .map(|week| WeekRow {
            week: *week,
            days: week
                .days()
                .into_iter()
                .map(|date| render_day(store, index, date, width))
                .collect(),
        })
        .collect();

    RenderedGrid {
        schedule_id: store.schedule_id(),
        width,
        weeks,
    }
}

fn render_day(store: &GridSlotStore, index: &SlotIndex, date: NaiveDate, width: u8) -> DayColumn {
    if store.is_free_day(date) {
        return DayColumn::Free { date };
    }
    let cells = (1..=width)
        .map(|slot_number| match store.lookup(date, slot_number) {
            None => Cell::Empty,
            Some(slot) if index.has_conflict(slot) => Cell::Conflicted(slot.clone()),
            Some(slot) => Cell::Occupied(slot.clone()),
        })
        .collect();
    DayColumn::Slots { date, cells }
}
