//! # timetable-engine
//!
//! Editing and reconciliation engine for academic timetables laid out as a
//! weekly grid of numbered time slots.
//!
//! An operator rearranges a schedule by dragging slots around a working copy
//! of the committed grid. On save the engine computes the exact
//! create/update/delete batch that turns the committed set into the working
//! set, issues it against the backing store (deletes first), and reloads the
//! committed set from the store. Teacher double-booking across every
//! schedule is flagged for display but never blocks an edit.
//!
//! ## Modules
//!
//! - [`calendar`]: period dates and excluded week ranges → rendered weeks
//! - [`store`]: committed snapshot and working copy, keyed by position
//! - [`mutation`]: drag gestures (swap, move-via-recreate) and cell edits
//! - [`reconcile`]: committed vs. working → delete/update/create batch
//! - [`conflict`]: teacher double-booking across schedules
//! - [`persist`]: issue a batch against a repository and re-baseline
//! - [`grid`]: weeks × weekdays × slot cells for presentation
//! - [`legend`]: subject/teacher and activity legends
//! - [`repository`]: collaborator traits and in-memory implementations
//! - [`wire`]: normalization of loose store JSON
//! - [`config`]: grid settings
//! - [`error`]: error types

pub mod calendar;
pub mod config;
pub mod conflict;
pub mod error;
pub mod grid;
pub mod legend;
pub mod model;
pub mod mutation;
pub mod persist;
pub mod reconcile;
pub mod repository;
pub mod store;
pub mod wire;

pub use calendar::{build_weeks, CalendarWeek};
pub use config::GridSettings;
pub use conflict::{has_conflict, SlotIndex, TeacherConflict};
pub use error::{RepositoryError, TimetableError};
pub use grid::{render_grid, Cell, DayColumn, RenderedGrid};
pub use model::{
    AcademicPeriod, ExcludedDay, ExcludedWeekRange, PositionKey, ScheduleId, SlotContent, SlotId,
    TimeSlot,
};
pub use mutation::{DragOutcome, EditOutcome, Rejection};
pub use persist::{save, SaveReport};
pub use reconcile::{reconcile, ReconcileBatch};
pub use repository::{MemoryRepository, ReferenceCatalog, TimetableRepository};
pub use store::{GridSlotStore, SlotSet};
