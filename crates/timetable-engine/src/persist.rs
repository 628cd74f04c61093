//! Write a reconciled batch to the backing store and re-baseline the grid.
//!
//! The delete phase runs to completion before any create, and creates before
//! updates. The first failing call aborts the rest of the batch. A failed
//! save leaves the committed baseline and the working set untouched and the
//! store in edit mode, so the operator can retry or cancel. Earlier calls of
//! the batch may already have been applied, so callers reload before
//! trusting any post-failure state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GridSettings;
use crate::error::{RepositoryError, Result, TimetableError};
use crate::model::{PeriodId, ScheduleId};
use crate::reconcile::{BatchPhase, ReconcileBatch};
use crate::repository::TimetableRepository;
use crate::store::GridSlotStore;

/// Counts of store calls made by a successful save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub deleted: usize,
    pub created: usize,
    pub updated: usize,
}

/// Fetch a period and a schedule's slots and build a loaded store.
pub fn open_grid<R: TimetableRepository + ?Sized>(
    repo: &R,
    schedule_id: ScheduleId,
    period_id: PeriodId,
    settings: GridSettings,
) -> Result<GridSlotStore> {
    let period = repo.period(period_id)?;
    let mut store = GridSlotStore::new(schedule_id, &period, settings);
    store.load(repo.slots_for_schedule(schedule_id)?);
    Ok(store)
}

/// Issue every call of `batch` against `repo`: deletes, then creates, then
/// updates. Stops at the first failure.
pub fn execute_batch<R: TimetableRepository + ?Sized>(
    repo: &mut R,
    batch: &ReconcileBatch,
) -> Result<SaveReport> {
    let mut report = SaveReport::default();

    for id in &batch.to_delete {
        repo.delete_slot(*id)
            .map_err(|e| failure(BatchPhase::Delete, &report, e))?;
        report.deleted += 1;
    }
    debug!(deleted = report.deleted, "delete phase complete");

    for payload in &batch.to_create {
        repo.create_slot(payload)
            .map_err(|e| failure(BatchPhase::Create, &report, e))?;
        report.created += 1;
    }
    debug!(created = report.created, "create phase complete");

    for update in &batch.to_update {
        repo.update_slot(update.id, &update.payload)
            .map_err(|e| failure(BatchPhase::Update, &report, e))?;
        report.updated += 1;
    }
    debug!(updated = report.updated, "update phase complete");

    Ok(report)
}

/// Persist the store's pending edits and reload the committed set from the
/// repository's post-write state.
pub fn save<R: TimetableRepository + ?Sized>(
    store: &mut GridSlotStore,
    repo: &mut R,
) -> Result<SaveReport> {
    let batch = store.pending_batch();
    info!(
        schedule = %store.schedule_id(),
        deletes = batch.to_delete.len(),
        creates = batch.to_create.len(),
        updates = batch.to_update.len(),
        "saving schedule edits"
    );

    let report = execute_batch(repo, &batch)?;

    let reloaded = repo.slots_for_schedule(store.schedule_id()).map_err(|e| {
        warn!(schedule = %store.schedule_id(), error = %e, "reload after save failed");
        TimetableError::Repository(e)
    })?;
    store.load(reloaded);
    Ok(report)
}

fn failure(phase: BatchPhase, report: &SaveReport, source: RepositoryError) -> TimetableError {
    let completed = report.deleted + report.created + report.updated;
    warn!(%phase, completed, error = %source, "save aborted");
    TimetableError::Persistence {
        phase,
        completed,
        source,
    }
}
