//! WASM bindings for timetable-engine.
//!
//! Exposes calendar weeks, save reconciliation, teacher conflict detection and
//! grid rendering to the browser front end via `wasm-bindgen`. All complex
//! types cross the boundary as JSON strings. Slot payloads are accepted in the
//! store's loose format (embedded objects or bare ids, `day`/`number`/
//! `schedule` field names).
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p timetable-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/timetable_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use timetable_engine::config::SLOT_LIMIT;
use timetable_engine::wire::{self, SlotRecord};
use timetable_engine::{
    AcademicPeriod, CalendarWeek, GridSettings, GridSlotStore, ScheduleId, SlotIndex, SlotSet,
    TimeSlot,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct WeekDto {
    number: u32,
    start: String,
    end: String,
    days: Vec<String>,
}

impl From<&CalendarWeek> for WeekDto {
    fn from(week: &CalendarWeek) -> Self {
        Self {
            number: week.number,
            start: date_string(week.start),
            end: date_string(week.end),
            days: week.days().into_iter().map(date_string).collect(),
        }
    }
}

fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Helpers: parse JSON inputs
// ---------------------------------------------------------------------------

fn parse_period_json(json: &str) -> Result<AcademicPeriod, JsValue> {
    wire::parse_period(json).map_err(|e| JsValue::from_str(&format!("Invalid period JSON: {}", e)))
}

fn parse_slots_json(json: &str) -> Result<Vec<TimeSlot>, JsValue> {
    wire::parse_slots(json).map_err(|e| JsValue::from_str(&format!("Invalid slots JSON: {}", e)))
}

fn parse_slot_json(json: &str) -> Result<TimeSlot, JsValue> {
    let record: SlotRecord = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid slot JSON: {}", e)))?;
    TimeSlot::try_from(record).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Build the rendered teaching weeks of a period.
///
/// Returns a JSON array of `{number, start, end, days}` objects, dates as
/// `YYYY-MM-DD`. Weeks whose Monday falls in an excluded week range are
/// omitted.
///
/// # Arguments
/// - `period_json` -- period with `start`, `end`, `excluded_days`, `excluded_weeks`
#[wasm_bindgen(js_name = "buildWeeks")]
pub fn build_weeks(period_json: &str) -> Result<String, JsValue> {
    let period = parse_period_json(period_json)?;
    let weeks: Vec<WeekDto> = period.weeks().map(|w| WeekDto::from(&w)).collect();
    to_json(&weeks)
}

/// Compute the batch that turns the committed slots into the working slots.
///
/// Both arguments are JSON arrays of slots. Returns
/// `{to_delete, to_update, to_create}`; persist deletes first.
#[wasm_bindgen(js_name = "reconcile")]
pub fn reconcile(committed_json: &str, working_json: &str) -> Result<String, JsValue> {
    let committed: SlotSet = parse_slots_json(committed_json)?.into_iter().collect();
    let working: SlotSet = parse_slots_json(working_json)?.into_iter().collect();
    to_json(&timetable_engine::reconcile(&committed, &working))
}

/// List every teacher double-booked into the same date and slot number.
#[wasm_bindgen(js_name = "findConflicts")]
pub fn find_conflicts(slots_json: &str) -> Result<String, JsValue> {
    let slots = parse_slots_json(slots_json)?;
    to_json(&SlotIndex::new(slots).conflicts())
}

/// Whether another slot books the same teacher at the same date and slot
/// number as `slot_json`.
#[wasm_bindgen(js_name = "hasConflict")]
pub fn has_conflict(slot_json: &str, all_slots_json: &str) -> Result<bool, JsValue> {
    let slot = parse_slot_json(slot_json)?;
    let all = parse_slots_json(all_slots_json)?;
    Ok(timetable_engine::has_conflict(&slot, &all))
}

/// Render one schedule's grid.
///
/// `slots_json` holds the schedule's slots as they should be shown (committed
/// or working); `all_slots_json` holds every schedule's slots for conflict
/// flags. `max_slots_per_day` caps the grid width (default 6, clamped to
/// 1..=12).
#[wasm_bindgen(js_name = "renderGrid")]
pub fn render_grid(
    period_json: &str,
    schedule_id: u32,
    slots_json: &str,
    all_slots_json: &str,
    max_slots_per_day: Option<u8>,
) -> Result<String, JsValue> {
    let period = parse_period_json(period_json)?;
    let slots = parse_slots_json(slots_json)?;
    let all = parse_slots_json(all_slots_json)?;

    let mut settings = GridSettings::default();
    if let Some(max) = max_slots_per_day {
        settings.max_slots_per_day = max.clamp(1, SLOT_LIMIT);
    }

    let schedule_id = ScheduleId(u64::from(schedule_id));
    let mut store = GridSlotStore::new(schedule_id, &period, settings);
    store.load(slots);
    let index = SlotIndex::new(all);
    to_json(&timetable_engine::render_grid(&store, &index))
}
