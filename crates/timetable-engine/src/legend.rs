//! Legends shown under a schedule grid: subjects with their teacher, and the
//! activities in use.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{Activity, ActivityId, Subject, SubjectId, TeacherId};
use crate::repository::ReferenceCatalog;
use crate::store::SlotSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectLegendEntry {
    pub subject: Subject,
    /// Name of the first teacher found for the subject, in position order.
    /// `None` when that teacher is missing from the catalog.
    pub teacher_name: Option<String>,
}

/// One entry per subject taught by a teacher in `slots`, sorted by subject
/// name. Subjects with no teacher on any slot, and subjects unknown to the
/// catalog, are left out.
pub fn subject_legend(slots: &SlotSet, catalog: &impl ReferenceCatalog) -> Vec<SubjectLegendEntry> {
    let mut first_teacher: BTreeMap<SubjectId, TeacherId> = BTreeMap::new();
    for slot in slots.to_sorted_vec() {
        if let Some(teacher) = slot.content.teacher {
            first_teacher.entry(slot.content.subject).or_insert(teacher);
        }
    }

    let mut legend: Vec<SubjectLegendEntry> = first_teacher
        .into_iter()
        .filter_map(|(subject_id, teacher_id)| {
            let subject = catalog.subject(subject_id)?.clone();
            let teacher_name = catalog.teacher(teacher_id).map(|t| t.name.clone());
            Some(SubjectLegendEntry {
                subject,
                teacher_name,
            })
        })
        .collect();
    legend.sort_by(|a, b| a.subject.name.cmp(&b.subject.name));
    legend
}

/// Distinct activities used in `slots`, sorted by name.
pub fn activity_legend(slots: &SlotSet, catalog: &impl ReferenceCatalog) -> Vec<Activity> {
    let used: BTreeSet<ActivityId> = slots
        .iter()
        .flat_map(|slot| slot.content.activities.iter().copied())
        .collect();

    let mut activities: Vec<Activity> = used
        .into_iter()
        .filter_map(|id| catalog.activity(id).cloned())
        .collect();
    activities.sort_by(|a, b| a.name.cmp(&b.name));
    activities
}
