//! List editors for the three plan sub-lists.
//!
//! Every operation reads the last snapshot mirrored by [`PlanSync`], computes
//! the next array locally and hands it to [`PlanSync::upsert_field`]. The
//! returned [`PendingWrite`] is the single write each operation issues.

use futures::future::{self, FutureExt};
use tracing::debug;

use carnival_shared::plan::{parse_cost, parse_schedule_datetime};
use carnival_shared::{BudgetItem, ItemId, PackingItem, PlanDocument, PlanEntry, PlanField, ScheduleItem};

use crate::error::{EditError, SyncError};
use crate::sync::{FieldUpdate, PendingWrite, PlanSync};

/// One editable sub-list of a [`PlanDocument`].
pub trait ListEditor {
    type Entry: PlanEntry + Clone;
    /// Raw user input for a new entry.
    type Draft;

    const FIELD: PlanField;

    fn entries(doc: &PlanDocument) -> &[Self::Entry];

    /// Validate a draft and build an entry with a fresh id.
    fn build(draft: Self::Draft) -> Result<Self::Entry, EditError>;

    fn update(entries: Vec<Self::Entry>) -> FieldUpdate;
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetDraft {
    pub name: String,
    /// Free text. Non-numeric input becomes `NaN`.
    pub cost: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub title: String,
    /// `YYYY-MM-DDTHH:MM`
    pub datetime: String,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackingDraft {
    pub item: String,
}

fn required(value: &str, field: &'static str) -> Result<String, EditError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EditError::MissingField(field));
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// Editors
// ---------------------------------------------------------------------------

pub struct BudgetEditor;

impl ListEditor for BudgetEditor {
    type Entry = BudgetItem;
    type Draft = BudgetDraft;

    const FIELD: PlanField = PlanField::Budget;

    fn entries(doc: &PlanDocument) -> &[BudgetItem] {
        &doc.budget
    }

    fn build(draft: BudgetDraft) -> Result<BudgetItem, EditError> {
        let name = required(&draft.name, "name")?;
        let cost = required(&draft.cost, "cost")?;
        Ok(BudgetItem {
            id: ItemId::generate(),
            name,
            cost: parse_cost(&cost),
        })
    }

    fn update(entries: Vec<BudgetItem>) -> FieldUpdate {
        FieldUpdate::Budget(entries)
    }
}

pub struct ScheduleEditor;

impl ListEditor for ScheduleEditor {
    type Entry = ScheduleItem;
    type Draft = ScheduleDraft;

    const FIELD: PlanField = PlanField::Schedule;

    fn entries(doc: &PlanDocument) -> &[ScheduleItem] {
        &doc.schedule
    }

    fn build(draft: ScheduleDraft) -> Result<ScheduleItem, EditError> {
        let title = required(&draft.title, "title")?;
        let datetime = parse_schedule_datetime(&required(&draft.datetime, "datetime")?)?;
        Ok(ScheduleItem {
            id: ItemId::generate(),
            title,
            datetime,
            note: draft.note.trim().to_string(),
        })
    }

    fn update(entries: Vec<ScheduleItem>) -> FieldUpdate {
        FieldUpdate::Schedule(entries)
    }
}

pub struct PackingEditor;

impl ListEditor for PackingEditor {
    type Entry = PackingItem;
    type Draft = PackingDraft;

    const FIELD: PlanField = PlanField::Packing;

    fn entries(doc: &PlanDocument) -> &[PackingItem] {
        &doc.packing
    }

    fn build(draft: PackingDraft) -> Result<PackingItem, EditError> {
        Ok(PackingItem {
            id: ItemId::generate(),
            item: required(&draft.item, "item")?,
            checked: false,
        })
    }

    fn update(entries: Vec<PackingItem>) -> FieldUpdate {
        FieldUpdate::Packing(entries)
    }
}

// ---------------------------------------------------------------------------
// Pure transformations
// ---------------------------------------------------------------------------

pub fn appended<T: Clone>(entries: &[T], entry: T) -> Vec<T> {
    let mut next = entries.to_vec();
    next.push(entry);
    next
}

/// `None` when no entry has `id`.
pub fn without<T: PlanEntry + Clone>(entries: &[T], id: &ItemId) -> Option<Vec<T>> {
    if !entries.iter().any(|e| e.id() == id) {
        return None;
    }
    Some(entries.iter().filter(|e| e.id() != id).cloned().collect())
}

/// Flip `checked` on the entry with `id`. `None` when absent.
pub fn toggled(entries: &[PackingItem], id: &ItemId) -> Option<Vec<PackingItem>> {
    if !entries.iter().any(|e| &e.id == id) {
        return None;
    }
    Some(
        entries
            .iter()
            .map(|e| {
                let mut e = e.clone();
                if &e.id == id {
                    e.checked = !e.checked;
                }
                e
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn loaded(sync: &PlanSync) -> Result<&PlanDocument, EditError> {
    if sync.key().is_none() {
        return Err(SyncError::NoActivePlan.into());
    }
    sync.current().ok_or(EditError::PlanNotLoaded)
}

fn noop() -> PendingWrite {
    future::ready(Ok(())).boxed()
}

/// Append a new entry built from `draft`. Returns the new entry's id and the
/// pending write.
pub fn add<E: ListEditor>(
    sync: &PlanSync,
    draft: E::Draft,
) -> Result<(ItemId, PendingWrite), EditError> {
    let doc = loaded(sync)?;
    let entry = E::build(draft)?;
    let id = entry.id().clone();
    let next = appended(E::entries(doc), entry);
    let field = E::FIELD;
    debug!(%field, id = %id, "Adding entry");
    let write = sync.upsert_field(E::update(next))?;
    Ok((id, write))
}

/// Remove the entry with `id`. Absent ids are a silent no-op that issues no
/// write.
pub fn remove<E: ListEditor>(sync: &PlanSync, id: &ItemId) -> Result<PendingWrite, EditError> {
    let doc = loaded(sync)?;
    match without(E::entries(doc), id) {
        Some(next) => Ok(sync.upsert_field(E::update(next))?),
        None => {
            let field = E::FIELD;
            debug!(%field, id = %id, "Remove of unknown entry ignored");
            Ok(noop())
        }
    }
}

pub fn toggle_packed(sync: &PlanSync, id: &ItemId) -> Result<PendingWrite, EditError> {
    let doc = loaded(sync)?;
    match toggled(&doc.packing, id) {
        Some(next) => Ok(sync.upsert_field(PackingEditor::update(next))?),
        None => {
            debug!(id = %id, "Toggle of unknown packing item ignored");
            Ok(noop())
        }
    }
}
