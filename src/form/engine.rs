use serde_json::Value;
use tracing::debug;

use crate::domain::{FieldId, FieldValue, FormRecord, StepId, normalize};

use super::computed::{recompute, recompute_all};

/// The notice produced by one accepted mutation: which fields moved, and the
/// fully reconciled record after the move.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordChange<R: FormRecord> {
    pub changed: Vec<R::Field>,
    pub record: R,
}

impl<R: FormRecord> RecordChange<R> {
    pub fn step(&self) -> StepId {
        R::STEP
    }

    pub fn touched(&self, field: R::Field) -> bool {
        self.changed.contains(&field)
    }

    pub fn changed_names(&self) -> Vec<&'static str> {
        self.changed.iter().map(|field| field.name()).collect()
    }

    /// Wire form of the record; dates become `YYYY-MM-DD` strings.
    pub fn to_payload(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.record)
    }
}

/// Owns one step record and is the only place it is mutated.
///
/// Every accepted update clears dependents transitively, re-derives computed
/// fields, and yields exactly one [`RecordChange`]. Updates that change
/// nothing yield `None`.
#[derive(Debug, Clone)]
pub struct FormEngine<R: FormRecord> {
    record: R,
}

impl<R: FormRecord> Default for FormEngine<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: FormRecord> FormEngine<R> {
    pub fn new(record: R) -> Self {
        let mut engine = Self {
            record: R::default(),
        };
        engine.seed(record);
        engine
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn get(&self, field: R::Field) -> Option<FieldValue> {
        self.record.get(field)
    }

    /// Replaces the record as-is: no dependents are cleared and no notice is
    /// produced. Computed fields are brought in line silently.
    pub fn seed(&mut self, record: R) {
        self.record = record;
        let moved = recompute_all(&mut self.record);
        if !moved.is_empty() {
            debug!(step = %R::STEP, fields = ?moved, "seeded record had stale computed fields");
        }
    }

    pub fn update_field(
        &mut self,
        field: R::Field,
        value: Option<FieldValue>,
    ) -> Option<RecordChange<R>> {
        self.update_fields([(field, value)])
    }

    /// Applies several user edits as one logical update with a single notice.
    pub fn update_fields(
        &mut self,
        edits: impl IntoIterator<Item = (R::Field, Option<FieldValue>)>,
    ) -> Option<RecordChange<R>> {
        self.apply(edits, true)
    }

    /// String-keyed entry point. Unknown names are ignored.
    pub fn update_named(&mut self, name: &str, value: Option<FieldValue>) -> Option<RecordChange<R>> {
        let Some(field) = R::Field::from_name(name) else {
            debug!(step = %R::STEP, name, "ignoring update for unknown field");
            return None;
        };
        self.update_field(field, value)
    }

    /// Sets a field fed from outside the step (see [`FormRecord::inbound`]).
    pub fn sync_inbound(
        &mut self,
        field: R::Field,
        value: Option<FieldValue>,
    ) -> Option<RecordChange<R>> {
        if !R::inbound().contains(&field) {
            debug!(step = %R::STEP, field = field.name(), "not an inbound field");
            return None;
        }
        self.apply([(field, value)], false)
    }

    /// Recomputes every computed field; `None` when nothing moved.
    pub fn reconcile(&mut self) -> Option<RecordChange<R>> {
        let changed = recompute_all(&mut self.record);
        self.notice(changed)
    }

    /// Mutates data that lives on the record but outside the field set (drawn
    /// shapes). `edit` returns whether anything changed; fields it touched
    /// along the way are reported in the notice.
    pub fn edit_attachments<E>(
        &mut self,
        edit: impl FnOnce(&mut R) -> Result<bool, E>,
    ) -> Result<Option<RecordChange<R>>, E> {
        let mut draft = self.record.clone();
        if !edit(&mut draft)? {
            return Ok(None);
        }
        let mut changed: Vec<R::Field> = R::Field::all()
            .iter()
            .copied()
            .filter(|&field| draft.get(field) != self.record.get(field))
            .collect();
        self.record = draft;
        for moved in recompute_all(&mut self.record) {
            push_unique(&mut changed, moved);
        }
        Ok(Some(RecordChange {
            changed,
            record: self.record.clone(),
        }))
    }

    fn apply(
        &mut self,
        edits: impl IntoIterator<Item = (R::Field, Option<FieldValue>)>,
        from_user: bool,
    ) -> Option<RecordChange<R>> {
        let mut changed = Vec::new();
        for (field, value) in edits {
            if from_user && !R::is_user_editable(field) {
                debug!(step = %R::STEP, field = field.name(), "field is not user editable");
                continue;
            }
            let value = match value {
                Some(value) if !field.kind().accepts(&value) => {
                    debug!(
                        step = %R::STEP,
                        field = field.name(),
                        kind = %field.kind(),
                        "ignoring value of the wrong kind"
                    );
                    continue;
                }
                Some(value) => Some(normalize(field.kind(), value)),
                None => None,
            };
            if self.record.get(field) == value {
                continue;
            }
            self.record.set(field, value.as_ref());
            push_unique(&mut changed, field);
            self.clear_dependents(field, &mut changed);
        }
        if changed.is_empty() {
            return None;
        }
        recompute(&mut self.record, &mut changed);
        self.notice(changed)
    }

    fn clear_dependents(&mut self, field: R::Field, changed: &mut Vec<R::Field>) {
        for &dependent in R::dependents(field) {
            if self.record.get(dependent).is_some() {
                self.record.set(dependent, None);
                push_unique(changed, dependent);
            }
            self.clear_dependents(dependent, changed);
        }
    }

    fn notice(&self, changed: Vec<R::Field>) -> Option<RecordChange<R>> {
        if changed.is_empty() {
            return None;
        }
        Some(RecordChange {
            changed,
            record: self.record.clone(),
        })
    }
}

fn push_unique<F: PartialEq>(changed: &mut Vec<F>, field: F) {
    if !changed.contains(&field) {
        changed.push(field);
    }
}
