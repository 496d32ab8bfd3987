//! Merges inbound change events into the row store.
//!
//! Pure classification over one store: events apply synchronously, in
//! arrival order, and always succeed or are dropped. Coordination with the
//! edit session and selection set happens one level up in the grid facade.

use crate::column::ColumnDef;
use crate::error::GridError;
use crate::events::{ChangeEvent, ChangeKind};
use crate::row::{Row, RowId};
use crate::store::RowStore;
use crate::value::Value;

/// What applying one event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `created` for a new id.
    Inserted,
    /// Full-row replace of an existing id (including a duplicate `created`,
    /// which upserts idempotently).
    Replaced,
    /// An update-family event for an absent id, treated as a create
    /// (out-of-order delivery before the `created` arrived).
    ImplicitCreated,
    /// `deleted` removed the row.
    Removed,
    /// `deleted` for an id that was never there. Nothing changed.
    Ignored,
}

impl Outcome {
    /// Whether the store contents changed.
    pub fn mutated(&self) -> bool {
        !matches!(self, Outcome::Ignored)
    }
}

/// Running totals per outcome, for replay summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub inserted: u64,
    pub replaced: u64,
    pub implicit_created: u64,
    pub removed: u64,
    pub ignored: u64,
    pub dropped: u64,
}

impl ReconcileStats {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Replaced => self.replaced += 1,
            Outcome::ImplicitCreated => self.implicit_created += 1,
            Outcome::Removed => self.removed += 1,
            Outcome::Ignored => self.ignored += 1,
        }
    }

    pub fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    pub fn applied(&self) -> u64 {
        self.inserted + self.replaced + self.implicit_created + self.removed
    }
}

/// Apply one change event to the store.
///
/// Malformed events (missing `row_id`, or an update-family event with no
/// row payload) are returned as `MalformedEvent` for the caller to report;
/// the store is untouched. Payload fields are coerced by the column
/// schema; fields naming no declared column are ignored, and fields that
/// fail coercion land as `Null` rather than erroring the event.
pub fn apply(
    store: &mut RowStore,
    columns: &[ColumnDef],
    event: &ChangeEvent,
) -> Result<Outcome, GridError> {
    let row_id = event.row_id.ok_or_else(|| GridError::MalformedEvent {
        reason: format!("{} event missing rowId", event.kind.name()),
    })?;

    match event.kind {
        ChangeKind::Deleted => Ok(match store.remove(row_id) {
            Some(_) => Outcome::Removed,
            None => Outcome::Ignored,
        }),
        ChangeKind::Created => {
            let row = payload_row(row_id, event, columns)?;
            Ok(match store.insert(row) {
                Some(_) => Outcome::Replaced,
                None => Outcome::Inserted,
            })
        }
        ChangeKind::Updated | ChangeKind::Terminated | ChangeKind::Unterminated => {
            let row = payload_row(row_id, event, columns)?;
            Ok(match store.insert(row) {
                Some(_) => Outcome::Replaced,
                None => Outcome::ImplicitCreated,
            })
        }
    }
}

fn payload_row(
    row_id: RowId,
    event: &ChangeEvent,
    columns: &[ColumnDef],
) -> Result<Row, GridError> {
    let payload = event.row.as_ref().ok_or_else(|| GridError::MalformedEvent {
        reason: format!("{} event for row {row_id} missing row payload", event.kind.name()),
    })?;

    let mut row = Row::new(row_id);
    for column in columns {
        if let Some(json) = payload.get(&column.key) {
            let value = Value::from_json(json, &column.ty).unwrap_or(Value::Null);
            row = row.with(column.key.clone(), value);
        }
    }
    Ok(row)
}
