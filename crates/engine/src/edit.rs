//! Inline-edit state machine.
//!
//! One cell at a time moves through `Idle -> Editing -> Committing -> Idle`.
//! The pending value is never applied locally: while a commit is in flight
//! the cell keeps showing the original value with a pending flag, and the
//! new value only lands through the resolved server row.

use crate::column::ColumnDef;
use crate::error::GridError;
use crate::row::{Row, RowId, RowPatch};
use crate::store::RowStore;
use crate::value::Value;

/// What the transport needs to perform one commit: the structural patch
/// plus the full prior row, so callers can apply multi-field business rules.
///
/// Request ids are monotonic and never reused; a resolve carrying a stale
/// id is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub request_id: u64,
    pub row_id: RowId,
    pub column_key: String,
    pub patch: RowPatch,
    pub prior: Row,
}

#[derive(Debug)]
enum State {
    Idle,
    Editing { row_id: RowId, column_key: String, original: Value, pending: String },
    Committing { request_id: u64, row_id: RowId, column_key: String },
}

/// The transient state of one in-progress cell edit.
#[derive(Debug)]
pub struct EditSession {
    state: State,
    next_request_id: u64,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self { state: State::Idle, next_request_id: 1 }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    /// The cell currently being typed into, if any.
    pub fn editing_cell(&self) -> Option<(RowId, &str)> {
        match &self.state {
            State::Editing { row_id, column_key, .. } => Some((*row_id, column_key.as_str())),
            _ => None,
        }
    }

    /// The cell with a commit in flight, if any.
    pub fn committing_cell(&self) -> Option<(RowId, &str)> {
        match &self.state {
            State::Committing { row_id, column_key, .. } => Some((*row_id, column_key.as_str())),
            _ => None,
        }
    }

    /// The value captured when the edit started.
    pub fn original(&self) -> Option<&Value> {
        match &self.state {
            State::Editing { original, .. } => Some(original),
            _ => None,
        }
    }

    /// The uncommitted input text.
    pub fn pending(&self) -> Option<&str> {
        match &self.state {
            State::Editing { pending, .. } => Some(pending.as_str()),
            _ => None,
        }
    }

    /// Start editing a cell, capturing its current value.
    ///
    /// Fails without a transition when the column is not editable or the
    /// row is absent. An unsaved edit elsewhere is implicitly cancelled; a
    /// commit in flight blocks new edits until it resolves.
    pub fn begin(
        &mut self,
        store: &RowStore,
        columns: &[ColumnDef],
        row_id: RowId,
        column_key: &str,
    ) -> Result<(), GridError> {
        if let State::Committing { .. } = self.state {
            return Err(GridError::Validation {
                row_id,
                column_key: column_key.to_string(),
                reason: "another edit is still committing".to_string(),
            });
        }
        let column = columns.iter().find(|c| c.key == column_key && c.editable).ok_or_else(|| {
            GridError::Validation {
                row_id,
                column_key: column_key.to_string(),
                reason: format!("column '{column_key}' is not editable"),
            }
        })?;
        let row = store.get(row_id).ok_or(GridError::NotFound { row_id })?;

        let original = row.get(&column.key).clone();
        let pending = original.to_string();
        self.state = State::Editing {
            row_id,
            column_key: column.key.clone(),
            original,
            pending,
        };
        Ok(())
    }

    /// Replace the pending input text. No-op unless editing.
    pub fn input(&mut self, text: impl Into<String>) {
        if let State::Editing { pending, .. } = &mut self.state {
            *pending = text.into();
        }
    }

    /// Discard the pending value with no external call. Returns whether an
    /// edit was actually discarded.
    pub fn cancel(&mut self) -> bool {
        match self.state {
            State::Editing { .. } => {
                self.state = State::Idle;
                true
            }
            _ => false,
        }
    }

    /// Force-cancel any session on `row_id` (the row was deleted).
    ///
    /// A committing session is cancelled too; its in-flight call, when it
    /// resolves, carries a stale request id and is ignored.
    pub fn force_cancel(&mut self, row_id: RowId) -> bool {
        let hit = match &self.state {
            State::Editing { row_id: r, .. } | State::Committing { row_id: r, .. } => *r == row_id,
            State::Idle => false,
        };
        if hit {
            self.state = State::Idle;
        }
        hit
    }

    /// Validate the pending value and produce the commit request.
    ///
    /// Coercion failure is a `Validation` error and the session stays
    /// editing so the user can fix the input. A row deleted since the edit
    /// started is `NotFound` and ends the session.
    pub fn commit(
        &mut self,
        store: &RowStore,
        columns: &[ColumnDef],
    ) -> Result<CommitRequest, GridError> {
        let State::Editing { row_id, column_key, pending, .. } = &self.state else {
            return Err(GridError::Transport { reason: "no edit in progress".to_string() });
        };
        let (row_id, column_key) = (*row_id, column_key.clone());

        let column = columns
            .iter()
            .find(|c| c.key == column_key)
            .expect("editing a column that was validated at begin");
        let value = Value::parse(pending, &column.ty).map_err(|reason| GridError::Validation {
            row_id,
            column_key: column_key.clone(),
            reason,
        })?;

        let Some(prior) = store.get(row_id).cloned() else {
            self.state = State::Idle;
            return Err(GridError::NotFound { row_id });
        };

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.state = State::Committing { request_id, row_id, column_key: column_key.clone() };

        Ok(CommitRequest {
            request_id,
            row_id,
            column_key: column_key.clone(),
            patch: RowPatch::new().set(column_key, value),
            prior,
        })
    }

    /// Close the committing state if `request_id` matches the in-flight
    /// commit, returning its `(row_id, column_key)`. Stale or unexpected
    /// ids return `None` and leave the session untouched.
    pub fn take_committing(&mut self, request_id: u64) -> Option<(RowId, String)> {
        match &self.state {
            State::Committing { request_id: current, row_id, column_key }
                if *current == request_id =>
            {
                let out = (*row_id, column_key.clone());
                self.state = State::Idle;
                Some(out)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::value::ColumnType;

    fn setup() -> (RowStore, Vec<ColumnDef>) {
        let mut store = RowStore::new();
        store.insert(
            Row::new(RowId(1))
                .with("name", Value::Text("Ann".into()))
                .with("salary", Value::Number(100.0)),
        );
        let columns = vec![
            ColumnDef::new("name", "Name", ColumnType::Text).editable(true),
            ColumnDef::new("salary", "Salary", ColumnType::Number).editable(true),
            ColumnDef::new("id_badge", "Badge", ColumnType::Text),
        ];
        (store, columns)
    }

    #[test]
    fn test_begin_captures_original_value() {
        let (store, columns) = setup();
        let mut session = EditSession::new();
        session.begin(&store, &columns, RowId(1), "name").unwrap();

        assert_eq!(session.editing_cell(), Some((RowId(1), "name")));
        assert_eq!(session.original(), Some(&Value::Text("Ann".into())));
        assert_eq!(session.pending(), Some("Ann"));
    }

    #[test]
    fn test_begin_rejects_non_editable_column_and_missing_row() {
        let (store, columns) = setup();
        let mut session = EditSession::new();

        let err = session.begin(&store, &columns, RowId(1), "id_badge").unwrap_err();
        assert!(matches!(err, GridError::Validation { .. }));
        assert!(session.is_idle());

        let err = session.begin(&store, &columns, RowId(99), "name").unwrap_err();
        assert_eq!(err, GridError::NotFound { row_id: RowId(99) });
        assert!(session.is_idle());
    }

    #[test]
    fn test_new_edit_implicitly_cancels_unsaved_edit() {
        let (store, columns) = setup();
        let mut session = EditSession::new();
        session.begin(&store, &columns, RowId(1), "name").unwrap();
        session.input("Anna");

        session.begin(&store, &columns, RowId(1), "salary").unwrap();
        assert_eq!(session.editing_cell(), Some((RowId(1), "salary")));
        assert_eq!(session.pending(), Some("100"));
    }

    #[test]
    fn test_commit_produces_patch_and_prior_row() {
        let (store, columns) = setup();
        let mut session = EditSession::new();
        session.begin(&store, &columns, RowId(1), "name").unwrap();
        session.input("Anna");

        let request = session.commit(&store, &columns).unwrap();
        assert_eq!(request.row_id, RowId(1));
        assert_eq!(request.column_key, "name");
        assert_eq!(request.patch.len(), 1);
        assert_eq!(request.prior.get("name"), &Value::Text("Ann".into()));
        assert_eq!(request.prior.get("salary"), &Value::Number(100.0));
        assert_eq!(session.committing_cell(), Some((RowId(1), "name")));
    }

    #[test]
    fn test_commit_validation_failure_keeps_editing() {
        let (store, columns) = setup();
        let mut session = EditSession::new();
        session.begin(&store, &columns, RowId(1), "salary").unwrap();
        session.input("lots");

        let err = session.commit(&store, &columns).unwrap_err();
        assert!(matches!(err, GridError::Validation { .. }), "{err}");
        // still editing so the user can fix the input
        assert_eq!(session.editing_cell(), Some((RowId(1), "salary")));
        assert_eq!(session.pending(), Some("lots"));
    }

    #[test]
    fn test_begin_while_committing_is_rejected() {
        let (store, columns) = setup();
        let mut session = EditSession::new();
        session.begin(&store, &columns, RowId(1), "name").unwrap();
        session.commit(&store, &columns).unwrap();

        let err = session.begin(&store, &columns, RowId(1), "salary").unwrap_err();
        assert!(err.to_string().contains("still committing"), "{err}");
        assert!(session.committing_cell().is_some());
    }

    #[test]
    fn test_request_ids_are_monotonic_and_stale_resolves_ignored() {
        let (store, columns) = setup();
        let mut session = EditSession::new();

        session.begin(&store, &columns, RowId(1), "name").unwrap();
        let first = session.commit(&store, &columns).unwrap();
        assert!(session.take_committing(first.request_id).is_some());

        session.begin(&store, &columns, RowId(1), "name").unwrap();
        let second = session.commit(&store, &columns).unwrap();
        assert!(second.request_id > first.request_id);

        // a late resolve for the first request must not close the second
        assert!(session.take_committing(first.request_id).is_none());
        assert!(session.committing_cell().is_some());
        assert!(session.take_committing(second.request_id).is_some());
    }

    #[test]
    fn test_force_cancel_hits_editing_and_committing() {
        let (store, columns) = setup();
        let mut session = EditSession::new();

        session.begin(&store, &columns, RowId(1), "name").unwrap();
        assert!(session.force_cancel(RowId(1)));
        assert!(session.is_idle());

        session.begin(&store, &columns, RowId(1), "name").unwrap();
        let request = session.commit(&store, &columns).unwrap();
        assert!(!session.force_cancel(RowId(2)), "other rows are untouched");
        assert!(session.force_cancel(RowId(1)));
        // the in-flight resolve is now stale
        assert!(session.take_committing(request.request_id).is_none());
    }

    #[test]
    fn test_cancel_discards_pending() {
        let (store, columns) = setup();
        let mut session = EditSession::new();
        session.begin(&store, &columns, RowId(1), "name").unwrap();
        session.input("Anna");
        assert!(session.cancel());
        assert!(session.is_idle());
        assert!(!session.cancel(), "cancel when idle is a no-op");
    }
}
