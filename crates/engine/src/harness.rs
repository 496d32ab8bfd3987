//! Test harness for scripted grid scenarios with event tracking.
//!
//! `GridHarness` wraps a `Grid` with a shared event collector and applies
//! whole scripts of gestures and change events, so tests can exercise the
//! filter/sort/group/edit/reconcile surface end to end without a shell.

use crate::column::{Aggregate, ColumnDef};
use crate::edit::CommitRequest;
use crate::error::GridError;
use crate::events::{ChangeEvent, EventCollector};
use crate::filter::FilterSpec;
use crate::grid::{Grid, GridOptions, RenderRow};
use crate::row::{Row, RowId};
use crate::sort::SortSpec;
use crate::value::{ColumnType, Value};

/// One scripted step.
#[derive(Debug, Clone)]
pub enum Op {
    Load(Vec<Row>),
    Change(ChangeEvent),
    Sort(Option<SortSpec>),
    Filter(FilterSpec),
    Group(Vec<String>),
    Select(Vec<RowId>),
    EditStart { row_id: RowId, column_key: String },
    EditInput(String),
    EditCancel,
    /// Commit and immediately resolve with the patched prior row.
    EditCommitOk,
    /// Commit and immediately resolve with a transport error.
    EditCommitErr(String),
    Scroll(u32),
}

pub struct GridHarness {
    grid: Grid,
    events: EventCollector,
    /// A commit left in flight by `commit_pending`.
    in_flight: Option<CommitRequest>,
}

impl GridHarness {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self::with_options(columns, GridOptions::default())
    }

    pub fn with_options(columns: Vec<ColumnDef>, options: GridOptions) -> Self {
        let events = EventCollector::new();
        let mut grid = Grid::with_options(columns, options);
        grid.set_event_callback(events.callback());
        Self { grid, events, in_flight: None }
    }

    /// The standard three-person fixture most scenario tests start from.
    pub fn people() -> Self {
        let columns = vec![
            ColumnDef::new("name", "Name", ColumnType::Text).editable(true),
            ColumnDef::new("dept", "Dept", ColumnType::Text),
            ColumnDef::new("salary", "Salary", ColumnType::Number)
                .searchable(false)
                .editable(true)
                .aggregate(Aggregate::Sum),
        ];
        let mut harness = Self::new(columns);
        harness.grid.load_rows([
            Self::person(1, "Ann", "Eng", 100.0),
            Self::person(2, "Bo", "Eng", 80.0),
            Self::person(3, "Cy", "Ops", 60.0),
        ]);
        harness.events.clear();
        harness
    }

    pub fn person(id: i64, name: &str, dept: &str, salary: f64) -> Row {
        Row::new(RowId(id))
            .with("name", Value::Text(name.into()))
            .with("dept", Value::Text(dept.into()))
            .with("salary", Value::Number(salary))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn events(&self) -> &EventCollector {
        &self.events
    }

    /// Apply a script in order. Errors from individual steps are returned
    /// as `(step index, error)`; the script stops at the first failure.
    pub fn apply_ops(&mut self, ops: &[Op]) -> Result<(), (usize, GridError)> {
        for (index, op) in ops.iter().enumerate() {
            self.apply_op(op).map_err(|e| (index, e))?;
        }
        Ok(())
    }

    fn apply_op(&mut self, op: &Op) -> Result<(), GridError> {
        match op {
            Op::Load(rows) => self.grid.load_rows(rows.clone()),
            Op::Change(event) => self.grid.apply_change(event),
            Op::Sort(spec) => self.grid.on_sort_change(spec.clone()),
            Op::Filter(spec) => self.grid.on_filter_change(spec.clone()),
            Op::Group(path) => self.grid.on_group_path_change(path.clone()),
            Op::Select(ids) => self.grid.on_selection_change(ids.iter().copied()),
            Op::EditStart { row_id, column_key } => {
                self.grid.edit_start(*row_id, column_key)?;
            }
            Op::EditInput(text) => self.grid.edit_input(text.clone()),
            Op::EditCancel => {
                self.grid.edit_cancel();
            }
            Op::EditCommitOk => {
                let request = self.grid.edit_commit()?;
                let server_row = request.prior.patched(&request.patch);
                self.grid.edit_resolve(request.request_id, Ok(server_row))?;
            }
            Op::EditCommitErr(reason) => {
                let request = self.grid.edit_commit()?;
                // the failure itself is the scripted outcome, not an error
                let _ = self.grid.edit_resolve(request.request_id, Err(reason.clone()));
            }
            Op::Scroll(offset) => self.grid.scroll_to(*offset),
        }
        Ok(())
    }

    /// Commit the current edit but leave the resolve to the test.
    pub fn commit_pending(&mut self) -> Result<&CommitRequest, GridError> {
        let request = self.grid.edit_commit()?;
        self.in_flight = Some(request);
        Ok(self.in_flight.as_ref().expect("just stored"))
    }

    /// Resolve the commit left by `commit_pending`.
    pub fn resolve_pending(&mut self, result: Result<Row, String>) -> Result<(), GridError> {
        let request = self.in_flight.take().expect("no commit in flight");
        self.grid.edit_resolve(request.request_id, result)
    }

    /// Leaf row ids of the current window, top to bottom.
    pub fn rendered_leaf_ids(&mut self) -> Vec<RowId> {
        self.grid
            .render_window()
            .into_iter()
            .filter_map(|row| match row {
                RenderRow::Leaf { row_id, .. } => Some(row_id),
                _ => None,
            })
            .collect()
    }

    /// Group header `(value, leaf_count)` pairs of the current window.
    pub fn rendered_groups(&mut self) -> Vec<(String, usize)> {
        self.grid
            .render_window()
            .into_iter()
            .filter_map(|row| match row {
                RenderRow::Group { value, leaf_count, .. } => Some((value, leaf_count)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChangeKind;
    use serde_json::json;

    #[test]
    fn test_scripted_view_changes() {
        let mut harness = GridHarness::people();
        harness
            .apply_ops(&[
                Op::Filter(FilterSpec::quick("e")),
                Op::Sort(Some(SortSpec::descending("salary"))),
                Op::Group(vec!["dept".to_string()]),
            ])
            .unwrap();

        // "e" only hits the Eng rows (dept is searchable, salary is not)
        assert_eq!(harness.rendered_groups(), vec![("Eng".to_string(), 2)]);
        assert_eq!(harness.rendered_leaf_ids(), vec![RowId(1), RowId(2)]);
        // three view changes, three refreshes
        assert_eq!(harness.events().refreshed_revisions().len(), 3);
    }

    #[test]
    fn test_scripted_edit_commit_round_trip() {
        let mut harness = GridHarness::people();
        harness
            .apply_ops(&[
                Op::EditStart { row_id: RowId(1), column_key: "name".into() },
                Op::EditInput("Anna".into()),
                Op::EditCommitOk,
            ])
            .unwrap();
        assert_eq!(harness.grid().value(RowId(1), "name"), Value::Text("Anna".into()));
        assert!(harness.events().edit_failures().is_empty());
    }

    #[test]
    fn test_scripted_edit_failure_reverts() {
        let mut harness = GridHarness::people();
        harness
            .apply_ops(&[
                Op::EditStart { row_id: RowId(1), column_key: "name".into() },
                Op::EditInput("Anna".into()),
                Op::EditCommitErr("duplicate email".into()),
            ])
            .unwrap();

        assert_eq!(harness.grid().value(RowId(1), "name"), Value::Text("Ann".into()));
        assert_eq!(
            harness.events().edit_failures(),
            vec![(RowId(1), "name".to_string(), "duplicate email".to_string())]
        );
    }

    #[test]
    fn test_script_stops_at_first_failure() {
        let mut harness = GridHarness::people();
        let err = harness
            .apply_ops(&[
                Op::EditStart { row_id: RowId(9), column_key: "name".into() },
                Op::EditInput("never reached".into()),
            ])
            .unwrap_err();
        assert_eq!(err.0, 0);
        assert_eq!(err.1, GridError::NotFound { row_id: RowId(9) });
    }

    #[test]
    fn test_event_stream_interleaved_with_edits() {
        let mut harness = GridHarness::people();
        harness
            .apply_ops(&[
                Op::EditStart { row_id: RowId(2), column_key: "salary".into() },
                Op::EditInput("85".into()),
            ])
            .unwrap();
        let _request = harness.commit_pending().unwrap();

        // the row is deleted while the commit is in flight
        harness
            .apply_ops(&[Op::Change(ChangeEvent::new(ChangeKind::Deleted, RowId(2)))])
            .unwrap();

        // the late resolve is stale and discarded
        harness
            .resolve_pending(Ok(GridHarness::person(2, "Bo", "Eng", 85.0)))
            .unwrap();
        assert!(harness.grid().row(RowId(2)).is_none());
        assert_eq!(harness.grid().row_count(), 2);
    }

    #[test]
    fn test_grouped_totals_follow_change_events() {
        let mut harness = GridHarness::people();
        harness.apply_ops(&[Op::Group(vec!["dept".to_string()])]).unwrap();

        harness
            .apply_ops(&[Op::Change(
                ChangeEvent::new(ChangeKind::Created, RowId(4))
                    .with_field("name", json!("Dee"))
                    .with_field("dept", json!("Ops"))
                    .with_field("salary", json!(40)),
            )])
            .unwrap();

        assert_eq!(
            harness.rendered_groups(),
            vec![("Eng".to_string(), 2), ("Ops".to_string(), 2)]
        );
    }
}
