//! The grid facade: one type owning the store, view state, selection,
//! edit session, and viewport, exposing the gesture-driven entry points
//! shells call.
//!
//! Every mutation refreshes the display snapshot synchronously before
//! returning, so one pass over the grid always reads a single consistent
//! store snapshot and the viewport never serves a stale frame.

use crate::column::{ColumnDef, ColumnState, DEFAULT_COLUMN_WIDTH};
use crate::edit::{CommitRequest, EditSession};
use crate::error::GridError;
use crate::events::{ChangeEvent, EventCallback, GridEvent};
use crate::filter::FilterSpec;
use crate::pipeline::{self, DisplayRow, Snapshot, ViewState};
use crate::reconcile::{self, Outcome, ReconcileStats};
use crate::row::{Row, RowId};
use crate::selection::Selection;
use crate::sort::SortSpec;
use crate::store::RowStore;
use crate::value::Value;
use crate::viewport::{RowRange, Viewport, DEFAULT_OVERSCAN};

/// Geometry knobs, usually fed from persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOptions {
    pub row_height: u32,
    pub header_height: u32,
    pub overscan: usize,
    pub container_height: u32,
    /// Width given to every column until a persisted layout is applied.
    pub default_column_width: u32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_height: 24,
            header_height: 32,
            overscan: DEFAULT_OVERSCAN,
            container_height: 600,
            default_column_width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

/// One display cell resolved to text, in visible-column layout order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCell {
    pub column_key: String,
    pub text: String,
}

/// Renderable descriptor for one row of the visible window.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRow {
    /// A group header: the bucket value plus its rollups, rendered as text.
    Group {
        depth: usize,
        column_label: String,
        value: String,
        leaf_count: usize,
        /// `(column label, aggregate name, value text)` per aggregated column.
        aggregates: Vec<(String, &'static str, String)>,
    },
    Leaf {
        row_id: RowId,
        depth: usize,
        selected: bool,
        /// A commit for one of this row's cells is in flight; the shell
        /// shows a pending indicator, not the new value.
        pending: bool,
        cells: Vec<RenderCell>,
    },
}

/// A live data grid over a schema of columns.
pub struct Grid {
    columns: Vec<ColumnDef>,
    column_states: Vec<ColumnState>,
    options: GridOptions,
    store: RowStore,
    selection: Selection,
    view: ViewState,
    snapshot: Snapshot,
    viewport: Viewport,
    edit: EditSession,
    stats: ReconcileStats,
    revision: u64,
    callback: Option<EventCallback>,
}

impl Grid {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self::with_options(columns, GridOptions::default())
    }

    pub fn with_options(columns: Vec<ColumnDef>, options: GridOptions) -> Self {
        let column_states = columns
            .iter()
            .enumerate()
            .map(|(position, c)| ColumnState {
                key: c.key.clone(),
                width: options.default_column_width,
                visible: true,
                position,
            })
            .collect();
        Self {
            columns,
            column_states,
            options,
            store: RowStore::new(),
            selection: Selection::new(),
            view: ViewState::default(),
            snapshot: Snapshot::default(),
            viewport: Viewport::new(options.container_height, options.overscan),
            edit: EditSession::new(),
            stats: ReconcileStats::default(),
            revision: 0,
            callback: None,
        }
    }

    /// Register the shell's event callback. Replaces any previous one.
    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }

    fn emit(&mut self, event: GridEvent) {
        if let Some(callback) = &mut self.callback {
            callback(&event);
        }
    }

    /// Rebuild the snapshot and viewport offsets from current state; bump
    /// the revision and notify the shell.
    fn refresh(&mut self) {
        self.snapshot = pipeline::refresh(&self.store, &self.columns, &self.view);
        self.viewport.set_offsets(
            self.snapshot
                .row_offsets(self.options.row_height, self.options.header_height),
        );
        self.revision += 1;
        self.emit(GridEvent::SnapshotRefreshed { revision: self.revision });
    }

    // -- data in ------------------------------------------------------------

    /// Install the initial (or re-fetched) row set, replacing any previous
    /// contents. Selection and edit state are reset; paging is the
    /// caller's concern.
    pub fn load_rows(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.store.clear();
        self.selection.clear();
        self.edit = EditSession::new();
        for row in rows {
            self.store.insert(row);
        }
        self.refresh();
    }

    /// Apply one pushed change event through the reconciler.
    ///
    /// Malformed events are dropped and reported through the callback;
    /// deletes force-cancel any edit on the row and prune the selection.
    pub fn apply_change(&mut self, event: &ChangeEvent) {
        match reconcile::apply(&mut self.store, &self.columns, event) {
            Ok(outcome) => {
                self.stats.record(outcome);
                if outcome == Outcome::Removed {
                    let row_id = event.row_id.expect("removed outcome implies a row id");
                    self.edit.force_cancel(row_id);
                    self.selection.deselect(row_id);
                }
                if outcome.mutated() {
                    self.refresh();
                }
            }
            Err(err) => {
                self.stats.record_dropped();
                self.emit(GridEvent::EventDropped { reason: err.to_string() });
            }
        }
    }

    /// Apply a batch of events in arrival order.
    pub fn apply_changes<'a>(&mut self, events: impl IntoIterator<Item = &'a ChangeEvent>) {
        for event in events {
            self.apply_change(event);
        }
    }

    pub fn reconcile_stats(&self) -> ReconcileStats {
        self.stats
    }

    // -- view-state gestures ------------------------------------------------

    pub fn on_sort_change(&mut self, sort: Option<SortSpec>) {
        self.view.sort = sort;
        self.refresh();
    }

    pub fn on_filter_change(&mut self, filter: FilterSpec) {
        self.view.filter = filter;
        self.refresh();
    }

    pub fn on_group_path_change(&mut self, path: Vec<String>) {
        self.view.group_path = path;
        self.refresh();
    }

    /// Replace the selection wholesale. Selection is view-independent and
    /// does not move the snapshot, so no refresh happens here.
    pub fn on_selection_change(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.selection.set(ids);
    }

    pub fn toggle_selected(&mut self, id: RowId) {
        self.selection.toggle(id);
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    // -- editing ------------------------------------------------------------

    pub fn edit_start(&mut self, row_id: RowId, column_key: &str) -> Result<(), GridError> {
        self.edit.begin(&self.store, &self.columns, row_id, column_key)
    }

    pub fn edit_input(&mut self, text: impl Into<String>) {
        self.edit.input(text);
    }

    pub fn edit_cancel(&mut self) -> bool {
        self.edit.cancel()
    }

    /// Validate the pending value and hand back the request the transport
    /// must perform. The pending cell renders flagged until the resolve.
    pub fn edit_commit(&mut self) -> Result<CommitRequest, GridError> {
        let request = self.edit.commit(&self.store, &self.columns)?;
        // the pending flag on the cell changed
        self.refresh();
        Ok(request)
    }

    /// Feed back the external commit's completion.
    ///
    /// Last write wins by arrival: a change event already applied for the
    /// row is simply overwritten by the resolved server row, and a row
    /// deleted mid-commit fires the failure path with the result
    /// discarded. Stale request ids are ignored.
    pub fn edit_resolve(
        &mut self,
        request_id: u64,
        result: Result<Row, String>,
    ) -> Result<(), GridError> {
        let Some((row_id, column_key)) = self.edit.take_committing(request_id) else {
            return Ok(());
        };

        match result {
            Ok(row) if row.id() != row_id => {
                // a row keyed by the wrong id must never enter the store
                let reason =
                    format!("resolved row has id {}, expected {}", row.id().0, row_id.0);
                self.emit(GridEvent::EditFailed {
                    row_id,
                    column_key,
                    reason: reason.clone(),
                });
                self.refresh();
                Err(GridError::Transport { reason })
            }
            Ok(row) if self.store.contains(row_id) => {
                // the normal updated path: full-row replace
                self.store.insert(row);
                self.refresh();
                Ok(())
            }
            Ok(_) => {
                let err = GridError::NotFound { row_id };
                self.emit(GridEvent::EditFailed {
                    row_id,
                    column_key,
                    reason: err.to_string(),
                });
                self.refresh();
                Err(err)
            }
            Err(reason) => {
                self.emit(GridEvent::EditFailed {
                    row_id,
                    column_key,
                    reason: reason.clone(),
                });
                self.refresh();
                Err(GridError::Transport { reason })
            }
        }
    }

    pub fn editing_cell(&self) -> Option<(RowId, &str)> {
        self.edit.editing_cell()
    }

    // -- viewport + rendering -----------------------------------------------

    pub fn scroll_to(&mut self, offset: u32) {
        self.viewport.scroll_to(offset);
    }

    pub fn resize(&mut self, container_height: u32) {
        self.viewport.resize(container_height);
    }

    pub fn total_height(&self) -> u32 {
        self.viewport.total_height()
    }

    /// Plan the window for the current scroll position. Returns `None`
    /// when there is nothing to display.
    pub fn plan_viewport(&mut self) -> Option<RowRange> {
        self.viewport.plan().0
    }

    /// Materialize renderable descriptors for the given window only. The
    /// range is clamped to the snapshot, so a stale range from before a
    /// data change cannot overrun.
    pub fn render(&self, range: RowRange) -> Vec<RenderRow> {
        let visible = self.visible_columns();
        let pending_cell = self.edit.committing_cell().map(|(id, _)| id);

        self.snapshot
            .display
            .iter()
            .skip(range.first)
            .take(range.len().min(self.snapshot.len().saturating_sub(range.first)))
            .map(|display| match display {
                DisplayRow::Group { column, value, depth, leaf_count, aggregates } => {
                    RenderRow::Group {
                        depth: *depth,
                        column_label: self.label_of(column),
                        value: value.to_string(),
                        leaf_count: *leaf_count,
                        aggregates: aggregates
                            .iter()
                            .map(|a| (self.label_of(&a.column), a.func.name(), a.value.to_string()))
                            .collect(),
                    }
                }
                DisplayRow::Leaf { row_id, depth } => {
                    let cells = visible
                        .iter()
                        .map(|col| RenderCell {
                            column_key: col.key.clone(),
                            text: self.cell_text(*row_id, &col.key),
                        })
                        .collect();
                    RenderRow::Leaf {
                        row_id: *row_id,
                        depth: *depth,
                        selected: self.selection.contains(*row_id),
                        pending: pending_cell == Some(*row_id),
                        cells,
                    }
                }
            })
            .collect()
    }

    /// Plan and render in one step: the whole currently-scrolled window.
    pub fn render_window(&mut self) -> Vec<RenderRow> {
        match self.plan_viewport() {
            Some(range) => self.render(range),
            None => Vec::new(),
        }
    }

    fn cell_text(&self, row_id: RowId, key: &str) -> String {
        self.store.get(row_id).map(|row| row.get(key).to_string()).unwrap_or_default()
    }

    fn label_of(&self, key: &str) -> String {
        self.columns
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| key.to_string())
    }

    // -- read access --------------------------------------------------------

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Visible columns in layout order; export and rendering both follow it.
    pub fn visible_columns(&self) -> Vec<&ColumnDef> {
        let mut states: Vec<&ColumnState> =
            self.column_states.iter().filter(|s| s.visible).collect();
        states.sort_by_key(|s| s.position);
        states
            .iter()
            .filter_map(|s| self.columns.iter().find(|c| c.key == s.key))
            .collect()
    }

    /// The filtered+sorted ungrouped leaf order; `exportVisible` reads this.
    pub fn visible_rows(&self) -> &[RowId] {
        &self.snapshot.visible_ids
    }

    pub fn display_len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.store.get(id)
    }

    pub fn row_count(&self) -> usize {
        self.store.len()
    }

    pub fn value(&self, id: RowId, key: &str) -> Value {
        self.store.get(id).map(|row| row.get(key).clone()).unwrap_or(Value::Null)
    }

    /// Bumped on every change that can affect output.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -- column layout ------------------------------------------------------

    /// Current layout, ordered by display position, for persistence.
    pub fn layout(&self) -> Vec<ColumnState> {
        let mut states = self.column_states.clone();
        states.sort_by_key(|s| s.position);
        states
    }

    /// Apply a persisted layout at mount. Entries naming unknown columns
    /// are ignored; columns absent from the layout keep their defaults but
    /// are pushed after the applied ones.
    pub fn apply_layout(&mut self, entries: &[ColumnState]) {
        let applied = entries.len();
        let mut leftover = 0usize;
        for state in &mut self.column_states {
            match entries.iter().find(|e| e.key == state.key) {
                Some(entry) => {
                    state.width = entry.width;
                    state.visible = entry.visible;
                    state.position = entry.position;
                }
                None => {
                    state.position = applied + leftover;
                    leftover += 1;
                }
            }
        }
        self.emit(GridEvent::LayoutChanged);
    }

    pub fn set_column_width(&mut self, key: &str, width: u32) {
        if let Some(state) = self.column_states.iter_mut().find(|s| s.key == key) {
            state.width = width;
            self.emit(GridEvent::LayoutChanged);
        }
    }

    pub fn set_column_visible(&mut self, key: &str, visible: bool) {
        if let Some(state) = self.column_states.iter_mut().find(|s| s.key == key) {
            state.visible = visible;
            self.emit(GridEvent::LayoutChanged);
        }
    }

    /// Move a column to a new display position, shifting the others.
    pub fn move_column(&mut self, key: &str, to: usize) {
        let mut order: Vec<String> = self.layout().into_iter().map(|s| s.key).collect();
        let Some(from) = order.iter().position(|k| k == key) else {
            return;
        };
        let moved = order.remove(from);
        order.insert(to.min(order.len()), moved);
        for state in &mut self.column_states {
            if let Some(position) = order.iter().position(|k| *k == state.key) {
                state.position = position;
            }
        }
        self.emit(GridEvent::LayoutChanged);
    }
}
