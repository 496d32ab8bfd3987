use crate::column::ColumnDef;
use crate::filter::{filter_ids, FilterSpec};
use crate::group::{build_group_tree, AggregateResult, GroupChildren, GroupNode};
use crate::row::RowId;
use crate::sort::{sort_ids, SortSpec};
use crate::store::RowStore;
use crate::value::Value;
use crate::viewport::RowOffsets;

/// The view-state knobs: what to hide, how to order, how to nest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: FilterSpec,
    pub sort: Option<SortSpec>,
    pub group_path: Vec<String>,
}

/// One element of the flattened display sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRow {
    /// A group header row.
    Group {
        column: String,
        value: Value,
        depth: usize,
        leaf_count: usize,
        aggregates: Vec<AggregateResult>,
    },
    /// A data row. Depth is 0 when ungrouped, path length when grouped.
    Leaf { row_id: RowId, depth: usize },
}

impl DisplayRow {
    pub fn is_leaf(&self) -> bool {
        matches!(self, DisplayRow::Leaf { .. })
    }
}

/// Output of one pipeline pass.
///
/// Derived from a single store snapshot in one synchronous sweep, so the
/// sorter, grouper, and viewport never see torn state. Identical inputs
/// produce an identical snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Flattened header+leaf sequence the viewport virtualizes over.
    pub display: Vec<DisplayRow>,
    /// Filtered+sorted ungrouped leaf order; export and shells that need
    /// the plain row sequence read this.
    pub visible_ids: Vec<RowId>,
}

impl Snapshot {
    /// Offset table for the display sequence with the given heights.
    pub fn row_offsets(&self, leaf_height: u32, header_height: u32) -> RowOffsets {
        RowOffsets::from_heights(self.display.iter().map(|row| match row {
            DisplayRow::Group { .. } => header_height,
            DisplayRow::Leaf { .. } => leaf_height,
        }))
    }

    pub fn len(&self) -> usize {
        self.display.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display.is_empty()
    }
}

/// Run filter → sort → group over the store and flatten the result.
///
/// Rebuilt in full on every relevant change; group nodes are never patched
/// incrementally.
pub fn refresh(store: &RowStore, columns: &[ColumnDef], state: &ViewState) -> Snapshot {
    let filtered = filter_ids(store, columns, &state.filter);
    let visible_ids = sort_ids(store, columns, state.sort.as_ref(), filtered);

    let tree = build_group_tree(store, columns, &state.group_path, &visible_ids);
    let display = if tree.is_empty() {
        visible_ids
            .iter()
            .map(|&row_id| DisplayRow::Leaf { row_id, depth: 0 })
            .collect()
    } else {
        let mut out = Vec::new();
        flatten(tree, &mut out);
        out
    };

    Snapshot { display, visible_ids }
}

fn flatten(nodes: Vec<GroupNode>, out: &mut Vec<DisplayRow>) {
    for node in nodes {
        let leaf_depth = node.depth + 1;
        out.push(DisplayRow::Group {
            column: node.column,
            value: node.value,
            depth: node.depth,
            leaf_count: node.leaf_count,
            aggregates: node.aggregates,
        });
        match node.children {
            GroupChildren::Groups(children) => flatten(children, out),
            GroupChildren::Leaves(ids) => out.extend(
                ids.into_iter().map(|row_id| DisplayRow::Leaf { row_id, depth: leaf_depth }),
            ),
        }
    }
}
