use rustc_hash::FxHashSet;

use crate::row::RowId;

/// Set of selected row ids, independent of the current view.
///
/// Selection survives filter, sort, and grouping changes; ids leave the
/// set only by explicit deselection or row deletion.
#[derive(Debug, Default)]
pub struct Selection {
    ids: FxHashSet<RowId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.ids.contains(&id)
    }

    pub fn select(&mut self, id: RowId) -> bool {
        self.ids.insert(id)
    }

    pub fn deselect(&mut self, id: RowId) -> bool {
        self.ids.remove(&id)
    }

    pub fn toggle(&mut self, id: RowId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Replace the whole selection.
    pub fn set(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids_sorted(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
