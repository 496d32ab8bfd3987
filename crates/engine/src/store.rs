use rustc_hash::FxHashMap;

use crate::row::{Row, RowId};

/// The flat set of current rows, keyed by row id.
///
/// Ids are unique at all times: inserting an existing id replaces the row.
/// Display code never iterates the map directly; it goes through
/// [`RowStore::ids_sorted`] so output order stays deterministic.
#[derive(Debug, Default)]
pub struct RowStore {
    rows: FxHashMap<RowId, Row>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous row when the id was present.
    pub fn insert(&mut self, row: Row) -> Option<Row> {
        self.rows.insert(row.id(), row)
    }

    pub fn remove(&mut self, id: RowId) -> Option<Row> {
        self.rows.remove(&id)
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: RowId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All row ids ascending: the identity display order when no sort key
    /// is active.
    pub fn ids_sorted(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self.rows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
