use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Stable, unique identifier of one row. Never reused within a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const NULL: Value = Value::Null;

/// One immutable record of displayable data.
///
/// Field display order comes from the column definitions, never from the
/// map; a missing key reads as `Null`. Updates replace the whole row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: RowId,
    values: FxHashMap<String, Value>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self { id, values: FxHashMap::default() }
    }

    pub fn from_values(id: RowId, values: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self { id, values: values.into_iter().collect() }
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    /// Value for a column key; missing keys read as `Null`.
    pub fn get(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }

    /// Builder-style field assignment, used when constructing snapshots.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// A new snapshot with the patch's keys merged over this row's fields.
    pub fn patched(&self, patch: &RowPatch) -> Row {
        let mut values = self.values.clone();
        for (key, value) in patch.iter() {
            values.insert(key.clone(), value.clone());
        }
        Row { id: self.id, values }
    }
}

/// A partial row: only the changed keys, applied by structural merge.
///
/// This is the whole of the update representation; there is no per-field
/// conditional logic anywhere downstream of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPatch {
    changes: FxHashMap<String, Value>,
}

impl RowPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.changes.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.changes.iter()
    }
}
