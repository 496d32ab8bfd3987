use serde::{Deserialize, Serialize};

use crate::value::ColumnType;

/// Default column width in pixels, used until a persisted layout is applied.
pub const DEFAULT_COLUMN_WIDTH: u32 = 120;

/// Aggregation function applied to a column in grouped views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    #[default]
    None,
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Count => "count",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::None => "none",
        }
    }
}

/// Static definition of one grid column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub key: String,
    pub label: String,
    pub ty: ColumnType,
    pub sortable: bool,
    pub filterable: bool,
    pub editable: bool,
    /// Participates in the free-text quick filter.
    pub searchable: bool,
    /// Renderer hint for the shell (e.g. "badge", "currency"). Opaque here.
    pub renderer: Option<String>,
    pub aggregate: Aggregate,
}

impl ColumnDef {
    /// A sortable, filterable, searchable, non-editable column with no
    /// aggregate. Flags are adjusted with the builder methods below.
    pub fn new(key: impl Into<String>, label: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            ty,
            sortable: true,
            filterable: true,
            editable: false,
            searchable: true,
            renderer: None,
            aggregate: Aggregate::None,
        }
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn renderer(mut self, tag: impl Into<String>) -> Self {
        self.renderer = Some(tag.into());
        self
    }
}

/// Runtime layout state of one column: width, visibility, display position.
///
/// Applied from persisted layout at mount and read back for persistence.
/// Positions are dense and unique across a grid's column states.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnState {
    pub key: String,
    pub width: u32,
    pub visible: bool,
    pub position: usize,
}

impl ColumnState {
    pub fn new(key: impl Into<String>, position: usize) -> Self {
        Self {
            key: key.into(),
            width: DEFAULT_COLUMN_WIDTH,
            visible: true,
            position,
        }
    }
}
