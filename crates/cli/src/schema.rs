// Grid schema files: TOML [[column]] entries describing the column set.
//
// Example:
//   [[column]]
//   key = "salary"
//   label = "Salary"
//   type = "number"
//   editable = true
//   aggregate = "sum"

use serde::Deserialize;

use streamgrid_engine::column::{Aggregate, ColumnDef};
use streamgrid_engine::value::ColumnType;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    #[serde(default, rename = "column")]
    columns: Vec<ColumnEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnEntry {
    key: String,
    label: Option<String>,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default = "default_true")]
    sortable: bool,
    #[serde(default = "default_true")]
    filterable: bool,
    #[serde(default)]
    editable: bool,
    #[serde(default = "default_true")]
    searchable: bool,
    #[serde(default)]
    aggregate: Option<String>,
    #[serde(default)]
    renderer: Option<String>,
    /// Allowed values; required when type = "enum".
    #[serde(default)]
    variants: Vec<String>,
}

fn default_true() -> bool {
    true
}

pub fn parse(content: &str) -> Result<Vec<ColumnDef>, String> {
    let file: SchemaFile =
        toml::from_str(content).map_err(|e| format!("bad schema: {}", e))?;
    if file.columns.is_empty() {
        return Err("schema defines no columns".to_string());
    }

    file.columns.into_iter().map(column_def).collect()
}

fn column_def(entry: ColumnEntry) -> Result<ColumnDef, String> {
    let ty = match entry.ty.as_str() {
        "text" => ColumnType::Text,
        "number" => ColumnType::Number,
        "bool" => ColumnType::Bool,
        "date" => ColumnType::Date,
        "enum" => {
            if entry.variants.is_empty() {
                return Err(format!("column '{}': enum type needs variants", entry.key));
            }
            ColumnType::Enum { variants: entry.variants }
        }
        other => {
            return Err(format!("column '{}': unknown type '{}'", entry.key, other));
        }
    };

    let aggregate = match entry.aggregate.as_deref() {
        None | Some("none") => Aggregate::None,
        Some("sum") => Aggregate::Sum,
        Some("avg") => Aggregate::Avg,
        Some("count") => Aggregate::Count,
        Some("min") => Aggregate::Min,
        Some("max") => Aggregate::Max,
        Some(other) => {
            return Err(format!("column '{}': unknown aggregate '{}'", entry.key, other));
        }
    };

    let label = entry.label.unwrap_or_else(|| entry.key.clone());
    let mut def = ColumnDef::new(entry.key, label, ty)
        .sortable(entry.sortable)
        .editable(entry.editable)
        .searchable(entry.searchable)
        .aggregate(aggregate);
    def.filterable = entry.filterable;
    if let Some(tag) = entry.renderer {
        def = def.renderer(tag);
    }
    Ok(def)
}
