use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use ordered_float::OrderedFloat;

/// Column data type. Drives cell parsing, comparison, and edit validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Text,
    Number,
    Bool,
    Date,
    /// Closed set of allowed text values.
    Enum { variants: Vec<String> },
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::Enum { .. } => "enum",
        }
    }
}

/// A typed scalar held in one cell of a row.
///
/// Rows are immutable snapshots, so a `Value` is never mutated in place;
/// updates replace the whole row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

/// Date format used on all text boundaries (parsing, display, export).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of this value, for `sum`/`avg` aggregation.
    ///
    /// Numbers pass through; numeric-looking text coerces; everything else
    /// (bools, dates, null) is excluded from numeric aggregation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Parse raw cell text by column type.
    ///
    /// Empty or whitespace-only input is `Null` for every type. Returns a
    /// human-readable reason on failure (this is what edit validation
    /// surfaces to the shell).
    pub fn parse(raw: &str, ty: &ColumnType) -> Result<Value, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        match ty {
            ColumnType::Text => Ok(Value::Text(trimmed.to_string())),
            ColumnType::Number => match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                _ => Err(format!("'{trimmed}' is not a number")),
            },
            ColumnType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("'{trimmed}' is not true or false")),
            },
            ColumnType::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| format!("'{trimmed}' is not a {DATE_FORMAT} date")),
            ColumnType::Enum { variants } => {
                if variants.iter().any(|v| v == trimmed) {
                    Ok(Value::Text(trimmed.to_string()))
                } else {
                    Err(format!("'{}' is not one of: {}", trimmed, variants.join(", ")))
                }
            }
        }
    }

    /// Coerce a JSON scalar (from a change-event payload) by column type.
    ///
    /// Strings go through [`Value::parse`]; natively typed JSON scalars are
    /// accepted when they match the column type.
    pub fn from_json(json: &serde_json::Value, ty: &ColumnType) -> Result<Value, String> {
        match (json, ty) {
            (serde_json::Value::Null, _) => Ok(Value::Null),
            (serde_json::Value::String(s), _) => Value::parse(s, ty),
            (serde_json::Value::Number(n), ColumnType::Number) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Value::Number)
                .ok_or_else(|| format!("'{n}' is out of range")),
            (serde_json::Value::Bool(b), ColumnType::Bool) => Ok(Value::Bool(*b)),
            (other, ty) => Err(format!("JSON {other} does not fit a {} column", ty.name())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::Date(_) => 1,
        Value::Text(_) => 2,
        Value::Bool(_) => 3,
        Value::Null => 4,
    }
}

/// Total order over values: numeric, chronological, lexicographic, and
/// `false < true` within a type; mixed types order by type rank.
///
/// `Null` compares greatest, so an ascending sort places missing values
/// last and a descending (reversed) sort places them first.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => OrderedFloat(*x).cmp(&OrderedFloat(*y)),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
