use crate::column::ColumnDef;
use crate::row::RowId;
use crate::store::RowStore;
use crate::value::{compare_values, ColumnType, Value};
use std::cmp::Ordering;

/// Structured predicate operator. Which operators make sense depends on the
/// column type (`Before`/`After` for dates, `Greater`/`Less` for numbers),
/// but all of them run through the same typed comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Equals,
    Contains,
    Before,
    After,
    Greater,
    Less,
    IsEmpty,
}

impl PredicateOp {
    /// Whether this operator compares against a value (IsEmpty does not).
    pub fn takes_value(&self) -> bool {
        !matches!(self, PredicateOp::IsEmpty)
    }
}

/// One structured column filter: `{column, operator, value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPredicate {
    pub column: String,
    pub op: PredicateOp,
    /// Raw comparison text, parsed by the column's type when the filter
    /// runs. Unused for `IsEmpty`.
    pub value: String,
}

impl ColumnPredicate {
    pub fn new(column: impl Into<String>, op: PredicateOp, value: impl Into<String>) -> Self {
        Self { column: column.into(), op, value: value.into() }
    }

    pub fn is_empty(column: impl Into<String>) -> Self {
        Self { column: column.into(), op: PredicateOp::IsEmpty, value: String::new() }
    }
}

/// Active filter state: a quick-filter string plus structured predicates.
///
/// A row is visible when it matches the quick filter (if any) AND every
/// active predicate. Empty text and an empty predicate list match all rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub quick: String,
    pub predicates: Vec<ColumnPredicate>,
}

impl FilterSpec {
    pub fn quick(text: impl Into<String>) -> Self {
        Self { quick: text.into(), predicates: Vec::new() }
    }

    pub fn with_predicate(mut self, predicate: ColumnPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn is_passthrough(&self) -> bool {
        self.quick.trim().is_empty() && self.predicates.is_empty()
    }
}

/// A predicate resolved against the column set, ready to evaluate.
/// Predicates that cannot be resolved (unknown column, non-filterable
/// column, unparseable comparison value) are absorbed as no-ops.
struct Compiled<'a> {
    key: &'a str,
    op: PredicateOp,
    target: Value,
}

fn compile<'a>(predicates: &'a [ColumnPredicate], columns: &'a [ColumnDef]) -> Vec<Compiled<'a>> {
    predicates
        .iter()
        .filter_map(|p| {
            let col = columns.iter().find(|c| c.key == p.column && c.filterable)?;
            let target = if p.op.takes_value() {
                parse_target(&p.value, &col.ty)?
            } else {
                Value::Null
            };
            Some(Compiled { key: col.key.as_str(), op: p.op, target })
        })
        .collect()
}

fn parse_target(raw: &str, ty: &ColumnType) -> Option<Value> {
    match ty {
        // contains-style matching happens on display text, so text targets
        // are kept verbatim rather than parsed
        ColumnType::Text | ColumnType::Enum { .. } => Some(Value::Text(raw.to_string())),
        _ => Value::parse(raw, ty).ok().filter(|v| !v.is_null()),
    }
}

fn matches(value: &Value, op: PredicateOp, target: &Value) -> bool {
    if op == PredicateOp::IsEmpty {
        return value.is_null();
    }
    if value.is_null() {
        return false;
    }
    match op {
        PredicateOp::Equals => match (value, target) {
            (Value::Text(a), Value::Text(b)) => a.eq_ignore_ascii_case(b),
            _ => compare_values(value, target) == Ordering::Equal,
        },
        PredicateOp::Contains => {
            let hay = value.to_string().to_lowercase();
            hay.contains(&target.to_string().to_lowercase())
        }
        PredicateOp::Before | PredicateOp::Less => {
            compare_values(value, target) == Ordering::Less
        }
        PredicateOp::After | PredicateOp::Greater => {
            compare_values(value, target) == Ordering::Greater
        }
        PredicateOp::IsEmpty => unreachable!("handled above"),
    }
}

/// The subset of row ids matching the filter, in ascending id order.
/// Filtering always runs before sorting and grouping.
pub fn filter_ids(store: &RowStore, columns: &[ColumnDef], spec: &FilterSpec) -> Vec<RowId> {
    let ids = store.ids_sorted();
    if spec.is_passthrough() {
        return ids;
    }

    let quick = spec.quick.trim().to_lowercase();
    let searchable: Vec<&str> = columns
        .iter()
        .filter(|c| c.searchable)
        .map(|c| c.key.as_str())
        .collect();
    let compiled = compile(&spec.predicates, columns);

    ids.into_iter()
        .filter(|&id| {
            let Some(row) = store.get(id) else { return false };

            if !quick.is_empty() {
                let hit = searchable
                    .iter()
                    .any(|key| row.get(key).to_string().to_lowercase().contains(&quick));
                if !hit {
                    return false;
                }
            }

            compiled.iter().all(|p| matches(row.get(p.key), p.op, &p.target))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::row::Row;
    use crate::value::ColumnType;
    use chrono::NaiveDate;

    fn setup() -> (RowStore, Vec<ColumnDef>) {
        let mut store = RowStore::new();
        let people = [
            (1, "Ann", "Eng", Some(90.0), Some("2021-04-01")),
            (2, "Anna", "Eng", Some(75.0), Some("2023-01-15")),
            (3, "Bo", "Ops", None, Some("2019-11-30")),
            (4, "Cy", "Ops", Some(40.0), None),
        ];
        for (id, name, dept, score, hired) in people {
            let mut row = Row::new(RowId(id))
                .with("name", Value::Text(name.into()))
                .with("dept", Value::Text(dept.into()));
            if let Some(score) = score {
                row = row.with("score", Value::Number(score));
            }
            if let Some(hired) = hired {
                let date = NaiveDate::parse_from_str(hired, "%Y-%m-%d").unwrap();
                row = row.with("hired", Value::Date(date));
            }
            store.insert(row);
        }
        let columns = vec![
            ColumnDef::new("name", "Name", ColumnType::Text),
            ColumnDef::new("dept", "Dept", ColumnType::Text),
            ColumnDef::new("score", "Score", ColumnType::Number).searchable(false),
            ColumnDef::new("hired", "Hired", ColumnType::Date).searchable(false),
        ];
        (store, columns)
    }

    fn run(store: &RowStore, columns: &[ColumnDef], spec: &FilterSpec) -> Vec<i64> {
        filter_ids(store, columns, spec).into_iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        let (store, columns) = setup();
        assert_eq!(run(&store, &columns, &FilterSpec::default()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_quick_filter_is_case_insensitive_substring() {
        let (store, columns) = setup();
        let spec = FilterSpec::quick("ann");
        assert_eq!(run(&store, &columns, &spec), vec![1, 2]);
    }

    #[test]
    fn test_quick_filter_skips_unsearchable_columns() {
        let (store, columns) = setup();
        // "90" appears only in score, which is not searchable
        let spec = FilterSpec::quick("90");
        assert!(run(&store, &columns, &spec).is_empty());
    }

    #[test]
    fn test_predicates_and_together() {
        let (store, columns) = setup();
        let spec = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("dept", PredicateOp::Equals, "eng"))
            .with_predicate(ColumnPredicate::new("score", PredicateOp::Greater, "80"));
        assert_eq!(run(&store, &columns, &spec), vec![1]);
    }

    #[test]
    fn test_quick_filter_combines_with_predicates() {
        let (store, columns) = setup();
        let mut spec = FilterSpec::quick("ann");
        spec.predicates.push(ColumnPredicate::new("score", PredicateOp::Less, "80"));
        assert_eq!(run(&store, &columns, &spec), vec![2]);
    }

    #[test]
    fn test_date_before_after() {
        let (store, columns) = setup();
        let before = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("hired", PredicateOp::Before, "2021-01-01"));
        assert_eq!(run(&store, &columns, &before), vec![3]);

        let after = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("hired", PredicateOp::After, "2021-01-01"));
        assert_eq!(run(&store, &columns, &after), vec![1, 2]);
    }

    #[test]
    fn test_is_empty_matches_missing_values() {
        let (store, columns) = setup();
        let spec = FilterSpec::default().with_predicate(ColumnPredicate::is_empty("score"));
        assert_eq!(run(&store, &columns, &spec), vec![3]);
    }

    #[test]
    fn test_null_never_matches_comparison_ops() {
        let (store, columns) = setup();
        let spec = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("score", PredicateOp::Less, "1000"));
        // row 3 has no score and must not match
        assert_eq!(run(&store, &columns, &spec), vec![1, 2, 4]);
    }

    #[test]
    fn test_unknown_column_predicate_is_a_noop() {
        let (store, columns) = setup();
        let spec = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("missing", PredicateOp::Equals, "x"));
        assert_eq!(run(&store, &columns, &spec), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_unparseable_target_is_a_noop() {
        let (store, columns) = setup();
        let spec = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("score", PredicateOp::Greater, "lots"));
        assert_eq!(run(&store, &columns, &spec), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_filter_is_idempotent_and_sound() {
        let (store, columns) = setup();
        let spec = FilterSpec::default()
            .with_predicate(ColumnPredicate::new("dept", PredicateOp::Equals, "Ops"));
        let once = filter_ids(&store, &columns, &spec);
        for id in &once {
            assert_eq!(store.get(*id).unwrap().get("dept"), &Value::Text("Ops".into()));
        }
        // feeding the result back through changes nothing
        let mut narrowed = RowStore::new();
        for id in &once {
            narrowed.insert(store.get(*id).unwrap().clone());
        }
        assert_eq!(filter_ids(&narrowed, &columns, &spec), once);
    }
}
