use std::cmp::Ordering;

use crate::column::ColumnDef;
use crate::row::RowId;
use crate::store::RowStore;
use crate::value::{compare_values, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The single active sort key: one column, one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: SortDirection::Ascending }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: SortDirection::Descending }
    }
}

/// Sort row ids by the spec's column with type-appropriate comparison.
///
/// Missing/null values sort last ascending and first descending (the
/// comparator treats null as greatest; descending reverses it). Ties break
/// by ascending row id in both directions, so the order is total and two
/// passes over identical input are identical. No spec, an unknown column,
/// or an unsortable column all fall back to ascending row id.
pub fn sort_ids(
    store: &RowStore,
    columns: &[ColumnDef],
    spec: Option<&SortSpec>,
    mut ids: Vec<RowId>,
) -> Vec<RowId> {
    let column = spec.and_then(|s| {
        columns
            .iter()
            .find(|c| c.key == s.column && c.sortable)
            .map(|c| (c.key.as_str(), s.direction))
    });

    let Some((key, direction)) = column else {
        ids.sort_unstable();
        return ids;
    };

    let value_of = |id: RowId| -> &Value {
        store.get(id).map(|row| row.get(key)).unwrap_or(&Value::Null)
    };

    ids.sort_by(|a, b| {
        let ord = match direction {
            SortDirection::Ascending => compare_values(value_of(*a), value_of(*b)),
            SortDirection::Descending => compare_values(value_of(*b), value_of(*a)),
        };
        ord.then_with(|| a.cmp(b))
    });
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnDef;
    use crate::row::Row;
    use crate::value::ColumnType;

    fn setup() -> (RowStore, Vec<ColumnDef>) {
        let mut store = RowStore::new();
        let rows = [
            (1, "Bo", Some(30.0)),
            (2, "Ann", Some(45.0)),
            (3, "Cy", None),
            (4, "ann", Some(45.0)),
        ];
        for (id, name, score) in rows {
            let score = score.map(Value::Number).unwrap_or(Value::Null);
            store.insert(
                Row::new(RowId(id))
                    .with("name", Value::Text(name.into()))
                    .with("score", score),
            );
        }
        let columns = vec![
            ColumnDef::new("name", "Name", ColumnType::Text),
            ColumnDef::new("score", "Score", ColumnType::Number),
            ColumnDef::new("locked", "Locked", ColumnType::Text).sortable(false),
        ];
        (store, columns)
    }

    fn run(store: &RowStore, columns: &[ColumnDef], spec: Option<&SortSpec>) -> Vec<i64> {
        let ids = store.ids_sorted();
        sort_ids(store, columns, spec, ids).into_iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_no_spec_is_ascending_row_id() {
        let (store, columns) = setup();
        assert_eq!(run(&store, &columns, None), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_numeric_ascending_nulls_last() {
        let (store, columns) = setup();
        let spec = SortSpec::ascending("score");
        assert_eq!(run(&store, &columns, Some(&spec)), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_numeric_descending_nulls_first() {
        let (store, columns) = setup();
        let spec = SortSpec::descending("score");
        assert_eq!(run(&store, &columns, Some(&spec)), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_ties_break_by_ascending_id_in_both_directions() {
        let (store, columns) = setup();
        // rows 2 and 4 tie on score = 45
        let asc = run(&store, &columns, Some(&SortSpec::ascending("score")));
        let desc = run(&store, &columns, Some(&SortSpec::descending("score")));
        assert!(asc.windows(2).any(|w| w == [2, 4]));
        assert!(desc.windows(2).any(|w| w == [2, 4]));
    }

    #[test]
    fn test_unknown_or_unsortable_column_falls_back_to_id_order() {
        let (store, columns) = setup();
        let unknown = SortSpec::ascending("missing");
        assert_eq!(run(&store, &columns, Some(&unknown)), vec![1, 2, 3, 4]);

        let unsortable = SortSpec::descending("locked");
        assert_eq!(run(&store, &columns, Some(&unsortable)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let (store, columns) = setup();
        let spec = SortSpec::ascending("name");
        let once = sort_ids(&store, &columns, Some(&spec), store.ids_sorted());
        let twice = sort_ids(&store, &columns, Some(&spec), once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), store.len());
    }
}
