use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::column::{Aggregate, ColumnDef};
use crate::row::RowId;
use crate::store::RowStore;
use crate::value::{compare_values, Value};

/// Hashable mirror of `Value`, used only to bucket rows while grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum BucketKey {
    Null,
    Text(String),
    Number(OrderedFloat<f64>),
    Bool(bool),
    Date(NaiveDate),
}

impl BucketKey {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => BucketKey::Null,
            Value::Text(s) => BucketKey::Text(s.clone()),
            Value::Number(n) => BucketKey::Number(OrderedFloat(*n)),
            Value::Bool(b) => BucketKey::Bool(*b),
            Value::Date(d) => BucketKey::Date(*d),
        }
    }
}

/// A computed rollup for one column of one group node.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub column: String,
    pub func: Aggregate,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupChildren {
    Groups(Vec<GroupNode>),
    Leaves(Vec<RowId>),
}

/// One node of the group tree: the rows sharing this node's value prefix.
///
/// Nodes are ephemeral: the whole tree is rebuilt from scratch on any
/// change to filter, sort, group path, or the underlying rows, so an
/// aggregate is always consistent with the node's current children.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    /// Column key this node buckets on.
    pub column: String,
    /// The shared bucket value; `Null` groups rows missing the column.
    pub value: Value,
    /// Nesting depth, equal to the index into the group path.
    pub depth: usize,
    /// Leaf rows in this subtree.
    pub leaf_count: usize,
    pub aggregates: Vec<AggregateResult>,
    pub children: GroupChildren,
}

/// Build the group tree for `ids` (already filtered and sorted).
///
/// At each depth rows bucket by their value of that path column; buckets
/// keep first-occurrence order from the incoming sequence so the applied
/// sort shows through, and leaves keep the incoming order exactly. Path
/// segments naming no known column are skipped. An empty (or fully
/// unknown) path yields no tree; callers render the flat sequence.
pub fn build_group_tree(
    store: &RowStore,
    columns: &[ColumnDef],
    path: &[String],
    ids: &[RowId],
) -> Vec<GroupNode> {
    let effective: Vec<&str> = path
        .iter()
        .filter(|segment| columns.iter().any(|c| &c.key == *segment))
        .map(|s| s.as_str())
        .collect();
    if effective.is_empty() {
        return Vec::new();
    }
    partition(store, columns, &effective, 0, ids)
}

fn partition(
    store: &RowStore,
    columns: &[ColumnDef],
    path: &[&str],
    depth: usize,
    ids: &[RowId],
) -> Vec<GroupNode> {
    let key = path[depth];

    // first-occurrence bucket order, not re-sorted
    let mut order: Vec<(Value, Vec<RowId>)> = Vec::new();
    let mut index: FxHashMap<BucketKey, usize> = FxHashMap::default();
    for &id in ids {
        let value = store.get(id).map(|row| row.get(key).clone()).unwrap_or(Value::Null);
        let bucket = BucketKey::of(&value);
        let slot = *index.entry(bucket).or_insert_with(|| {
            order.push((value, Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(id);
    }

    order
        .into_iter()
        .map(|(value, members)| {
            let children = if depth + 1 < path.len() {
                GroupChildren::Groups(partition(store, columns, path, depth + 1, &members))
            } else {
                GroupChildren::Leaves(members.clone())
            };
            GroupNode {
                column: key.to_string(),
                value,
                depth,
                leaf_count: members.len(),
                aggregates: compute_aggregates(store, columns, &members),
                children,
            }
        })
        .collect()
}

/// Apply every declared aggregation function over the given leaf rows.
///
/// `sum`/`avg` use numeric coercion and skip values that do not coerce;
/// `count` counts leaf rows regardless of value nullity; `min`/`max` use
/// the sorter's comparator and skip nulls.
pub fn compute_aggregates(
    store: &RowStore,
    columns: &[ColumnDef],
    ids: &[RowId],
) -> Vec<AggregateResult> {
    columns
        .iter()
        .filter(|c| c.aggregate != Aggregate::None)
        .map(|c| AggregateResult {
            column: c.key.clone(),
            func: c.aggregate,
            value: aggregate_column(store, &c.key, c.aggregate, ids),
        })
        .collect()
}

fn aggregate_column(store: &RowStore, key: &str, func: Aggregate, ids: &[RowId]) -> Value {
    if func == Aggregate::Count {
        return Value::Number(ids.len() as f64);
    }

    let values = ids.iter().filter_map(|&id| store.get(id)).map(|row| row.get(key));
    match func {
        Aggregate::Sum | Aggregate::Avg => {
            let mut sum = 0.0;
            let mut n = 0usize;
            for value in values {
                if let Some(x) = value.as_number() {
                    sum += x;
                    n += 1;
                }
            }
            if n == 0 {
                Value::Null
            } else if func == Aggregate::Sum {
                Value::Number(sum)
            } else {
                Value::Number(sum / n as f64)
            }
        }
        Aggregate::Min | Aggregate::Max => {
            let mut best: Option<&Value> = None;
            for value in values.filter(|v| !v.is_null()) {
                best = Some(match best {
                    None => value,
                    Some(b) => {
                        let ord = compare_values(value, b);
                        let take = if func == Aggregate::Min {
                            ord == std::cmp::Ordering::Less
                        } else {
                            ord == std::cmp::Ordering::Greater
                        };
                        if take {
                            value
                        } else {
                            b
                        }
                    }
                });
            }
            best.cloned().unwrap_or(Value::Null)
        }
        Aggregate::Count | Aggregate::None => Value::Null,
    }
}
