// Column reduction and group collapsing shared by both aggregation passes.
//
// A reduction takes one column and the row indexes of a group and produces a
// single value. Numeric reductions ignore nulls; `size` counts every row in
// the group, nulls included. Combinations a column type cannot support (for
// example `sum` over strings) reduce to null so the output schema stays
// stable.
use indexmap::IndexMap;

use crate::dataset::{columns, Dataset};
use crate::error::Error;
use crate::geometry::Geometry;
use crate::options::AggFunction;
use crate::util::{average, median, sample_std, sample_variance};
use crate::value::{Column, Value};

/// Per-column aggregation function mapping, in caller-declared order.
pub type AggSpec = IndexMap<String, AggFunction>;

/// Reduce the given rows of one column with one function.
pub fn reduce(func: AggFunction, column: &Column, rows: &[usize]) -> Value {
    match func {
        AggFunction::Size => Value::Int(rows.len() as i64),
        AggFunction::Count => {
            let n = rows.iter().filter(|&&r| !column.get(r).is_null()).count();
            Value::Int(n as i64)
        }
        AggFunction::First => rows
            .iter()
            .map(|&r| column.get(r))
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null),
        AggFunction::Last => rows
            .iter()
            .rev()
            .map(|&r| column.get(r))
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null),
        AggFunction::Sum => match column {
            Column::Int(_) => {
                let sum: i64 = rows.iter().filter_map(|&r| match column.get(r) {
                    Value::Int(v) => Some(v),
                    _ => None,
                }).sum();
                Value::Int(sum)
            }
            Column::Float(_) => {
                let sum: f64 = rows.iter().filter_map(|&r| column.f64_at(r)).sum();
                Value::Float(sum)
            }
            _ => Value::Null,
        },
        AggFunction::Mean => with_numeric(column, rows, |v| Some(average(v))),
        AggFunction::Median => with_numeric(column, rows, |v| Some(median(v.to_vec()))),
        AggFunction::Std => with_numeric(column, rows, sample_std),
        AggFunction::Var => with_numeric(column, rows, sample_variance),
        AggFunction::Min => extremum(column, rows, true),
        AggFunction::Max => extremum(column, rows, false),
    }
}

fn with_numeric(column: &Column, rows: &[usize], f: impl Fn(&[f64]) -> Option<f64>) -> Value {
    if !column.is_numeric() {
        return Value::Null;
    }
    let values: Vec<f64> = rows.iter().filter_map(|&r| column.f64_at(r)).collect();
    if values.is_empty() {
        return Value::Null;
    }
    f(&values).map_or(Value::Null, Value::Float)
}

/// Min/max keeps the column's own type: numeric by value, strings
/// lexicographically, times chronologically.
fn extremum(column: &Column, rows: &[usize], min: bool) -> Value {
    let mut best: Option<Value> = None;
    for &row in rows {
        let v = column.get(row);
        if v.is_null() {
            continue;
        }
        best = Some(match best.take() {
            None => v,
            Some(cur) => {
                if smaller(&v, &cur) == min {
                    v
                } else {
                    cur
                }
            }
        });
    }
    best.unwrap_or(Value::Null)
}

fn smaller(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x < y,
        (Value::Time(x), Value::Time(y)) => x < y,
        (Value::Bool(x), Value::Bool(y)) => x < y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x < y,
            _ => false,
        },
    }
}

/// Collapse groups of rows into one output row per group.
///
/// The output's first column is `group_col` holding the group keys; the
/// remaining columns follow the order of `spec`, skipping names the input
/// does not have. For the `geometry` column, reductions that did not yield a
/// typed geometry are replaced with the origin sentinel rather than leaving
/// the column absent.
pub fn reduce_groups(
    data: &Dataset,
    group_col: &str,
    groups: &IndexMap<String, Vec<usize>>,
    spec: &AggSpec,
) -> Result<Dataset, Error> {
    let mut out = Dataset::new();
    let keys: Vec<Option<String>> = groups.keys().cloned().map(Some).collect();
    out.insert_column(group_col, Column::Str(keys))?;

    for (name, func) in spec {
        if name == group_col {
            continue;
        }
        let Some(column) = data.column(name) else {
            continue;
        };
        let mut values: Vec<Value> = groups
            .values()
            .map(|rows| reduce(*func, column, rows))
            .collect();
        if name == columns::GEOMETRY {
            for v in &mut values {
                if !matches!(v, Value::Geom(_)) {
                    *v = Value::Geom(Geometry::origin());
                }
            }
        }
        out.insert_column(name, Column::from_values(values))?;
    }

    if let Some(crs) = data.crs() {
        out = out.with_crs(crs);
    }
    Ok(out)
}

/// Group row indexes by a key column's rendered value, preserving first-seen
/// order. Rows with a null key are dropped, matching group-by semantics
/// elsewhere in the ecosystem.
pub fn group_by_column(data: &Dataset, key_col: &str) -> Result<IndexMap<String, Vec<usize>>, Error> {
    let column = data.column(key_col).ok_or_else(|| {
        Error::Validation(format!("missing grouping column: {}", key_col))
    })?;
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for row in 0..data.len() {
        let v = column.get(row);
        if v.is_null() {
            continue;
        }
        groups.entry(v.render()).or_default().push(row);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col() -> Column {
        Column::Int(vec![Some(10), Some(15), Some(30), None, Some(20)])
    }

    #[test]
    fn basic_reductions() {
        let c = col();
        let rows = [0usize, 1, 2, 3, 4];
        assert_eq!(reduce(AggFunction::Sum, &c, &rows), Value::Int(75));
        assert_eq!(reduce(AggFunction::Size, &c, &rows), Value::Int(5));
        assert_eq!(reduce(AggFunction::Count, &c, &rows), Value::Int(4));
        assert_eq!(reduce(AggFunction::Min, &c, &rows), Value::Int(10));
        assert_eq!(reduce(AggFunction::Max, &c, &rows), Value::Int(30));
        assert_eq!(reduce(AggFunction::First, &c, &rows), Value::Int(10));
        assert_eq!(reduce(AggFunction::Last, &c, &rows), Value::Int(20));
    }

    #[test]
    fn mean_ignores_nulls() {
        let c = col();
        let rows = [0usize, 1, 3];
        // mean of 10 and 15, the null row is skipped
        assert_eq!(reduce(AggFunction::Mean, &c, &rows), Value::Float(12.5));
    }

    #[test]
    fn variance_needs_two_values() {
        let c = col();
        assert_eq!(reduce(AggFunction::Var, &c, &[0]), Value::Null);
        assert_eq!(
            reduce(AggFunction::Var, &c, &[0, 1]),
            Value::Float(12.5)
        );
    }

    #[test]
    fn unsupported_combination_reduces_to_null() {
        let c = Column::Str(vec![Some("a".into()), Some("b".into())]);
        assert_eq!(reduce(AggFunction::Sum, &c, &[0, 1]), Value::Null);
        assert_eq!(
            reduce(AggFunction::Max, &c, &[0, 1]),
            Value::Str("b".into())
        );
    }

    #[test]
    fn grouping_drops_null_keys_and_keeps_order() {
        let mut d = Dataset::new();
        d.insert_column(
            "g",
            Column::Str(vec![
                Some("b".into()),
                None,
                Some("a".into()),
                Some("b".into()),
            ]),
        )
        .unwrap();
        let groups = group_by_column(&d, "g").unwrap();
        let keys: Vec<&String> = groups.keys().collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(groups["b"], vec![0, 3]);
    }

    #[test]
    fn reduce_groups_substitutes_geometry_sentinel() {
        let mut d = Dataset::new();
        d.insert_column("g", Column::Str(vec![Some("a".into()), Some("a".into())]))
            .unwrap();
        d.insert_column(
            "geometry",
            Column::Geom(vec![
                Some(Geometry::point(1.0, 1.0)),
                Some(Geometry::point(2.0, 2.0)),
            ]),
        )
        .unwrap();
        let groups = group_by_column(&d, "g").unwrap();
        // `mean` cannot keep a typed geometry; the sentinel steps in.
        let mut spec = AggSpec::new();
        spec.insert("geometry".to_string(), AggFunction::Mean);
        let out = reduce_groups(&d, "g", &groups, &spec).unwrap();
        assert_eq!(
            out.value("geometry", 0),
            Value::Geom(Geometry::origin())
        );
    }
}
