// Scalar values and typed columnar storage.
//
// Columns are stored as one `Vec<Option<T>>` per type so "is this column
// numeric" is an O(1) query on the variant, not a per-row inspection.
use chrono::{DateTime, SecondsFormat, Utc};

use crate::geometry::Geometry;

/// One cell of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Time(DateTime<Utc>),
    Geom(Geometry),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view: integers widen to `f64`, everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Render for CSV cells, table previews, and group keys. Nulls render
    /// empty, times as RFC 3339, geometries as WKT.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Str(v) => v.clone(),
            Value::Time(v) => v.to_rfc3339_opts(SecondsFormat::Secs, true),
            Value::Geom(v) => v.to_wkt(),
        }
    }
}

/// A named, typed column. All rows share the variant; absent cells are
/// `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Str(Vec<Option<String>>),
    Time(Vec<Option<DateTime<Utc>>>),
    Geom(Vec<Option<Geometry>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Str(v) => v.len(),
            Column::Time(v) => v.len(),
            Column::Geom(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Int(_) | Column::Float(_))
    }

    pub fn get(&self, row: usize) -> Value {
        match self {
            Column::Int(v) => v.get(row).copied().flatten().map_or(Value::Null, Value::Int),
            Column::Float(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Float),
            Column::Bool(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Bool),
            Column::Str(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Value::Null, Value::Str),
            Column::Time(v) => v
                .get(row)
                .copied()
                .flatten()
                .map_or(Value::Null, Value::Time),
            Column::Geom(v) => v
                .get(row)
                .cloned()
                .flatten()
                .map_or(Value::Null, Value::Geom),
        }
    }

    pub fn f64_at(&self, row: usize) -> Option<f64> {
        match self {
            Column::Int(v) => v.get(row).copied().flatten().map(|x| x as f64),
            Column::Float(v) => v.get(row).copied().flatten(),
            _ => None,
        }
    }

    pub fn str_at(&self, row: usize) -> Option<&str> {
        match self {
            Column::Str(v) => v.get(row).and_then(|o| o.as_deref()),
            _ => None,
        }
    }

    pub fn time_at(&self, row: usize) -> Option<DateTime<Utc>> {
        match self {
            Column::Time(v) => v.get(row).copied().flatten(),
            _ => None,
        }
    }

    pub fn geom_at(&self, row: usize) -> Option<&Geometry> {
        match self {
            Column::Geom(v) => v.get(row).and_then(|o| o.as_ref()),
            _ => None,
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            Column::Int(v) => v.iter().filter(|o| o.is_none()).count(),
            Column::Float(v) => v.iter().filter(|o| o.is_none()).count(),
            Column::Bool(v) => v.iter().filter(|o| o.is_none()).count(),
            Column::Str(v) => v.iter().filter(|o| o.is_none()).count(),
            Column::Time(v) => v.iter().filter(|o| o.is_none()).count(),
            Column::Geom(v) => v.iter().filter(|o| o.is_none()).count(),
        }
    }

    pub fn has_nulls(&self) -> bool {
        self.null_count() > 0
    }

    /// A constant integer column, used to synthesize `count` before grouping.
    pub fn filled_int(len: usize, value: i64) -> Self {
        Column::Int(vec![Some(value); len])
    }

    /// Build a column from row values, picking the narrowest variant that
    /// holds them. Mixed int/float promotes to float; values that do not fit
    /// the chosen variant become null.
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut any_float = false;
        let mut any_int = false;
        let mut any_bool = false;
        let mut any_str = false;
        let mut any_time = false;
        let mut any_geom = false;
        for v in &values {
            match v {
                Value::Float(_) => any_float = true,
                Value::Int(_) => any_int = true,
                Value::Bool(_) => any_bool = true,
                Value::Str(_) => any_str = true,
                Value::Time(_) => any_time = true,
                Value::Geom(_) => any_geom = true,
                Value::Null => {}
            }
        }
        if any_geom {
            Column::Geom(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Geom(g) => Some(g),
                        _ => None,
                    })
                    .collect(),
            )
        } else if any_time {
            Column::Time(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Time(t) => Some(t),
                        _ => None,
                    })
                    .collect(),
            )
        } else if any_str {
            Column::Str(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Str(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )
        } else if any_float {
            Column::Float(values.into_iter().map(|v| v.as_f64()).collect())
        } else if any_int {
            Column::Int(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Int(i) => Some(i),
                        _ => None,
                    })
                    .collect(),
            )
        } else if any_bool {
            Column::Bool(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Bool(b) => Some(b),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            // All null: keep an all-null string column of the right length.
            Column::Str(vec![None; values.len()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_promotes_mixed_numeric_to_float() {
        let col = Column::from_values(vec![Value::Int(1), Value::Float(2.5), Value::Null]);
        assert_eq!(
            col,
            Column::Float(vec![Some(1.0), Some(2.5), None])
        );
        assert!(col.is_numeric());
    }

    #[test]
    fn from_values_all_int_stays_int() {
        let col = Column::from_values(vec![Value::Int(1), Value::Null, Value::Int(3)]);
        assert_eq!(col, Column::Int(vec![Some(1), None, Some(3)]));
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn render_shapes_special_types() {
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::Geom(Geometry::point(1.0, 2.0)).render(), "POINT (1 2)");
        let t = chrono::TimeZone::with_ymd_and_hms(&Utc, 2023, 7, 4, 12, 0, 0)
            .single()
            .unwrap();
        assert_eq!(Value::Time(t).render(), "2023-07-04T12:00:00Z");
    }
}
