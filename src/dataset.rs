// The schema-aware tabular container everything in the pipeline passes
// around. Column order is preserved so outputs are deterministic.
use indexmap::IndexMap;

use crate::error::Error;
use crate::value::{Column, Value};

pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Reserved column names written by the pipeline stages.
pub mod columns {
    pub const GEOMETRY: &str = "geometry";
    pub const TIME_START: &str = "time_start";
    pub const TIME_END: &str = "time_end";
    pub const CELL_ID: &str = "cell_id";
    pub const SPATIAL_GROUP: &str = "spatial_group";
    pub const TEMPORAL_GROUP: &str = "temporal_group";
    pub const CUSTOM_TEMPORAL_GROUP: &str = "custom_temporal_group";
    pub const COUNT: &str = "count";
}

/// An ordered collection of equal-length named columns, optionally tagged
/// with a coordinate reference system once a geometry column exists.
///
/// Transformations never mutate their input: they clone, modify the clone,
/// and return it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    cols: IndexMap<String, Column>,
    crs: Option<String>,
}

impl Dataset {
    pub fn new() -> Self {
        Dataset::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.cols.values().next().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.cols.len()
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn with_crs(mut self, crs: &str) -> Self {
        self.crs = Some(crs.to_string());
        self
    }

    pub fn column_names(&self) -> Vec<String> {
        self.cols.keys().cloned().collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.cols.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.cols.get(name)
    }

    /// Cell lookup; `Null` for unknown columns or out-of-range rows.
    pub fn value(&self, name: &str, row: usize) -> Value {
        self.cols.get(name).map_or(Value::Null, |c| c.get(row))
    }

    /// Insert or replace a column. The length must match the existing rows
    /// unless the dataset is still empty.
    pub fn insert_column(&mut self, name: impl Into<String>, col: Column) -> Result<(), Error> {
        let name = name.into();
        if !self.cols.is_empty() && !self.has_only(&name) && col.len() != self.len() {
            return Err(Error::Validation(format!(
                "column '{}' has {} rows, expected {}",
                name,
                col.len(),
                self.len()
            )));
        }
        self.cols.insert(name, col);
        Ok(())
    }

    // True when `name` is the only column, in which case replacing it may
    // change the row count.
    fn has_only(&self, name: &str) -> bool {
        self.cols.len() == 1 && self.cols.contains_key(name)
    }

    /// Pure variant of [`Dataset::insert_column`].
    pub fn with_column(&self, name: impl Into<String>, col: Column) -> Result<Dataset, Error> {
        let mut out = self.clone();
        out.insert_column(name, col)?;
        Ok(out)
    }

    /// Pure projection dropping the named columns (missing names ignored).
    pub fn without_columns(&self, names: &[&str]) -> Dataset {
        let mut out = self.clone();
        for name in names {
            out.cols.shift_remove(*name);
        }
        out
    }

    /// Names of numeric (int or float) columns, in column order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.cols
            .iter()
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn null_cell_count(&self) -> usize {
        self.cols.values().map(Column::null_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut d = Dataset::new();
        d.insert_column("value", Column::Int(vec![Some(1), Some(2), None]))
            .unwrap();
        d.insert_column(
            "label",
            Column::Str(vec![Some("a".into()), None, Some("c".into())]),
        )
        .unwrap();
        d
    }

    #[test]
    fn shape_queries() {
        let d = sample();
        assert_eq!(d.len(), 3);
        assert_eq!(d.width(), 2);
        assert!(d.has_column("value"));
        assert_eq!(d.numeric_column_names(), vec!["value".to_string()]);
        assert_eq!(d.null_cell_count(), 2);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let mut d = sample();
        let err = d.insert_column("bad", Column::Int(vec![Some(1)])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn transformations_do_not_touch_the_input() {
        let d = sample();
        let d2 = d.without_columns(&["label"]);
        assert_eq!(d.width(), 2);
        assert_eq!(d2.width(), 1);
        let d3 = d
            .with_column("extra", Column::filled_int(3, 1))
            .unwrap();
        assert_eq!(d.width(), 2);
        assert_eq!(d3.width(), 3);
    }
}
