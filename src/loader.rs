use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

use crate::dataset::{Dataset, DEFAULT_CRS};
use crate::error::Error;
use crate::notice::Outcome;
use crate::options::{SpatialType, TemporalFormat};
use crate::pipeline::index;
use crate::util::{parse_f64_safe, parse_i64_safe};
use crate::value::{Column, Value};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
}

/// How to index a file right after loading it.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub spatial_columns: Vec<String>,
    pub temporal_columns: Vec<String>,
    pub spatial_type: SpatialType,
    pub temporal_format: TemporalFormat,
    pub crs: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            spatial_columns: Vec::new(),
            temporal_columns: Vec::new(),
            spatial_type: SpatialType::Auto,
            temporal_format: TemporalFormat::Auto,
            crs: DEFAULT_CRS.to_string(),
        }
    }
}

/// Read a CSV file into a typed dataset. Column types are inferred from the
/// full column: all-integer cells make an Int column, otherwise all-numeric
/// cells make a Float column, otherwise the column stays Str. Empty cells
/// become nulls. Rows whose width disagrees with the header are skipped and
/// counted in the report.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<(Dataset, LoadReport), Error> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path.as_ref())?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;

    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                parse_errors += 1;
                continue;
            }
        };
        if record.len() != headers.len() {
            parse_errors += 1;
            continue;
        }
        for (col, field) in cells.iter_mut().zip(record.iter()) {
            let field = field.trim();
            col.push(if field.is_empty() { None } else { Some(field.to_string()) });
        }
    }

    let mut data = Dataset::new();
    for (name, raw) in headers.iter().zip(cells) {
        data.insert_column(name, infer_column(raw))?;
    }
    debug!(
        rows = data.len(),
        columns = data.width(),
        parse_errors,
        "loaded csv"
    );
    let report = LoadReport { total_rows, parse_errors };
    Ok((data, report))
}

/// Read a CSV file and index it in one step.
pub fn read_csv_indexed<P: AsRef<Path>>(
    path: P,
    options: &IndexOptions,
) -> Result<(Outcome<Dataset>, LoadReport), Error> {
    let (data, report) = read_csv(path)?;
    let indexed = index(
        &data,
        &options.spatial_columns,
        &options.temporal_columns,
        options.spatial_type,
        options.temporal_format,
        &options.crs,
    )?;
    Ok((indexed, report))
}

/// Read a JSON file holding an array of flat objects. The column set is the
/// union of all keys in first-seen order; objects missing a key contribute a
/// null.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Dataset, Error> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let parsed: serde_json::Value = serde_json::from_str(&text)?;
    let rows = parsed
        .as_array()
        .ok_or_else(|| Error::Validation("json input must be an array of objects".to_string()))?;

    let mut names: Vec<String> = Vec::new();
    for row in rows {
        let obj = row
            .as_object()
            .ok_or_else(|| Error::Validation("json rows must be objects".to_string()))?;
        for key in obj.keys() {
            if !names.iter().any(|n| n == key) {
                names.push(key.clone());
            }
        }
    }

    let mut data = Dataset::new();
    for name in &names {
        let values: Vec<Value> = rows
            .iter()
            .map(|row| json_to_value(row.get(name).unwrap_or(&serde_json::Value::Null)))
            .collect();
        data.insert_column(name, Column::from_values(values))?;
    }
    debug!(rows = data.len(), columns = data.width(), "loaded json");
    Ok(data)
}

/// Read a JSON file and index it in one step.
pub fn read_json_indexed<P: AsRef<Path>>(
    path: P,
    options: &IndexOptions,
) -> Result<Outcome<Dataset>, Error> {
    let data = read_json(path)?;
    index(
        &data,
        &options.spatial_columns,
        &options.temporal_columns,
        options.spatial_type,
        options.temporal_format,
        &options.crs,
    )
}

fn json_to_value(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}

fn infer_column(raw: Vec<Option<String>>) -> Column {
    let has_any = raw.iter().any(|c| c.is_some());
    if has_any
        && raw
            .iter()
            .flatten()
            .all(|s| parse_i64_safe(Some(s.as_str())).is_some())
    {
        return Column::Int(raw.iter().map(|c| parse_i64_safe(c.as_deref())).collect());
    }
    if has_any
        && raw
            .iter()
            .flatten()
            .all(|s| parse_f64_safe(Some(s.as_str())).is_some())
    {
        return Column::Float(raw.iter().map(|c| parse_f64_safe(c.as_deref())).collect());
    }
    Column::Str(raw)
}
