use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::dataset::Dataset;
use crate::error::Error;
use crate::value::Value;

/// Write a dataset as CSV. Nulls render as empty cells, times as RFC 3339,
/// geometries as WKT.
pub fn write_csv<P: AsRef<Path>>(path: P, data: &Dataset) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    let names = data.column_names();
    wtr.write_record(&names)?;
    for row in 0..data.len() {
        let record: Vec<String> = names
            .iter()
            .map(|name| data.value(name, row).render())
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a dataset as a pretty-printed JSON array of objects. Numeric and
/// boolean cells keep their JSON types; nulls stay null.
pub fn write_json<P: AsRef<Path>>(path: P, data: &Dataset) -> Result<(), Error> {
    let names = data.column_names();
    let mut rows = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let mut obj = serde_json::Map::new();
        for name in &names {
            let cell = data.value(name, row);
            obj.insert(name.clone(), value_to_json(&cell));
        }
        rows.push(serde_json::Value::Object(obj));
    }
    let text = serde_json::to_string_pretty(&serde_json::Value::Array(rows))?;
    std::fs::write(path, text)?;
    Ok(())
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        other => serde_json::Value::String(other.render()),
    }
}

/// Render the first `max_rows` rows as a markdown table for terminal output.
pub fn preview(data: &Dataset, max_rows: usize) -> String {
    if data.is_empty() {
        return "(no rows)".to_string();
    }
    let names = data.column_names();
    let mut builder = Builder::default();
    builder.push_record(names.clone());
    for row in 0..data.len().min(max_rows) {
        let record: Vec<String> = names
            .iter()
            .map(|name| data.value(name, row).render())
            .collect();
        builder.push_record(record);
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    let mut text = table.to_string();
    if data.len() > max_rows {
        text.push_str(&format!("\n({} more rows)", data.len() - max_rows));
    }
    text
}
