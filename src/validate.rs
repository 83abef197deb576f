// Input validation run before any transformation.
use indexmap::IndexMap;

use crate::dataset::{columns, Dataset};
use crate::error::Error;
use crate::options::{AggFunction, SpatialGranularity, TemporalGranularity};

/// Check a dataset and the requested column names before indexing.
///
/// Succeeds with no observable effect iff the dataset is non-empty, every
/// named column exists, and any pre-existing geometry column is free of
/// nulls. Missing columns are listed by name.
pub fn validate_data(
    data: &Dataset,
    spatial_columns: Option<&[String]>,
    temporal_columns: Option<&[String]>,
) -> Result<(), Error> {
    if data.is_empty() {
        return Err(Error::Validation("data is empty".to_string()));
    }
    if let Some(cols) = spatial_columns {
        check_columns(data, cols, "spatial")?;
    }
    if let Some(cols) = temporal_columns {
        check_columns(data, cols, "temporal")?;
    }
    if let Some(geometry) = data.column(columns::GEOMETRY) {
        if geometry.has_nulls() {
            return Err(Error::Validation(
                "geometry column contains null values".to_string(),
            ));
        }
    }
    Ok(())
}

fn check_columns(data: &Dataset, cols: &[String], role: &str) -> Result<(), Error> {
    let missing: Vec<&str> = cols
        .iter()
        .filter(|c| !data.has_column(c))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "missing {} columns: {}",
            role,
            missing.join(", ")
        )))
    }
}

/// Check string-typed aggregation parameters, for callers that take options
/// from configuration or user input rather than the typed enums.
///
/// Invalid aggregation-function values are collected and reported together.
pub fn validate_aggregation_parameters(
    spatial_granularity: Option<&str>,
    temporal_granularity: Option<&str>,
    agg_functions: Option<&IndexMap<String, String>>,
) -> Result<(), Error> {
    if let Some(s) = spatial_granularity {
        SpatialGranularity::parse(s)?;
    }
    if let Some(s) = temporal_granularity {
        TemporalGranularity::parse(s)?;
    }
    if let Some(functions) = agg_functions {
        let invalid: Vec<&str> = functions
            .values()
            .filter(|v| AggFunction::parse(v).is_err())
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(Error::unsupported(
                "aggregation function",
                &invalid.join(", "),
                AggFunction::VALID,
            ));
        }
    }
    Ok(())
}
