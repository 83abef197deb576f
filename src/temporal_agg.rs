// Temporal aggregation: group records by the calendar period of
// `time_start` (or a caller-supplied custom group column) and reduce.
use indexmap::IndexMap;
use tracing::debug;

use crate::agg::{group_by_column, reduce_groups, AggSpec};
use crate::dataset::{columns, Dataset};
use crate::error::Error;
use crate::options::{AggFunction, TemporalGranularity};
use crate::spatial_agg::synthesize_count;
use crate::temporal::period_label;
use crate::value::Column;

/// Aggregate at the requested temporal granularity.
///
/// Defaulting follows the spatial pass: with no mapping every numeric column
/// reduces with `mean`. `geometry` and `spatial_group` are preserved with
/// `first` when present and not already specified; `time_start`/`time_end`
/// are grouping input, never reduced output.
pub fn aggregate_temporal(
    data: &Dataset,
    granularity: TemporalGranularity,
    spec: Option<&AggSpec>,
) -> Result<Dataset, Error> {
    let spec = effective_spec(data, spec);
    let data = synthesize_count(data, &spec)?;

    let (group_col, groups) = match granularity {
        TemporalGranularity::Custom => {
            if !data.has_column(columns::CUSTOM_TEMPORAL_GROUP) {
                return Err(Error::Validation(
                    "for custom temporal granularity, data must have a 'custom_temporal_group' column"
                        .to_string(),
                ));
            }
            (
                columns::CUSTOM_TEMPORAL_GROUP,
                group_by_column(&data, columns::CUSTOM_TEMPORAL_GROUP)?,
            )
        }
        _ => (columns::TEMPORAL_GROUP, period_groups(&data, granularity)?),
    };

    debug!(
        granularity = %granularity,
        groups = groups.len(),
        "temporal aggregation"
    );
    reduce_groups(&data, group_col, &groups, &spec)
}

fn effective_spec(data: &Dataset, spec: Option<&AggSpec>) -> AggSpec {
    let mut spec = match spec {
        Some(s) => s.clone(),
        None => data
            .numeric_column_names()
            .into_iter()
            .map(|n| (n, AggFunction::Mean))
            .collect(),
    };
    if data.has_column(columns::GEOMETRY) && !spec.contains_key(columns::GEOMETRY) {
        spec.insert(columns::GEOMETRY.to_string(), AggFunction::First);
    }
    if data.has_column(columns::SPATIAL_GROUP) && !spec.contains_key(columns::SPATIAL_GROUP) {
        spec.insert(columns::SPATIAL_GROUP.to_string(), AggFunction::First);
    }
    // Consumed as grouping input, not reduced values.
    spec.shift_remove(columns::TIME_START);
    spec.shift_remove(columns::TIME_END);
    spec
}

/// Derive the group key for every record by truncating `time_start` to the
/// requested period. Records with a null `time_start` drop from the grouped
/// result, like any other null group key.
fn period_groups(
    data: &Dataset,
    granularity: TemporalGranularity,
) -> Result<IndexMap<String, Vec<usize>>, Error> {
    if !data.has_column(columns::TIME_START) || !data.has_column(columns::TIME_END) {
        return Err(Error::Validation(
            "data must have time_start and time_end columns".to_string(),
        ));
    }
    let starts = match data.column(columns::TIME_START) {
        Some(Column::Time(values)) => values,
        _ => {
            return Err(Error::Validation(
                "time_start must be a timestamp column".to_string(),
            ))
        }
    };
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (row, start) in starts.iter().enumerate() {
        let Some(start) = start else { continue };
        if let Some(label) = period_label(*start, granularity) {
            groups.entry(label).or_default().push(row);
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::value::Value;
    use chrono::{TimeZone, Utc};

    fn indexed(dates: &[(i32, u32, u32)], values: &[i64]) -> Dataset {
        let times: Vec<_> = dates
            .iter()
            .map(|(y, m, d)| Utc.with_ymd_and_hms(*y, *m, *d, 12, 0, 0).single())
            .collect();
        let mut data = Dataset::new();
        data.insert_column("time_start", Column::Time(times.clone()))
            .unwrap();
        data.insert_column("time_end", Column::Time(times)).unwrap();
        data.insert_column(
            "value",
            Column::Int(values.iter().copied().map(Some).collect()),
        )
        .unwrap();
        data
    }

    #[test]
    fn year_collapses_same_year_records() {
        let d = indexed(
            &[(2023, 1, 5), (2023, 3, 9), (2023, 6, 1), (2023, 9, 9), (2023, 12, 31)],
            &[20, 20, 20, 20, 20],
        );
        let mut spec = AggSpec::new();
        spec.insert("value".to_string(), AggFunction::Sum);
        spec.insert("count".to_string(), AggFunction::Size);
        let out = aggregate_temporal(&d, TemporalGranularity::Year, Some(&spec)).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.value("temporal_group", 0), Value::Str("2023".into()));
        assert_eq!(out.value("value", 0), Value::Int(100));
        assert_eq!(out.value("count", 0), Value::Int(5));
        // grouping input never reaches the output
        assert!(!out.has_column("time_start"));
        assert!(!out.has_column("time_end"));
    }

    #[test]
    fn day_splits_calendar_days() {
        let d = indexed(
            &[(2023, 1, 1), (2023, 1, 1), (2023, 1, 1), (2023, 1, 2), (2023, 1, 2)],
            &[10, 15, 20, 40, 60],
        );
        let mut spec = AggSpec::new();
        spec.insert("value".to_string(), AggFunction::Mean);
        spec.insert("count".to_string(), AggFunction::Size);
        let out = aggregate_temporal(&d, TemporalGranularity::Day, Some(&spec)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.value("temporal_group", 0), Value::Str("2023-01-01".into()));
        assert_eq!(out.value("value", 0), Value::Float(15.0));
        assert_eq!(out.value("count", 0), Value::Int(3));
        assert_eq!(out.value("value", 1), Value::Float(50.0));
        assert_eq!(out.value("count", 1), Value::Int(2));
    }

    #[test]
    fn custom_requires_group_column() {
        let d = indexed(&[(2023, 1, 1)], &[1]);
        assert!(matches!(
            aggregate_temporal(&d, TemporalGranularity::Custom, None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn preserves_geometry_and_spatial_group_with_first() {
        let mut d = indexed(&[(2023, 1, 1), (2023, 1, 1)], &[1, 3]);
        d.insert_column(
            "geometry",
            Column::Geom(vec![
                Some(Geometry::point(1.0, 1.0)),
                Some(Geometry::point(2.0, 2.0)),
            ]),
        )
        .unwrap();
        d.insert_column(
            "spatial_group",
            Column::Str(vec![Some("A".into()), Some("A".into())]),
        )
        .unwrap();
        let out = aggregate_temporal(&d, TemporalGranularity::Day, None).unwrap();
        assert_eq!(
            out.value("geometry", 0),
            Value::Geom(Geometry::point(1.0, 1.0))
        );
        assert_eq!(out.value("spatial_group", 0), Value::Str("A".into()));
        assert_eq!(out.value("value", 0), Value::Float(2.0));
    }

    #[test]
    fn missing_time_columns_fail() {
        let mut d = Dataset::new();
        d.insert_column("value", Column::Int(vec![Some(1)])).unwrap();
        assert!(matches!(
            aggregate_temporal(&d, TemporalGranularity::Day, None),
            Err(Error::Validation(_))
        ));
    }
}
