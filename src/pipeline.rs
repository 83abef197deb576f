// The orchestrator: indexing composes validation, geometry construction,
// and temporal-range construction; aggregation composes the spatial and
// temporal passes, threading function-map defaults between them; the
// consistency scorer summarizes the final aggregate.
use indexmap::IndexMap;
use tracing::debug;

use crate::agg::AggSpec;
use crate::dataset::{columns, Dataset};
use crate::error::Error;
use crate::geometry::union_area;
use crate::notice::Outcome;
use crate::options::{
    AggFunction, Metric, SpatialGranularity, SpatialType, TemporalFormat, TemporalGranularity,
};
use crate::spatial::create_geometry;
use crate::spatial_agg::aggregate_spatial;
use crate::temporal::create_temporal_range;
use crate::temporal_agg::aggregate_temporal;
use crate::util::sample_variance;
use crate::validate::validate_data;
use crate::value::Column;

/// Index data spatially and temporally: Validator, then GeometryBuilder,
/// then TemporalRangeBuilder, failing fast with whichever stage's error
/// occurs first. The result carries one geometry and one
/// `time_start`/`time_end` pair per record.
pub fn index(
    data: &Dataset,
    spatial_columns: &[String],
    temporal_columns: &[String],
    spatial_type: SpatialType,
    temporal_format: TemporalFormat,
    crs: &str,
) -> Result<Outcome<Dataset>, Error> {
    validate_data(data, Some(spatial_columns), Some(temporal_columns))?;
    let with_geometry = create_geometry(data, spatial_columns, spatial_type, crs)?;
    let indexed = create_temporal_range(&with_geometry.value, temporal_columns, temporal_format)?;
    debug!(rows = indexed.len(), "indexed dataset");
    Ok(Outcome::new(indexed, with_geometry.notices))
}

/// Aggregate indexed data at the requested spatial and temporal
/// granularities: the spatial pass runs first, then the temporal pass over
/// its result, with `first`-preservation entries threaded between the two.
pub fn aggregate(
    data: &Dataset,
    spatial_granularity: SpatialGranularity,
    temporal_granularity: TemporalGranularity,
    agg_functions: Option<&AggSpec>,
) -> Result<Outcome<Dataset>, Error> {
    // Spatial pass: keep the time columns and geometry alive for the
    // temporal pass unless the caller said otherwise. With no caller
    // mapping the pass default applies, mean over every numeric column.
    let mut spatial_spec = agg_functions
        .cloned()
        .unwrap_or_else(|| default_spec(data));
    for preserved in [columns::TIME_START, columns::TIME_END, columns::GEOMETRY] {
        if !spatial_spec.contains_key(preserved) {
            spatial_spec.insert(preserved.to_string(), AggFunction::First);
        }
    }
    let spatial_out = aggregate_spatial(data, spatial_granularity, Some(&spatial_spec))?;
    let spatially_aggregated = spatial_out.value;

    // Which group-key column did the spatial pass produce? Administrative
    // fallback intentionally reports none.
    let spatial_group_col = match spatial_granularity {
        SpatialGranularity::Custom if spatially_aggregated.has_column(columns::SPATIAL_GROUP) => {
            Some(columns::SPATIAL_GROUP)
        }
        g if g.is_grid() && spatially_aggregated.has_column(columns::CELL_ID) => {
            Some(columns::CELL_ID)
        }
        _ => None,
    };

    // Temporal pass: preserve geometry and the spatial group key, and drop
    // the time columns from the mapping since they are grouping input.
    let mut temporal_spec = agg_functions
        .cloned()
        .unwrap_or_else(|| default_spec(&spatially_aggregated));
    if spatially_aggregated.has_column(columns::GEOMETRY)
        && !temporal_spec.contains_key(columns::GEOMETRY)
    {
        temporal_spec.insert(columns::GEOMETRY.to_string(), AggFunction::First);
    }
    if let Some(group_col) = spatial_group_col {
        if !temporal_spec.contains_key(group_col) {
            temporal_spec.insert(group_col.to_string(), AggFunction::First);
        }
    }
    temporal_spec.shift_remove(columns::TIME_START);
    temporal_spec.shift_remove(columns::TIME_END);

    if temporal_granularity == TemporalGranularity::Custom
        && !spatially_aggregated.has_column(columns::CUSTOM_TEMPORAL_GROUP)
    {
        // Re-deriving the custom labels here would silently paper over data
        // loss in the spatial pass; fail loudly instead.
        return Err(if data.has_column(columns::CUSTOM_TEMPORAL_GROUP) {
            Error::Validation(
                "custom temporal group column lost during spatial aggregation".to_string(),
            )
        } else {
            Error::Validation(
                "for custom temporal granularity, data must have a 'custom_temporal_group' column"
                    .to_string(),
            )
        });
    }

    let result = aggregate_temporal(
        &spatially_aggregated,
        temporal_granularity,
        Some(&temporal_spec),
    )?;
    Ok(Outcome::new(result, spatial_out.notices))
}

fn default_spec(data: &Dataset) -> AggSpec {
    data.numeric_column_names()
        .into_iter()
        .map(|n| (n, AggFunction::Mean))
        .collect()
}

/// Score an aggregated dataset. Never fails for a structurally valid
/// dataset; metrics that do not apply come back as 0.
pub fn evaluate_consistency(data: &Dataset, metrics: Option<&[Metric]>) -> IndexMap<Metric, f64> {
    let metrics = metrics.unwrap_or(Metric::ALL);
    let mut results = IndexMap::new();
    for metric in metrics {
        let value = match metric {
            Metric::Completeness => completeness(data),
            Metric::Variance => mean_variance(data),
            Metric::Density => density(data),
        };
        results.insert(*metric, value);
    }
    results
}

/// Share of non-null cells; 0 for an empty dataset.
fn completeness(data: &Dataset) -> f64 {
    let total = data.len() * data.width();
    if total == 0 {
        return 0.0;
    }
    (total - data.null_cell_count()) as f64 / total as f64
}

/// Mean of per-column sample variances across numeric columns, ignoring
/// nulls; columns with fewer than two values contribute nothing.
fn mean_variance(data: &Dataset) -> f64 {
    let mut variances = Vec::new();
    for name in data.numeric_column_names() {
        let Some(column) = data.column(&name) else {
            continue;
        };
        let values: Vec<f64> = (0..data.len()).filter_map(|r| column.f64_at(r)).collect();
        if let Some(var) = sample_variance(&values) {
            variances.push(var);
        }
    }
    if variances.is_empty() {
        0.0
    } else {
        variances.iter().sum::<f64>() / variances.len() as f64
    }
}

/// Records per unit of unioned geometry area; 0 when geometries are missing
/// or degenerate.
fn density(data: &Dataset) -> f64 {
    let Some(Column::Geom(geoms)) = data.column(columns::GEOMETRY) else {
        return 0.0;
    };
    let area = union_area(geoms.iter().flatten());
    if area > 0.0 {
        data.len() as f64 / area
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::value::Value;

    fn raw() -> Dataset {
        let mut d = Dataset::new();
        d.insert_column(
            "lat",
            Column::Float(vec![Some(0.5), Some(0.6), Some(5.0), Some(5.2), Some(9.5)]),
        )
        .unwrap();
        d.insert_column(
            "lon",
            Column::Float(vec![Some(0.5), Some(0.7), Some(5.0), Some(5.3), Some(9.4)]),
        )
        .unwrap();
        d.insert_column(
            "date",
            Column::Str(vec![
                Some("2023-01-01".into()),
                Some("2023-01-01".into()),
                Some("2023-01-01".into()),
                Some("2023-01-02".into()),
                Some("2023-01-02".into()),
            ]),
        )
        .unwrap();
        d.insert_column(
            "value",
            Column::Int(vec![Some(10), Some(15), Some(20), Some(25), Some(30)]),
        )
        .unwrap();
        d
    }

    fn indexed() -> Dataset {
        index(
            &raw(),
            &["lat".to_string(), "lon".to_string()],
            &["date".to_string()],
            SpatialType::Auto,
            TemporalFormat::Auto,
            "EPSG:4326",
        )
        .unwrap()
        .into_value()
    }

    #[test]
    fn index_preserves_rows_and_fills_reserved_columns() {
        let out = indexed();
        assert_eq!(out.len(), 5);
        for col in ["geometry", "time_start", "time_end"] {
            assert!(!out.column(col).unwrap().has_nulls());
        }
        assert!(!out.has_column("date"));
        assert_eq!(out.crs(), Some("EPSG:4326"));
    }

    #[test]
    fn aggregate_grid_then_day() {
        let out = aggregate(
            &indexed(),
            SpatialGranularity::Grid,
            TemporalGranularity::Day,
            None,
        )
        .unwrap();
        assert!(!out.has_notices());
        let result = out.value;
        assert!(result.has_column("temporal_group"));
        assert!(result.has_column("cell_id"));
        assert!(result.has_column("geometry"));
        assert!(!result.has_column("time_start"));
        assert!(result.len() <= 5);
    }

    #[test]
    fn aggregate_is_deterministic() {
        let data = indexed();
        let a = aggregate(
            &data,
            SpatialGranularity::Grid,
            TemporalGranularity::Day,
            None,
        )
        .unwrap()
        .into_value();
        let b = aggregate(
            &data,
            SpatialGranularity::Grid,
            TemporalGranularity::Day,
            None,
        )
        .unwrap()
        .into_value();
        assert_eq!(a, b);
    }

    #[test]
    fn custom_temporal_without_column_fails_loudly() {
        let err = aggregate(
            &indexed(),
            SpatialGranularity::Grid,
            TemporalGranularity::Custom,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Present on the input but dropped by the spatial pass: a distinct,
        // louder failure.
        let with_group = indexed()
            .with_column(
                "custom_temporal_group",
                Column::Str(vec![Some("x".into()); 5]),
            )
            .unwrap();
        let err = aggregate(
            &with_group,
            SpatialGranularity::Grid,
            TemporalGranularity::Custom,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("lost during spatial aggregation"));
    }

    #[test]
    fn consistency_metrics_for_simple_aggregate() {
        let mut d = Dataset::new();
        d.insert_column("value", Column::Float(vec![Some(1.0), Some(3.0)]))
            .unwrap();
        d.insert_column(
            "geometry",
            Column::Geom(vec![
                Some(Geometry::parse_wkt("POLYGON ((0 0, 2 0, 2 1, 0 1, 0 0))").unwrap()),
                Some(Geometry::parse_wkt("POLYGON ((0 0, 2 0, 2 1, 0 1, 0 0))").unwrap()),
            ]),
        )
        .unwrap();
        let scores = evaluate_consistency(&d, None);
        assert_eq!(scores[&Metric::Completeness], 1.0);
        assert_eq!(scores[&Metric::Variance], 2.0);
        // two records over a unioned area of 2
        assert_eq!(scores[&Metric::Density], 1.0);
    }

    #[test]
    fn completeness_bounds() {
        let mut d = Dataset::new();
        d.insert_column("a", Column::Int(vec![Some(1), None])).unwrap();
        let scores = evaluate_consistency(&d, Some(&[Metric::Completeness]));
        let c = scores[&Metric::Completeness];
        assert!((0.0..=1.0).contains(&c));
        assert_eq!(c, 0.5);

        let empty = Dataset::new();
        assert_eq!(
            evaluate_consistency(&empty, Some(&[Metric::Completeness]))[&Metric::Completeness],
            0.0
        );
    }
}
