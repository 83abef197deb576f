use indexmap::IndexMap;

use staggr::{
    aggregate, evaluate_consistency, index, AggFunction, AggSpec, Column, Dataset, Error, Metric,
    SpatialGranularity, SpatialType, TemporalFormat, TemporalGranularity, Value,
};

fn floats(v: &[f64]) -> Column {
    Column::Float(v.iter().copied().map(Some).collect())
}

fn strings(v: &[&str]) -> Column {
    Column::Str(v.iter().map(|s| Some(s.to_string())).collect())
}

fn indexed_sample() -> Dataset {
    let mut data = Dataset::new();
    data.insert_column("lat", floats(&[0.5, 0.6, 5.0, 5.2, 9.5])).unwrap();
    data.insert_column("lon", floats(&[0.5, 0.7, 5.0, 5.3, 9.4])).unwrap();
    data.insert_column(
        "date",
        strings(&[
            "2023-01-01",
            "2023-01-01",
            "2023-01-01",
            "2023-01-02",
            "2023-01-02",
        ]),
    )
    .unwrap();
    data.insert_column("value", floats(&[10.0, 15.0, 20.0, 25.0, 30.0])).unwrap();
    index(
        &data,
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
fn indexing_preserves_rows_and_attaches_reserved_columns() {
    let indexed = indexed_sample();
    assert_eq!(indexed.len(), 5);
    for col in ["geometry", "time_start", "time_end"] {
        let column = indexed.column(col).unwrap();
        assert!(!column.has_nulls(), "{col} should be fully populated");
    }
    // Spatial source columns survive indexing; temporal ones are consumed.
    assert!(indexed.has_column("lat"));
    assert!(!indexed.has_column("date"));
}

#[test]
fn custom_spatial_groups_get_exact_sums_and_counts() {
    // Each spatial group sits in its own day so the temporal pass keeps the
    // groups apart.
    let mut data = Dataset::new();
    data.insert_column("lat", floats(&[1.0, 1.1, 1.2, 2.0, 2.1])).unwrap();
    data.insert_column("lon", floats(&[1.0, 1.1, 1.2, 2.0, 2.1])).unwrap();
    data.insert_column(
        "date",
        strings(&[
            "2023-01-01",
            "2023-01-01",
            "2023-01-01",
            "2023-01-02",
            "2023-01-02",
        ]),
    )
    .unwrap();
    data.insert_column("value", floats(&[10.0, 15.0, 30.0, 20.0, 25.0])).unwrap();
    let mut data = index(
        &data,
        &["lat".to_string(), "lon".to_string()],
        &["date".to_string()],
        SpatialType::Auto,
        TemporalFormat::Auto,
        "EPSG:4326",
    )
    .unwrap()
    .into_value();
    data.insert_column("spatial_group", strings(&["A", "A", "A", "B", "B"])).unwrap();

    let mut spec = AggSpec::new();
    spec.insert("value".to_string(), AggFunction::Sum);
    spec.insert("count".to_string(), AggFunction::Sum);

    let result = aggregate(
        &data,
        SpatialGranularity::Custom,
        TemporalGranularity::Day,
        Some(&spec),
    )
    .unwrap()
    .into_value();

    let mut seen = IndexMap::new();
    for row in 0..result.len() {
        let key = result.value("spatial_group", row).render();
        seen.insert(
            key,
            (
                result.value("value", row),
                result.value("count", row),
            ),
        );
    }
    assert_eq!(seen["A"], (Value::Float(55.0), Value::Int(3)));
    assert_eq!(seen["B"], (Value::Float(45.0), Value::Int(2)));
}

#[test]
fn year_granularity_collapses_to_one_period() {
    let mut spec = AggSpec::new();
    spec.insert("value".to_string(), AggFunction::Sum);

    let result = aggregate(
        &indexed_sample(),
        SpatialGranularity::Custom,
        TemporalGranularity::Year,
        Some(&spec),
    );
    // Custom without a spatial_group column must fail, not silently grid.
    assert!(matches!(result, Err(Error::Validation(_))));

    let mut data = indexed_sample();
    data.insert_column("spatial_group", strings(&["A"; 5])).unwrap();
    let result = aggregate(
        &data,
        SpatialGranularity::Custom,
        TemporalGranularity::Year,
        Some(&spec),
    )
    .unwrap()
    .into_value();
    assert_eq!(result.len(), 1);
    assert_eq!(result.value("temporal_group", 0), Value::Str("2023".into()));
    assert_eq!(result.value("value", 0), Value::Float(100.0));
}

#[test]
fn day_granularity_splits_periods_with_correct_means() {
    // One spatial group per row so the spatial pass is a pass-through and
    // the temporal pass does the real grouping.
    let mut data = indexed_sample();
    data.insert_column("spatial_group", strings(&["a", "b", "c", "d", "e"])).unwrap();

    let result = aggregate(
        &data,
        SpatialGranularity::Custom,
        TemporalGranularity::Day,
        None,
    )
    .unwrap()
    .into_value();

    assert_eq!(result.len(), 2);
    let mut by_day = IndexMap::new();
    for row in 0..result.len() {
        by_day.insert(
            result.value("temporal_group", row).render(),
            result.value("value", row),
        );
    }
    assert_eq!(by_day["2023-01-01"], Value::Float(15.0));
    assert_eq!(by_day["2023-01-02"], Value::Float(27.5));
}

#[test]
fn grid_never_produces_more_groups_than_rows_or_cells() {
    let result = aggregate(
        &indexed_sample(),
        SpatialGranularity::Grid,
        TemporalGranularity::Year,
        None,
    )
    .unwrap()
    .into_value();
    assert!(result.len() <= 5);
    assert!(result.len() <= 100);
    assert!(result.has_column("cell_id"));
}

#[test]
fn administrative_granularity_degrades_with_notice() {
    let outcome = aggregate(
        &indexed_sample(),
        SpatialGranularity::Municipality,
        TemporalGranularity::Year,
        None,
    )
    .unwrap();
    assert!(outcome.has_notices());
    assert!(outcome.value.has_column("cell_id"));
}

#[test]
fn custom_temporal_granularity_requires_its_column() {
    let err = aggregate(
        &indexed_sample(),
        SpatialGranularity::Grid,
        TemporalGranularity::Custom,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn completeness_is_bounded_and_full_on_clean_aggregates() {
    let result = aggregate(
        &indexed_sample(),
        SpatialGranularity::Grid,
        TemporalGranularity::Year,
        None,
    )
    .unwrap()
    .into_value();
    let scores = evaluate_consistency(&result, None);
    for (metric, score) in &scores {
        assert!(
            score.is_finite() && *score >= 0.0,
            "{metric} out of range: {score}"
        );
    }
    let completeness = scores[&Metric::Completeness];
    assert!((0.0..=1.0).contains(&completeness));
    if result.null_cell_count() == 0 {
        assert_eq!(completeness, 1.0);
    }
}

#[test]
fn aggregation_is_deterministic() {
    let data = indexed_sample();
    let a = aggregate(&data, SpatialGranularity::Grid, TemporalGranularity::Day, None)
        .unwrap()
        .into_value();
    let b = aggregate(&data, SpatialGranularity::Grid, TemporalGranularity::Day, None)
        .unwrap()
        .into_value();
    assert_eq!(a, b);
}
