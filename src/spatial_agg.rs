// Spatial aggregation: partition records into spatial groups and reduce.
//
// Grid mode lays a fixed 10x10 rectangular partition over the bounding box
// of all geometries. Hexgrid is accepted as an alias and currently uses the
// same rectangular partition. Administrative levels have no boundary data
// here and fall back to the grid in an explicit degraded mode.
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::agg::{group_by_column, reduce_groups, AggSpec};
use crate::dataset::{columns, Dataset};
use crate::error::Error;
use crate::geometry::{total_bounds, Rect};
use crate::notice::{Notice, Outcome};
use crate::options::{AggFunction, SpatialGranularity};
use crate::value::Column;

/// Cells per axis of the fixed grid partition.
pub const GRID_CELLS_PER_AXIS: usize = 10;

/// Aggregate a geometry-bearing dataset at the requested spatial
/// granularity. With no function mapping, every numeric column reduces with
/// `mean`; `geometry` defaults to `first`.
pub fn aggregate_spatial(
    data: &Dataset,
    granularity: SpatialGranularity,
    spec: Option<&AggSpec>,
) -> Result<Outcome<Dataset>, Error> {
    let spec = effective_spec(data, spec);
    let data = synthesize_count(data, &spec)?;

    match granularity {
        SpatialGranularity::Custom => {
            if !data.has_column(columns::SPATIAL_GROUP) {
                return Err(Error::Validation(
                    "for custom spatial granularity, data must have a 'spatial_group' column"
                        .to_string(),
                ));
            }
            let groups = group_by_column(&data, columns::SPATIAL_GROUP)?;
            debug!(groups = groups.len(), "custom spatial aggregation");
            Ok(Outcome::clean(reduce_groups(
                &data,
                columns::SPATIAL_GROUP,
                &groups,
                &spec,
            )?))
        }
        SpatialGranularity::Grid | SpatialGranularity::Hexgrid => {
            Ok(Outcome::clean(aggregate_by_grid(&data, &spec)?))
        }
        admin => {
            // Degraded mode: callers must not rely on per-administrative-unit
            // correctness from this fallback.
            let notice = Notice::AdminBoundaryFallback { granularity: admin };
            warn!(%notice, "administrative aggregation degraded to grid");
            let value = aggregate_by_grid(&data, &spec)?;
            Ok(Outcome::new(value, vec![notice]))
        }
    }
}

/// Fill in the defaults: caller mapping, or `mean` over every numeric
/// column; `geometry` reduces with `first` unless overridden.
fn effective_spec(data: &Dataset, spec: Option<&AggSpec>) -> AggSpec {
    let mut spec = match spec {
        Some(s) => s.clone(),
        None => data
            .numeric_column_names()
            .into_iter()
            .map(|n| (n, AggFunction::Mean))
            .collect(),
    };
    if !spec.contains_key(columns::GEOMETRY) {
        spec.insert(columns::GEOMETRY.to_string(), AggFunction::First);
    }
    spec
}

/// A requested `count` column that does not exist is synthesized as the
/// constant 1 before grouping.
pub(crate) fn synthesize_count(data: &Dataset, spec: &AggSpec) -> Result<Dataset, Error> {
    if spec.contains_key(columns::COUNT) && !data.has_column(columns::COUNT) {
        data.with_column(columns::COUNT, Column::filled_int(data.len(), 1))
    } else {
        Ok(data.clone())
    }
}

fn aggregate_by_grid(data: &Dataset, spec: &AggSpec) -> Result<Dataset, Error> {
    let geometry = data.column(columns::GEOMETRY).ok_or_else(|| {
        Error::Validation("data must have a geometry column".to_string())
    })?;

    let cells = match total_bounds((0..data.len()).filter_map(|r| geometry.geom_at(r))) {
        Some(bounds) => grid_cells(&bounds),
        None => Vec::new(),
    };

    // O(records x cells): assign each record the first cell containing it;
    // records within no cell drop from the grouped result.
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for row in 0..data.len() {
        let Some(geom) = geometry.geom_at(row) else {
            continue;
        };
        if let Some((id, _)) = cells.iter().find(|(_, rect)| geom.within(rect)) {
            groups.entry(id.clone()).or_default().push(row);
        }
    }
    debug!(cells = cells.len(), groups = groups.len(), "grid aggregation");
    reduce_groups(data, columns::CELL_ID, &groups, spec)
}

/// The fixed partition: equal-width, equal-height cells labeled `"i_j"`
/// with `i` along x and `j` along y.
fn grid_cells(bounds: &Rect) -> Vec<(String, Rect)> {
    let size_x = (bounds.max_x - bounds.min_x) / GRID_CELLS_PER_AXIS as f64;
    let size_y = (bounds.max_y - bounds.min_y) / GRID_CELLS_PER_AXIS as f64;
    let mut cells = Vec::with_capacity(GRID_CELLS_PER_AXIS * GRID_CELLS_PER_AXIS);
    for i in 0..GRID_CELLS_PER_AXIS {
        for j in 0..GRID_CELLS_PER_AXIS {
            let rect = Rect {
                min_x: bounds.min_x + i as f64 * size_x,
                min_y: bounds.min_y + j as f64 * size_y,
                max_x: bounds.min_x + (i + 1) as f64 * size_x,
                max_y: bounds.min_y + (j + 1) as f64 * size_y,
            };
            cells.push((format!("{}_{}", i, j), rect));
        }
    }
    cells
}
