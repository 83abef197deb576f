// Spatial-type detection as an ordered chain of named strategies.
//
// Priority: an existing geometry column wins, then column-name tokens, then
// content sniffing on the first non-null value, then the point default. Each
// strategy returns `Some` on a match and `None` to pass, so the order is
// explicit and each step is testable on its own.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dataset::{columns, Dataset};
use crate::options::SpatialType;
use crate::value::Column;

static COORD_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+\.\d+,\s*-?\d+\.\d+$").expect("coordinate pair pattern")
});
static CODE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9-]+$").expect("code token pattern"));

const POINT_TOKENS: &[&str] = &["lat", "latitude", "lon", "longitude", "x", "y"];
const POLYGON_TOKENS: &[&str] = &["polygon", "geom", "shape", "boundary"];
const ADDRESS_TOKENS: &[&str] = &["address", "street", "city", "zip", "postal"];
const CODE_TOKENS: &[&str] = &["code", "id", "fips", "iso", "region"];

/// Run the detection chain over the candidate columns.
pub fn detect_spatial_type(data: &Dataset, spatial_columns: &[String]) -> SpatialType {
    detect_existing_geometry(data)
        .or_else(|| detect_from_column_names(spatial_columns))
        .or_else(|| detect_from_content(data, spatial_columns))
        .unwrap_or(SpatialType::Point)
}

/// Strategy 1: the dataset already carries geometry. Polygonal if any value
/// is a polygon, otherwise point.
pub fn detect_existing_geometry(data: &Dataset) -> Option<SpatialType> {
    match data.column(columns::GEOMETRY)? {
        Column::Geom(geoms) => {
            let polygonal = geoms
                .iter()
                .flatten()
                .any(|g| g.is_polygonal());
            Some(if polygonal {
                SpatialType::Polygon
            } else {
                SpatialType::Point
            })
        }
        _ => None,
    }
}

/// Strategy 2: case-insensitive token search over the joined column names.
pub fn detect_from_column_names(spatial_columns: &[String]) -> Option<SpatialType> {
    let joined = spatial_columns.join(" ").to_lowercase();
    if POINT_TOKENS.iter().any(|t| joined.contains(t)) {
        Some(SpatialType::Point)
    } else if POLYGON_TOKENS.iter().any(|t| joined.contains(t)) {
        Some(SpatialType::Polygon)
    } else if ADDRESS_TOKENS.iter().any(|t| joined.contains(t)) {
        Some(SpatialType::Address)
    } else if CODE_TOKENS.iter().any(|t| joined.contains(t)) {
        Some(SpatialType::Code)
    } else {
        None
    }
}

/// Strategy 3: sniff the first non-null string value of each candidate
/// column: coordinate pairs and WKT points are points, WKT polygons are
/// polygons, multi-word strings look like addresses, all-uppercase tokens
/// look like codes.
pub fn detect_from_content(data: &Dataset, spatial_columns: &[String]) -> Option<SpatialType> {
    for name in spatial_columns {
        let Some(column) = data.column(name) else {
            continue;
        };
        let Some(sample) = first_non_null_str(column, data.len()) else {
            continue;
        };
        if COORD_PAIR.is_match(sample) {
            return Some(SpatialType::Point);
        }
        if sample.starts_with("POLYGON") || sample.starts_with("MULTIPOLYGON") {
            return Some(SpatialType::Polygon);
        }
        if sample.starts_with("POINT") {
            return Some(SpatialType::Point);
        }
        if sample.split_whitespace().count() > 2 {
            return Some(SpatialType::Address);
        }
        if CODE_TOKEN.is_match(sample) {
            return Some(SpatialType::Code);
        }
    }
    None
}

fn first_non_null_str(column: &Column, rows: usize) -> Option<&str> {
    for row in 0..rows {
        if let Some(s) = column.str_at(row) {
            return Some(s);
        }
        if !column.get(row).is_null() {
            // Non-string sample: content sniffing only applies to strings.
            return None;
        }
    }
    None
}
