// Geometry construction from spatial columns.
//
// Points come from a lat/lon column pair or a single "lat,lon" string
// column; polygons from one WKT column. Address and code columns get the
// placeholder treatment: geocoding and boundary lookup are external
// collaborators, so every record receives the origin sentinel and the result
// carries a notice saying so.
use tracing::warn;

use crate::dataset::{columns, Dataset};
use crate::detect::detect_spatial_type;
use crate::error::Error;
use crate::geometry::Geometry;
use crate::notice::{Notice, Outcome};
use crate::options::SpatialType;
use crate::value::Column;

const LAT_TOKENS: &[&str] = &["lat", "latitude", "y"];
const LON_TOKENS: &[&str] = &["lon", "longitude", "lng", "x"];

/// Build a `geometry` column from the spatial column(s) and tag the result
/// with the requested CRS.
pub fn create_geometry(
    data: &Dataset,
    spatial_columns: &[String],
    spatial_type: SpatialType,
    crs: &str,
) -> Result<Outcome<Dataset>, Error> {
    let resolved = match spatial_type {
        SpatialType::Auto => detect_spatial_type(data, spatial_columns),
        other => other,
    };
    let outcome = match resolved {
        SpatialType::Point => Outcome::clean(build_points(data, spatial_columns)?),
        SpatialType::Polygon => Outcome::clean(build_polygons(data, spatial_columns)?),
        SpatialType::Address | SpatialType::Code => build_placeholders(data, resolved)?,
        SpatialType::Auto => unreachable!("auto resolves before construction"),
    };
    Ok(Outcome::new(
        outcome.value.with_crs(crs),
        outcome.notices,
    ))
}

fn build_points(data: &Dataset, spatial_columns: &[String]) -> Result<Dataset, Error> {
    // Already point-typed geometry: nothing to construct.
    if let Some(Column::Geom(geoms)) = data.column(columns::GEOMETRY) {
        if geoms.iter().flatten().all(|g| !g.is_polygonal()) {
            return Ok(data.clone());
        }
    }

    if let Some((lat_col, lon_col)) = find_lat_lon(spatial_columns) {
        if data.has_column(lat_col) && data.has_column(lon_col) {
            return points_from_pair(data, lat_col, lon_col);
        }
    }

    if let [col] = spatial_columns {
        if let Some(column) = data.column(col) {
            if matches!(column, Column::Str(_)) {
                return points_from_strings(data, col);
            }
        }
    }

    Err(Error::GeometryConstruction(
        "could not create point geometry from the provided columns".to_string(),
    ))
}

/// Match one column to latitude-like names and one to longitude-like names.
fn find_lat_lon(spatial_columns: &[String]) -> Option<(&str, &str)> {
    let mut lat = None;
    let mut lon = None;
    for col in spatial_columns {
        let lower = col.to_lowercase();
        if LAT_TOKENS.iter().any(|t| lower.contains(t)) {
            lat.get_or_insert(col.as_str());
        } else if LON_TOKENS.iter().any(|t| lower.contains(t)) {
            lon.get_or_insert(col.as_str());
        }
    }
    Some((lat?, lon?))
}

fn points_from_pair(data: &Dataset, lat_col: &str, lon_col: &str) -> Result<Dataset, Error> {
    let lat = data.column(lat_col).ok_or_else(|| missing(lat_col))?;
    let lon = data.column(lon_col).ok_or_else(|| missing(lon_col))?;
    let mut geoms = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let (y, x) = match (lat.f64_at(row), lon.f64_at(row)) {
            (Some(y), Some(x)) => (y, x),
            _ => {
                return Err(Error::GeometryConstruction(format!(
                    "non-numeric or null coordinate in '{}'/'{}' at row {}",
                    lat_col, lon_col, row
                )))
            }
        };
        geoms.push(Some(Geometry::point(x, y)));
    }
    data.with_column(columns::GEOMETRY, Column::Geom(geoms))
}

/// Single column holding `"lat,lon"` strings.
fn points_from_strings(data: &Dataset, col: &str) -> Result<Dataset, Error> {
    let column = data.column(col).ok_or_else(|| missing(col))?;
    let mut geoms = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let raw = column.str_at(row).ok_or_else(|| {
            Error::GeometryConstruction(format!("null spatial value in '{}' at row {}", col, row))
        })?;
        let (lat_s, lon_s) = raw.split_once(',').ok_or_else(|| bad_pair(col, raw, row))?;
        let y: f64 = lat_s
            .trim()
            .parse()
            .map_err(|_| bad_pair(col, raw, row))?;
        let x: f64 = lon_s
            .trim()
            .parse()
            .map_err(|_| bad_pair(col, raw, row))?;
        geoms.push(Some(Geometry::point(x, y)));
    }
    data.with_column(columns::GEOMETRY, Column::Geom(geoms))
}

fn build_polygons(data: &Dataset, spatial_columns: &[String]) -> Result<Dataset, Error> {
    // Already polygon-typed geometry: nothing to construct.
    if let Some(Column::Geom(geoms)) = data.column(columns::GEOMETRY) {
        if geoms.iter().flatten().any(|g| g.is_polygonal()) {
            return Ok(data.clone());
        }
    }

    let [col] = spatial_columns else {
        return Err(Error::GeometryConstruction(
            "polygon geometry needs exactly one WKT column".to_string(),
        ));
    };
    let column = data.column(col).ok_or_else(|| missing(col))?;
    let mut geoms = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let raw = column.str_at(row).ok_or_else(|| {
            Error::GeometryConstruction(format!("null spatial value in '{}' at row {}", col, row))
        })?;
        geoms.push(Some(Geometry::parse_wkt(raw)?));
    }
    data.with_column(columns::GEOMETRY, Column::Geom(geoms))
}

/// Address/code placeholder: sentinel origin points plus a notice. Real
/// geocoding and boundary lookup live outside this crate.
fn build_placeholders(
    data: &Dataset,
    spatial_type: SpatialType,
) -> Result<Outcome<Dataset>, Error> {
    let notice = Notice::PlaceholderGeometry { spatial_type };
    warn!(%notice, "emitting placeholder geometry");
    let geoms = vec![Some(Geometry::origin()); data.len()];
    let out = data.with_column(columns::GEOMETRY, Column::Geom(geoms))?;
    Ok(Outcome::new(out, vec![notice]))
}

fn missing(col: &str) -> Error {
    Error::Validation(format!("missing spatial column: {}", col))
}

fn bad_pair(col: &str, raw: &str, row: usize) -> Error {
    Error::GeometryConstruction(format!(
        "value '{}' in '{}' at row {} is not a 'lat,lon' pair",
        raw, col, row
    ))
}
