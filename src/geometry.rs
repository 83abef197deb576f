// Point/polygon geometry with WKT round-tripping.
//
// The pipeline only needs planar points and simple polygons: bounds for the
// grid partition, containment for cell assignment, and union areas (boolean
// ops from the geo crate) for the density metric. Interior rings (holes) in
// WKT input are accepted but ignored.
use crate::error::Error;
use geo::{Area, BooleanOps, LineString, MultiPolygon as GeoMultiPolygon, Polygon as GeoPolygon};

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point { x: f64, y: f64 },
    Polygon { exterior: Vec<(f64, f64)> },
    MultiPolygon { polygons: Vec<Vec<(f64, f64)>> },
}

/// Axis-aligned rectangle used for bounds and grid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    /// Half-open containment: the min edges belong to the cell, the max
    /// edges do not. A point on the partition's global max edge therefore
    /// falls outside every cell.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { x, y }
    }

    /// The sentinel used where a real geometry cannot be produced.
    pub fn origin() -> Self {
        Geometry::Point { x: 0.0, y: 0.0 }
    }

    pub fn is_polygonal(&self) -> bool {
        matches!(
            self,
            Geometry::Polygon { .. } | Geometry::MultiPolygon { .. }
        )
    }

    fn vertices(&self) -> Vec<(f64, f64)> {
        match self {
            Geometry::Point { x, y } => vec![(*x, *y)],
            Geometry::Polygon { exterior } => exterior.clone(),
            Geometry::MultiPolygon { polygons } => {
                polygons.iter().flat_map(|p| p.iter().copied()).collect()
            }
        }
    }

    pub fn bounds(&self) -> Rect {
        let verts = self.vertices();
        let (x0, y0) = verts.first().copied().unwrap_or((0.0, 0.0));
        let mut rect = Rect {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in verts {
            rect.expand(x, y);
        }
        rect
    }

    /// "Within" test against a rectangle: a point must lie inside it, a
    /// polygon must have every exterior vertex inside it.
    pub fn within(&self, rect: &Rect) -> bool {
        let verts = self.vertices();
        !verts.is_empty() && verts.iter().all(|(x, y)| rect.contains(*x, *y))
    }

    /// Planar area by the shoelace formula. Points have zero area.
    pub fn area(&self) -> f64 {
        match self {
            Geometry::Point { .. } => 0.0,
            Geometry::Polygon { exterior } => ring_area(exterior),
            Geometry::MultiPolygon { polygons } => polygons.iter().map(|p| ring_area(p)).sum(),
        }
    }

    /// Parse a WKT string: `POINT (x y)`, `POLYGON ((...))` with optional
    /// ignored holes, or `MULTIPOLYGON (((...)), ...)`.
    pub fn parse_wkt(input: &str) -> Result<Self, Error> {
        let s = input.trim();
        if let Some(rest) = strip_tag(s, "MULTIPOLYGON") {
            let body = strip_parens(rest)
                .ok_or_else(|| wkt_error(s, "expected parenthesized polygon list"))?;
            let mut polygons = Vec::new();
            for group in split_groups(body) {
                let poly_body = strip_parens(group.trim())
                    .ok_or_else(|| wkt_error(s, "expected parenthesized ring list"))?;
                let rings = split_groups(poly_body);
                let first = rings
                    .first()
                    .ok_or_else(|| wkt_error(s, "polygon has no rings"))?;
                let ring_body = strip_parens(first.trim())
                    .ok_or_else(|| wkt_error(s, "expected parenthesized ring"))?;
                polygons.push(parse_ring(ring_body, s)?);
            }
            if polygons.is_empty() {
                return Err(wkt_error(s, "multipolygon has no polygons"));
            }
            return Ok(Geometry::MultiPolygon { polygons });
        }
        if let Some(rest) = strip_tag(s, "POLYGON") {
            let body = strip_parens(rest)
                .ok_or_else(|| wkt_error(s, "expected parenthesized ring list"))?;
            let rings = split_groups(body);
            let first = rings
                .first()
                .ok_or_else(|| wkt_error(s, "polygon has no rings"))?;
            let ring_body = strip_parens(first.trim())
                .ok_or_else(|| wkt_error(s, "expected parenthesized ring"))?;
            return Ok(Geometry::Polygon {
                exterior: parse_ring(ring_body, s)?,
            });
        }
        if let Some(rest) = strip_tag(s, "POINT") {
            let body =
                strip_parens(rest).ok_or_else(|| wkt_error(s, "expected parenthesized pair"))?;
            let (x, y) = parse_pair(body, s)?;
            return Ok(Geometry::Point { x, y });
        }
        Err(wkt_error(s, "unrecognized WKT tag"))
    }

    pub fn to_wkt(&self) -> String {
        match self {
            Geometry::Point { x, y } => format!("POINT ({} {})", x, y),
            Geometry::Polygon { exterior } => format!("POLYGON (({}))", format_ring(exterior)),
            Geometry::MultiPolygon { polygons } => {
                let parts: Vec<String> = polygons
                    .iter()
                    .map(|p| format!("(({}))", format_ring(p)))
                    .collect();
                format!("MULTIPOLYGON ({})", parts.join(", "))
            }
        }
    }
}

/// Bounding box of a collection of geometries; `None` when empty.
pub fn total_bounds<'a>(geoms: impl Iterator<Item = &'a Geometry>) -> Option<Rect> {
    let mut acc: Option<Rect> = None;
    for geom in geoms {
        let b = geom.bounds();
        match &mut acc {
            None => acc = Some(b),
            Some(rect) => {
                rect.expand(b.min_x, b.min_y);
                rect.expand(b.max_x, b.max_y);
            }
        }
    }
    acc
}

/// Area of the union of geometries. Identical geometries are collapsed
/// first (aggregated outputs repeat cell/region geometry verbatim across
/// rows), then distinct polygons go through a boolean union so partial
/// overlaps are counted once. Points contribute nothing.
pub fn union_area<'a>(geoms: impl Iterator<Item = &'a Geometry>) -> f64 {
    let mut seen: Vec<&Geometry> = Vec::new();
    for geom in geoms {
        if !seen.contains(&geom) {
            seen.push(geom);
        }
    }
    let mut acc: Option<GeoMultiPolygon<f64>> = None;
    for geom in seen {
        let rings: Vec<&[(f64, f64)]> = match geom {
            Geometry::Point { .. } => continue,
            Geometry::Polygon { exterior } => vec![exterior.as_slice()],
            Geometry::MultiPolygon { polygons } => {
                polygons.iter().map(|p| p.as_slice()).collect()
            }
        };
        let polys: Vec<GeoPolygon<f64>> = rings
            .into_iter()
            .map(|r| GeoPolygon::new(LineString::from(r.to_vec()), Vec::new()))
            .collect();
        let mp = GeoMultiPolygon::new(polys);
        acc = Some(match acc {
            None => mp,
            Some(built) => built.union(&mp),
        });
    }
    acc.map_or(0.0, |mp| mp.unsigned_area())
}

fn ring_area(ring: &[(f64, f64)]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let (x1, y1) = ring[i];
        let (x2, y2) = ring[(i + 1) % ring.len()];
        sum += x1 * y2 - x2 * y1;
    }
    (sum / 2.0).abs()
}

fn wkt_error(input: &str, reason: &str) -> Error {
    Error::GeometryConstruction(format!("invalid WKT '{}': {}", input, reason))
}

// The tags are ASCII, so a byte-length prefix slice either lands on a char
// boundary or the input cannot match; `get` handles the latter.
fn strip_tag<'a>(s: &'a str, tag: &str) -> Option<&'a str> {
    let head = s.get(..tag.len())?;
    if head.eq_ignore_ascii_case(tag) {
        Some(s[tag.len()..].trim_start())
    } else {
        None
    }
}

fn strip_parens(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.starts_with('(') && s.ends_with(')') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

/// Split a WKT body on top-level commas, respecting nested parentheses.
fn split_groups(body: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                groups.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    groups.push(&body[start..]);
    groups
}

fn parse_ring(body: &str, original: &str) -> Result<Vec<(f64, f64)>, Error> {
    let mut ring = Vec::new();
    for pair in body.split(',') {
        ring.push(parse_pair(pair, original)?);
    }
    if ring.len() < 3 {
        return Err(wkt_error(original, "ring needs at least three vertices"));
    }
    Ok(ring)
}

fn parse_pair(s: &str, original: &str) -> Result<(f64, f64), Error> {
    let mut it = s.split_whitespace();
    let x = it
        .next()
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| wkt_error(original, "expected numeric coordinate pair"))?;
    let y = it
        .next()
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(|| wkt_error(original, "expected numeric coordinate pair"))?;
    if it.next().is_some() {
        return Err(wkt_error(original, "expected exactly two coordinates"));
    }
    Ok((x, y))
}

fn format_ring(ring: &[(f64, f64)]) -> String {
    ring.iter()
        .map(|(x, y)| format!("{} {}", x, y))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point_wkt() {
        let g = Geometry::parse_wkt("POINT (1.5 -2.5)").unwrap();
        assert_eq!(g, Geometry::point(1.5, -2.5));
        assert_eq!(g.to_wkt(), "POINT (1.5 -2.5)");
    }

    #[test]
    fn parses_polygon_and_computes_area() {
        let g = Geometry::parse_wkt("POLYGON ((0 0, 4 0, 4 2, 0 2, 0 0))").unwrap();
        assert!(g.is_polygonal());
        assert_eq!(g.area(), 8.0);
        let b = g.bounds();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 4.0, 2.0));
    }

    #[test]
    fn parses_multipolygon() {
        let g = Geometry::parse_wkt(
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 1, 0 0)), ((2 2, 3 2, 3 3, 2 3, 2 2)))",
        )
        .unwrap();
        assert_eq!(g.area(), 2.0);
    }

    #[test]
    fn rejects_malformed_wkt() {
        assert!(Geometry::parse_wkt("CIRCLE (0 0 5)").is_err());
        assert!(Geometry::parse_wkt("POINT (1.0)").is_err());
        assert!(Geometry::parse_wkt("POLYGON ((0 0, 1 1))").is_err());
    }

    #[test]
    fn half_open_containment() {
        let rect = Rect {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 1.0,
            max_y: 1.0,
        };
        assert!(Geometry::point(0.0, 0.0).within(&rect));
        assert!(Geometry::point(0.5, 0.5).within(&rect));
        assert!(!Geometry::point(1.0, 0.5).within(&rect));
    }

    #[test]
    fn union_area_deduplicates_repeats() {
        let a = Geometry::parse_wkt("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let dup = a.clone();
        let geoms = [a, dup];
        assert_eq!(union_area(geoms.iter()), 1.0);
    }

    #[test]
    fn union_area_counts_overlap_once() {
        // Two unit squares sharing a 0.5-wide strip: union is 1.5, not 2.0.
        let a = Geometry::parse_wkt("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        let b = Geometry::parse_wkt("POLYGON ((0.5 0, 1.5 0, 1.5 1, 0.5 1, 0.5 0))").unwrap();
        let geoms = [a, b];
        assert!((union_area(geoms.iter()) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn union_area_ignores_points_and_empty_input() {
        let geoms = [Geometry::point(3.0, 4.0)];
        assert_eq!(union_area(geoms.iter()), 0.0);
        assert_eq!(union_area(std::iter::empty()), 0.0);
    }

    #[test]
    fn wkt_tags_match_case_insensitively() {
        let g = Geometry::parse_wkt("point (1 2)").unwrap();
        assert_eq!(g, Geometry::point(1.0, 2.0));
        // Multi-byte input must fail cleanly, not panic on a byte slice.
        assert!(Geometry::parse_wkt("ılık (1 2)").is_err());
    }
}
