//! Point lattices used to rasterize area records into sample points.

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::algorithm::interior_point::InteriorPoint;
use geo::{Coord, Geometry, LineString, Point};

/// Sample a geometry with a regular lattice of points.
///
/// Areal geometries get cell-centred points at `spacing` that fall inside the
/// shape; a shape smaller than one cell yields its interior point. Lines are
/// walked at `spacing` along every segment, endpoints included. Points pass
/// through.
pub fn point_grid(geometry: &Geometry<f64>, spacing: f64) -> Vec<Point<f64>> {
    match geometry {
        Geometry::Point(p) => vec![*p],
        Geometry::MultiPoint(mp) => mp.0.clone(),
        Geometry::LineString(ls) => sample_line(ls, spacing),
        Geometry::Line(l) => sample_line(&LineString::from(vec![l.start, l.end]), spacing),
        Geometry::MultiLineString(mls) => {
            mls.0.iter().flat_map(|ls| sample_line(ls, spacing)).collect()
        }
        Geometry::GeometryCollection(gc) => {
            gc.0.iter().flat_map(|g| point_grid(g, spacing)).collect()
        }
        areal => sample_area(areal, spacing),
    }
}

fn sample_area(geometry: &Geometry<f64>, spacing: f64) -> Vec<Point<f64>> {
    let Some(rect) = geometry.bounding_rect() else {
        return Vec::new();
    };

    let (min, max) = (rect.min(), rect.max());
    let columns = ((max.x - min.x) / spacing).ceil().max(1.0) as usize;
    let rows = ((max.y - min.y) / spacing).ceil().max(1.0) as usize;

    let mut points = Vec::new();
    for row in 0..rows {
        let y = min.y + spacing * (row as f64 + 0.5);
        for col in 0..columns {
            let x = min.x + spacing * (col as f64 + 0.5);
            let candidate = Point::new(x, y);
            if geometry.contains(&candidate) {
                points.push(candidate);
            }
        }
    }

    if points.is_empty() {
        if let Some(inside) = geometry.interior_point() {
            points.push(inside);
        }
    }

    points
}

fn sample_line(line: &LineString<f64>, spacing: f64) -> Vec<Point<f64>> {
    let mut points = Vec::new();
    for segment in line.lines() {
        let dx = segment.end.x - segment.start.x;
        let dy = segment.end.y - segment.start.y;
        let length = dx.hypot(dy);
        let steps = (length / spacing).floor() as usize;

        for step in 0..=steps {
            let t = if length > 0.0 { (step as f64 * spacing) / length } else { 0.0 };
            let point =
                Point::from(Coord { x: segment.start.x + dx * t, y: segment.start.y + dy * t });
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
    }

    if let Some(last) = line.0.last() {
        if points.last().map(|p| p.0 != *last).unwrap_or(true) {
            points.push(Point::from(*last));
        }
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Polygon};

    fn square(size: f64) -> Polygon<f64> {
        polygon![
            (x: 0.0, y: 0.0),
            (x: size, y: 0.0),
            (x: size, y: size),
            (x: 0.0, y: size),
            (x: 0.0, y: 0.0),
        ]
    }

    #[test]
    fn test_square_lattice() {
        let points = point_grid(&Geometry::Polygon(square(1.0)), 0.25);
        assert_eq!(points.len(), 16);
        assert!(points.iter().all(|p| square(1.0).contains(p)));
    }

    #[test]
    fn test_tiny_polygon_falls_back_to_interior_point() {
        let points = point_grid(&Geometry::Polygon(square(0.0001)), 0.01);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn test_points_outside_concave_shape_are_dropped() {
        let l_shape = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 1.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let points = point_grid(&Geometry::Polygon(l_shape), 0.5);
        assert_eq!(points.len(), 12);
        assert!(!points.iter().any(|p| p.x() > 1.0 && p.y() > 1.0));
    }

    #[test]
    fn test_line_sampling_includes_endpoints() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let points = point_grid(&Geometry::LineString(line), 0.25);
        assert_eq!(points.len(), 5);
        assert_eq!(points.first().map(|p| p.x()), Some(0.0));
        assert_eq!(points.last().map(|p| p.x()), Some(1.0));
    }
}
