use geo::algorithm::simplify_vw::SimplifyVwPreserve;
use geo::Geometry;

/// Split multi-part geometries into their single parts
pub fn explode(geometry: Geometry<f64>) -> Vec<Geometry<f64>> {
    match geometry {
        Geometry::MultiPoint(mp) => mp.0.into_iter().map(Geometry::Point).collect(),
        Geometry::MultiLineString(mls) => mls.0.into_iter().map(Geometry::LineString).collect(),
        Geometry::MultiPolygon(mp) => mp.0.into_iter().map(Geometry::Polygon).collect(),
        Geometry::GeometryCollection(gc) => gc.0.into_iter().flat_map(explode).collect(),
        single => vec![single],
    }
}

/// Topology-preserving simplification; points are returned unchanged
pub fn simplify(geometry: &Geometry<f64>, tolerance: f64) -> Geometry<f64> {
    match geometry {
        Geometry::LineString(ls) => Geometry::LineString(ls.simplify_vw_preserve(tolerance)),
        Geometry::MultiLineString(mls) => {
            Geometry::MultiLineString(mls.simplify_vw_preserve(tolerance))
        }
        Geometry::Polygon(p) => Geometry::Polygon(p.simplify_vw_preserve(tolerance)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify_vw_preserve(tolerance)),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
            gc.0.iter().map(|g| simplify(g, tolerance)).collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon, MultiPolygon, Point};

    #[test]
    fn test_explode_multipolygon() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 0.0)];
        let b = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 5.0)];
        let parts = explode(Geometry::MultiPolygon(MultiPolygon::new(vec![a, b])));

        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|g| matches!(g, Geometry::Polygon(_))));
    }

    #[test]
    fn test_explode_single_part_is_identity() {
        let point = Geometry::Point(Point::new(1.0, 2.0));
        assert_eq!(explode(point.clone()), vec![point]);
    }

    #[test]
    fn test_simplify_drops_collinear_vertices() {
        let line = line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.00001),
            (x: 2.0, y: 0.0),
            (x: 3.0, y: 0.00001),
            (x: 4.0, y: 0.0),
        ];
        match simplify(&Geometry::LineString(line), 0.001) {
            Geometry::LineString(simplified) => assert_eq!(simplified.0.len(), 2),
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
