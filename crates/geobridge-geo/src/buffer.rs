//! Small circular buffers around bare points.

use geo::{Coord, LineString, Point, Polygon};
use std::f64::consts::PI;

const SEGMENTS: usize = 32;
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Buffer a WGS84 point into a closed polygon of roughly `radius_m` meters.
///
/// The longitude radius is widened by the latitude so the ring stays circular
/// on the ground.
pub fn buffer_point(point: &Point<f64>, radius_m: f64) -> Polygon<f64> {
    let dy = radius_m / METERS_PER_DEGREE;
    let cos_lat = point.y().to_radians().cos().abs().max(1e-6);
    let dx = radius_m / (METERS_PER_DEGREE * cos_lat);

    let mut ring: Vec<Coord<f64>> = (0..SEGMENTS)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / SEGMENTS as f64;
            Coord { x: point.x() + dx * angle.cos(), y: point.y() + dy * angle.sin() }
        })
        .collect();
    ring.push(ring[0]);

    Polygon::new(LineString::from(ring), vec![])
}
