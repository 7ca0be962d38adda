//! CRS reprojection of archive geometries.

use geo::Geometry;
use geobridge_core::{BridgeError, Result};

/// Reprojects geometries between two EPSG codes.
///
/// Matching codes are an identity transform and never touch PROJ.
pub struct Reprojector {
    from: u32,
    to: u32,
    transform: Option<Transform>,
}

impl Reprojector {
    pub fn new(from: u32, to: u32) -> Result<Self> {
        let transform = if from == to { None } else { Some(create_transform(from, to)?) };
        Ok(Self { from, to, transform })
    }

    pub fn is_identity(&self) -> bool {
        self.transform.is_none()
    }

    pub fn reproject(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        match &self.transform {
            Some(transform) => apply_transform(transform, geometry, self.from, self.to),
            None => Ok(geometry.clone()),
        }
    }
}

type Transform = proj::Proj;

fn create_transform(from: u32, to: u32) -> Result<Transform> {
    proj::Proj::new_known_crs(&format!("EPSG:{}", from), &format!("EPSG:{}", to), None)
        .map_err(|e| BridgeError::Reprojection { from, to, reason: e.to_string() })
}

fn apply_transform(
    proj: &Transform,
    geometry: &Geometry<f64>,
    from: u32,
    to: u32,
) -> Result<Geometry<f64>> {
    use geo::MapCoords;

    geometry
        .try_map_coords(|c| proj.convert((c.x, c.y)).map(|(x, y)| geo::Coord { x, y }))
        .map_err(|e| BridgeError::Reprojection { from, to, reason: e.to_string() })
}
