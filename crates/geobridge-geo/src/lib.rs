//! GeoBridge Geo - geometry conversion and the spatial operations used by
//! the transformer and the import adapters.

pub mod buffer;
pub mod grid;
pub mod models;
pub mod ops;
pub mod reproject;

#[cfg(feature = "gdal")]
pub mod gdal_codec;

pub use buffer::buffer_point;
pub use grid::point_grid;
pub use models::{from_geo_geometry, to_geo_geometry};
pub use ops::{explode, simplify};
pub use reproject::Reprojector;
