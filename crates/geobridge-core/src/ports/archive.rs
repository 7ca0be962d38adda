use std::path::Path;

use crate::error::Result;

/// One layer read from a multi-layer package
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveLayer {
    pub name: String,
    pub epsg: u32,
    pub geometries: Vec<geo::Geometry<f64>>,
}

impl ArchiveLayer {
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }
}

/// Port for reading package archives and writing binary geometry containers
pub trait LayerCodec: Send + Sync {
    /// Enumerate every layer in a package file
    fn read_layers(&self, path: &Path) -> Result<Vec<ArchiveLayer>>;

    /// Write a layer's geometries to a binary container
    fn write_container(&self, layer: &ArchiveLayer, path: &Path) -> Result<()>;

    /// File extension of the containers this codec writes
    fn container_extension(&self) -> &str {
        "fgb"
    }
}
