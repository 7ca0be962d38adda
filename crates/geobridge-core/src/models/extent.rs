//! Spatial extents and the running extent fold used when assembling a map.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl Default for SpatialReference {
    fn default() -> Self {
        Self { wkid: 4326 }
    }
}

/// A complete bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtentBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    #[serde(rename = "spatialReference")]
    pub spatial_reference: SpatialReference,
}

impl ExtentBox {
    /// Smallest box covering both inputs
    pub fn merge(&self, other: &ExtentBox) -> ExtentBox {
        ExtentBox {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
            spatial_reference: self.spatial_reference,
        }
    }
}

/// Extent as reported by a layer, where any bound may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerExtent {
    pub xmin: Option<f64>,
    pub ymin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymax: Option<f64>,
    #[serde(rename = "spatialReference", default)]
    pub spatial_reference: SpatialReference,
}

impl LayerExtent {
    /// A complete box, or `None` if any bound is missing or not finite
    pub fn complete(&self) -> Option<ExtentBox> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(ExtentBox {
            xmin: finite(self.xmin)?,
            ymin: finite(self.ymin)?,
            xmax: finite(self.xmax)?,
            ymax: finite(self.ymax)?,
            spatial_reference: self.spatial_reference,
        })
    }
}

impl From<ExtentBox> for LayerExtent {
    fn from(b: ExtentBox) -> Self {
        Self {
            xmin: Some(b.xmin),
            ymin: Some(b.ymin),
            xmax: Some(b.xmax),
            ymax: Some(b.ymax),
            spatial_reference: b.spatial_reference,
        }
    }
}

/// Running extent over a sequence of layers; only ever grows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtentAccumulator {
    extent: Option<ExtentBox>,
}

impl ExtentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a layer's extent in. Incomplete extents are skipped.
    ///
    /// Returns whether the layer contributed.
    pub fn include(&mut self, layer: &LayerExtent) -> bool {
        match layer.complete() {
            Some(b) => {
                self.include_box(&b);
                true
            }
            None => false,
        }
    }

    pub fn include_box(&mut self, b: &ExtentBox) {
        self.extent = Some(match &self.extent {
            Some(current) => current.merge(b),
            None => *b,
        });
    }

    pub fn extent(&self) -> Option<ExtentBox> {
        self.extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bx(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> ExtentBox {
        ExtentBox { xmin, ymin, xmax, ymax, spatial_reference: SpatialReference::default() }
    }

    fn fold(boxes: &[ExtentBox]) -> Option<ExtentBox> {
        let mut acc = ExtentAccumulator::new();
        for b in boxes {
            acc.include_box(b);
        }
        acc.extent()
    }

    #[test]
    fn test_incomplete_layer_skipped() {
        let mut acc = ExtentAccumulator::new();
        assert!(acc.include(&bx(0.0, 0.0, 1.0, 1.0).into()));

        let broken = LayerExtent { xmax: None, ..bx(-50.0, -50.0, 50.0, 50.0).into() };
        assert!(!acc.include(&broken));

        let nan = LayerExtent { ymin: Some(f64::NAN), ..bx(-50.0, -50.0, 50.0, 50.0).into() };
        assert!(!acc.include(&nan));

        assert_eq!(acc.extent(), Some(bx(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_empty_accumulator() {
        assert!(ExtentAccumulator::new().extent().is_none());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(bx(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json["spatialReference"]["wkid"], 4326);
    }

    fn arb_box() -> impl Strategy<Value = ExtentBox> {
        (-180.0f64..180.0, -90.0f64..90.0, 0.0f64..50.0, 0.0f64..50.0)
            .prop_map(|(x, y, w, h)| bx(x, y, x + w, y + h))
    }

    proptest! {
        #[test]
        fn prop_fold_is_order_independent(a in arb_box(), b in arb_box(), c in arb_box()) {
            prop_assert_eq!(fold(&[a, b, c]), fold(&[c, a, b]));
        }

        #[test]
        fn prop_fold_is_idempotent(a in arb_box()) {
            prop_assert_eq!(fold(&[a, a]), Some(a));
        }

        #[test]
        fn prop_extent_only_grows(a in arb_box(), b in arb_box()) {
            let merged = a.merge(&b);
            prop_assert!(merged.xmin <= a.xmin && merged.ymin <= a.ymin);
            prop_assert!(merged.xmax >= a.xmax && merged.ymax >= a.ymax);
        }
    }
}
