use geobridge_core::ports::{DestinationPlatform, ImageSource};
use geobridge_core::{BridgeError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;

const JPEG_QUALITY: u8 = 90;
const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Downloads template images and attaches them to the destination platform
pub struct ImageAttacher {
    images: Arc<dyn ImageSource>,
    destination: Arc<dyn DestinationPlatform>,
    scratch_dir: PathBuf,
}

impl ImageAttacher {
    pub fn new(
        images: Arc<dyn ImageSource>,
        destination: Arc<dyn DestinationPlatform>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self { images, destination, scratch_dir }
    }

    /// Fetch one image, re-encode it as JPEG and attach it, returning its
    /// resource reference.
    ///
    /// The local copy is deleted whatever the outcome.
    pub async fn attach(&self, url: &str) -> Result<String> {
        let bytes = self.images.fetch(url).await?;
        let owned_url = url.to_string();
        let jpeg = tokio::task::spawn_blocking(move || to_jpeg(&bytes, &owned_url))
            .await
            .map_err(|e| BridgeError::Template { reason: format!("Image task failed: {}", e) })??;

        let file = tempfile::Builder::new()
            .prefix("story-image-")
            .suffix(".jpg")
            .tempfile_in(&self.scratch_dir)?;

        let attached = match tokio::fs::write(file.path(), &jpeg).await {
            Ok(()) => self.destination.attach_resource(file.path(), JPEG_CONTENT_TYPE).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = file.close() {
            tracing::warn!(url, error = %e, "Failed to remove downloaded image");
        }
        attached
    }
}

/// Decode any supported raster and encode it as baseline JPEG.
///
/// Transparent pixels are flattened onto white.
pub fn to_jpeg(bytes: &[u8], url: &str) -> Result<Vec<u8>> {
    let not_an_image = || BridgeError::Template {
        reason: format!("{} is not a recognised image", url),
    };

    let format = infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .and_then(|kind| ImageFormat::from_mime_type(kind.mime_type()))
        .ok_or_else(not_an_image)?;

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        BridgeError::Template { reason: format!("Failed to decode {}: {}", url, e) }
    })?;
    let flattened = flatten_onto_white(&decoded);

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&flattened)
        .map_err(|e| BridgeError::Template { reason: format!("Failed to encode {}: {}", url, e) })?;

    tracing::debug!(url, ?format, input = bytes.len(), output = out.len(), "Re-encoded image");
    Ok(out)
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}
