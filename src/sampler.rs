//! Pixel sampling from uploaded logo images
//!
//! Resolves an [`ImageSource`] to an RGBA raster, then strides through the
//! pixel buffer at a quality-controlled rate, discarding near-transparent
//! pixels. Decoding of path and data-URL sources runs on a worker thread so
//! the caller can enforce the load timeout; a decode that finishes after the
//! timeout loses the race and its result is dropped with the channel.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::error::{Result, ThemeError};

/// How long an image load may take before the extraction fails over to the
/// fallback palette.
pub const LOAD_TIMEOUT: Duration = Duration::from_millis(5000);

/// Pixels with alpha below this are treated as transparent and skipped.
pub const ALPHA_OPAQUE_MIN: u8 = 128;

/// Minimum opaque samples required for clustering to be meaningful.
pub const MIN_SAMPLES: usize = 10;

/// Stride multiplier: `sample_rate = quality * SAMPLE_RATE_PER_QUALITY`.
///
/// Empirically tuned in the original extraction behavior; higher quality
/// numbers mean a sparser stride, preserved as-is for visual parity.
pub const SAMPLE_RATE_PER_QUALITY: usize = 10;

/// Extraction options supplied alongside the image.
#[derive(Debug, Clone, Copy)]
pub struct SampleOptions {
    /// Desired dominant color count (k for the clusterer).
    pub color_count: usize,
    /// Sampling quality; controls the pixel stride.
    pub quality: usize,
}

impl Default for SampleOptions {
    fn default() -> Self {
        SampleOptions {
            color_count: 5,
            quality: 5,
        }
    }
}

/// A loadable image reference handed to the engine by the upload widget.
pub enum ImageSource {
    /// Image file on disk.
    Path(PathBuf),
    /// `data:<mime>;base64,<payload>` URL.
    DataUrl(String),
    /// Already-decoded raster (unit tests, in-process callers).
    Raster(RgbaImage),
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::DataUrl(u) => write!(f, "DataUrl({} bytes)", u.len()),
            Self::Raster(img) => write!(f, "Raster({}x{})", img.width(), img.height()),
        }
    }
}

/// Load and sample an image in one step.
pub fn sample(source: ImageSource, options: &SampleOptions) -> Result<Vec<Rgb>> {
    let raster = load_raster(source)?;
    sample_raster(&raster, options.quality)
}

/// Resolve an [`ImageSource`] to a decoded RGBA raster, enforcing
/// [`LOAD_TIMEOUT`] for sources that require decoding.
pub fn load_raster(source: ImageSource) -> Result<RgbaImage> {
    match source {
        ImageSource::Raster(img) => Ok(img),
        ImageSource::Path(path) => {
            decode_with_timeout(move || {
                image::open(&path)
                    .map(|img| img.to_rgba8())
                    .map_err(|e| ThemeError::ImageLoadError(e.to_string()))
            })
        }
        ImageSource::DataUrl(url) => {
            let bytes = decode_data_url(&url)?;
            decode_with_timeout(move || {
                image::load_from_memory(&bytes)
                    .map(|img| img.to_rgba8())
                    .map_err(|e| ThemeError::ImageLoadError(e.to_string()))
            })
        }
    }
}

/// Run `decode` on a worker thread and wait at most [`LOAD_TIMEOUT`].
///
/// Whichever of completion and timeout happens first wins; a late decode
/// result is discarded when the channel's receiver is gone.
fn decode_with_timeout<F>(decode: F) -> Result<RgbaImage>
where
    F: FnOnce() -> Result<RgbaImage> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // Receiver may already have timed out; that loss is intentional.
        let _ = tx.send(decode());
    });

    match rx.recv_timeout(LOAD_TIMEOUT) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(timeout_ms = LOAD_TIMEOUT.as_millis() as u64, "Image load timed out");
            Err(ThemeError::ImageLoadTimeout {
                timeout_ms: LOAD_TIMEOUT.as_millis() as u64,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // Decoder thread panicked before sending.
            Err(ThemeError::ImageLoadError("decoder thread failed".to_string()))
        }
    }
}

/// Extract the base64 payload from a `data:` URL.
fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_mime, payload)| payload)
        .ok_or_else(|| ThemeError::ImageLoadError("not a base64 data URL".to_string()))?;
    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| ThemeError::ImageLoadError(format!("invalid base64 payload: {}", e)))
}

/// Stride through the raster's RGBA buffer and collect opaque samples.
pub fn sample_raster(raster: &RgbaImage, quality: usize) -> Result<Vec<Rgb>> {
    let sample_rate = (quality * SAMPLE_RATE_PER_QUALITY).max(1);
    let raw = raster.as_raw();

    let samples: Vec<Rgb> = raw
        .chunks_exact(4)
        .step_by(sample_rate)
        .filter(|px| px[3] >= ALPHA_OPAQUE_MIN)
        .map(|px| Rgb::new(px[0], px[1], px[2]))
        .collect();

    debug!(
        width = raster.width(),
        height = raster.height(),
        sample_rate,
        samples = samples.len(),
        "Sampled raster"
    );

    if samples.len() < MIN_SAMPLES {
        return Err(ThemeError::InsufficientSamples {
            found: samples.len(),
            needed: MIN_SAMPLES,
        });
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_raster(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn test_sample_rate_follows_quality() {
        let raster = solid_raster(40, 40, [33, 100, 200, 255]); // 1600 px
        let sparse = sample_raster(&raster, 5).unwrap();
        let dense = sample_raster(&raster, 1).unwrap();
        assert_eq!(sparse.len(), 32); // stride 50
        assert_eq!(dense.len(), 160); // stride 10
        assert!(sparse.iter().all(|&c| c == Rgb::new(33, 100, 200)));
    }

    #[test]
    fn test_transparent_pixels_are_skipped() {
        let mut raster = solid_raster(40, 40, [250, 10, 10, 255]);
        // Make the left half fully transparent
        for y in 0..40 {
            for x in 0..20 {
                raster.put_pixel(x, y, Rgba([250, 10, 10, 0]));
            }
        }
        let opaque = sample_raster(&raster, 1).unwrap();
        let full = sample_raster(&solid_raster(40, 40, [250, 10, 10, 255]), 1).unwrap();
        assert!(opaque.len() < full.len());
    }

    #[test]
    fn test_boundary_alpha_counts_as_opaque() {
        let raster = solid_raster(40, 40, [1, 2, 3, ALPHA_OPAQUE_MIN]);
        assert!(sample_raster(&raster, 1).is_ok());
        let raster = solid_raster(40, 40, [1, 2, 3, ALPHA_OPAQUE_MIN - 1]);
        assert!(matches!(
            sample_raster(&raster, 1),
            Err(ThemeError::InsufficientSamples { found: 0, .. })
        ));
    }

    #[test]
    fn test_too_small_image_fails_with_insufficient_samples() {
        let raster = solid_raster(5, 5, [9, 9, 9, 255]); // 25 px, stride 50 -> 1 sample
        assert!(matches!(
            sample_raster(&raster, 5),
            Err(ThemeError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let source = ImageSource::Path(PathBuf::from("/nonexistent/logo.png"));
        assert!(matches!(
            load_raster(source),
            Err(ThemeError::ImageLoadError(_))
        ));
    }

    #[test]
    fn test_malformed_data_url_is_load_error() {
        for url in ["data:image/png;base64,@@@", "http://example.com/a.png", ""] {
            let source = ImageSource::DataUrl(url.to_string());
            assert!(matches!(
                load_raster(source),
                Err(ThemeError::ImageLoadError(_))
            ));
        }
    }

    #[test]
    fn test_data_url_round_trip() {
        let raster = solid_raster(40, 40, [12, 200, 34, 255]);
        let mut png = Vec::new();
        raster
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let url = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&png));
        let decoded = load_raster(ImageSource::DataUrl(url)).unwrap();
        let samples = sample_raster(&decoded, 5).unwrap();
        assert!(samples.iter().all(|&c| c == Rgb::new(12, 200, 34)));
    }
}
