use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use log::{debug, trace};

use super::{Compressor, ImageOptions};
use crate::error::{BackendError, BackendResult};

const MAX_ITERATIONS: u32 = 10;
const INITIAL_QUALITY: u8 = 90;
const QUALITY_STEP: u8 = 10;
const MIN_QUALITY: u8 = 10;
const SCALE_STEP: f64 = 0.9;

/// Re-encodes raster images until they fit the size hint, keeping the input format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor;

#[async_trait]
impl Compressor for ImageCompressor {
    type Options = ImageOptions;

    async fn compress(&self, input: Arc<[u8]>, options: &ImageOptions) -> BackendResult<Vec<u8>> {
        let options = options.clone();
        tokio::task::spawn_blocking(move || shrink_image(&input, &options)).await?
    }

    fn name(&self) -> &'static str {
        "image"
    }
}

/// Synchronous core of [`ImageCompressor`].
pub fn shrink_image(input: &[u8], options: &ImageOptions) -> BackendResult<Vec<u8>> {
    if options.max_dimension == Some(0) {
        return Err(BackendError::Encode("max dimension must be at least 1 pixel".to_string()));
    }

    let max_bytes = options.max_bytes();
    let format = image::guess_format(input).map_err(|e| BackendError::Decode(e.to_string()))?;
    let mut img = image::load_from_memory_with_format(input, format)
        .map_err(|e| BackendError::Decode(e.to_string()))?;

    let oversized = options
        .max_dimension
        .is_some_and(|max| img.width() > max || img.height() > max);

    if !oversized && input.len() as u64 <= max_bytes {
        debug!(
            "Image already within {} bytes ({} bytes), keeping original",
            max_bytes,
            input.len()
        );
        return Ok(input.to_vec());
    }

    if let Some(max) = options.max_dimension.filter(|_| oversized) {
        let (w, h) = img.dimensions();
        img = img.resize(max, max, FilterType::Lanczos3);
        debug!("Resized {}x{} -> {}x{}", w, h, img.width(), img.height());
    }

    let mut quality = INITIAL_QUALITY;
    let mut best: Option<Vec<u8>> = None;

    for iteration in 0..MAX_ITERATIONS {
        let encoded = encode(&img, format, quality)?;
        trace!(
            "Iteration {}: {}x{} q={} -> {} bytes",
            iteration,
            img.width(),
            img.height(),
            quality,
            encoded.len()
        );

        let fits = encoded.len() as u64 <= max_bytes;
        if best.as_ref().map_or(true, |b| encoded.len() < b.len()) {
            best = Some(encoded);
        }
        if fits {
            break;
        }

        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
        let (w, h) = img.dimensions();
        if w <= 1 && h <= 1 {
            break;
        }
        let nw = ((w as f64 * SCALE_STEP) as u32).max(1);
        let nh = ((h as f64 * SCALE_STEP) as u32).max(1);
        img = img.resize(nw, nh, FilterType::Lanczos3);
    }

    let best = best.ok_or_else(|| BackendError::Encode("no encoding produced".to_string()))?;

    if !oversized && best.len() >= input.len() {
        debug!("Re-encoding did not shrink the image, keeping original");
        return Ok(input.to_vec());
    }

    debug!("Image compressed {} -> {} bytes", input.len(), best.len());
    Ok(best)
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> BackendResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut buffer), other)
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn noisy(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17) ^ (x * y)) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(x as u8)])
        }))
    }

    fn encoded(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    fn options(hint_mb: f64) -> ImageOptions {
        ImageOptions {
            target_size_hint_mb: hint_mb,
            max_dimension: None,
        }
    }

    #[test]
    fn small_input_is_returned_unchanged() {
        let input = encoded(&noisy(32, 32), ImageFormat::Png);
        let output = shrink_image(&input, &options(9.0)).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn zero_hint_shrinks_png_and_keeps_format() {
        let input = encoded(&noisy(256, 256), ImageFormat::Png);
        let output = shrink_image(&input, &options(0.0)).unwrap();

        assert!(output.len() < input.len());
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&output).unwrap();
        assert!(decoded.width() < 256);
    }

    #[test]
    fn zero_hint_shrinks_jpeg() {
        let mut input = Vec::new();
        JpegEncoder::new_with_quality(&mut input, 100)
            .encode_image(&noisy(300, 200).to_rgb8())
            .unwrap();

        let output = shrink_image(&input, &options(0.0)).unwrap();
        assert!(output.len() < input.len());
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn max_dimension_forces_resize() {
        let input = encoded(&noisy(400, 100), ImageFormat::Png);
        let opts = options(9.0).with_max_dimension(Some(200));
        let output = shrink_image(&input, &opts).unwrap();

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (200, 50));
    }

    #[test]
    fn zero_max_dimension_is_rejected() {
        let input = encoded(&noisy(64, 64), ImageFormat::Png);
        let opts = options(9.0).with_max_dimension(Some(0));
        let err = shrink_image(&input, &opts).unwrap_err();
        assert!(matches!(err, BackendError::Encode(_)));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = shrink_image(b"definitely not an image", &options(1.0)).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn async_entry_point_matches_sync_core() {
        let input = encoded(&noisy(128, 128), ImageFormat::Png);
        let expected = shrink_image(&input, &options(0.0)).unwrap();
        let actual = ImageCompressor
            .compress(Arc::from(input), &options(0.0))
            .await
            .unwrap();
        assert_eq!(actual, expected);
    }
}
