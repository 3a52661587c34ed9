//! Image probing, scaling and encoding helpers.
//!
//! All functions are free-standing so either worker thread can call them.
//! Format detection sniffs file contents, so cache files with a `.thumb`
//! extension decode the same as their original JPEG. Large JPEG sources
//! are decoded at a reduced DCT scale before the final resize.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader, RgbImage};
use jpeg_decoder::PixelFormat;

use crate::error::{CacheError, CacheResult};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale to the largest size that fits inside `bounds` keeping aspect ratio.
    ///
    /// Scales up as well as down. Neither result dimension drops below 1.
    pub fn fit_within(&self, bounds: Size) -> Size {
        if self.width == 0 || self.height == 0 {
            return bounds;
        }
        let (w, h) = (self.width as u64, self.height as u64);
        let (bw, bh) = (bounds.width as u64, bounds.height as u64);

        let width_at_full_height = bh * w / h;
        if width_at_full_height <= bw {
            Size::new(width_at_full_height.max(1) as u32, bh.max(1) as u32)
        } else {
            Size::new(bw.max(1) as u32, (bw * h / w).max(1) as u32)
        }
    }

    /// Downscaled size when either dimension exceeds `max_dim`, else `None`.
    pub fn capped(&self, max_dim: u32) -> Option<Size> {
        if self.width > max_dim || self.height > max_dim {
            Some(self.fit_within(Size::new(max_dim, max_dim)))
        } else {
            None
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Size::new(width, height)
    }
}

fn open_reader(path: &Path) -> CacheResult<ImageReader<BufReader<File>>> {
    ImageReader::open(path)
        .map_err(|e| CacheError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| CacheError::io(path, e))
}

/// Read only the header of an image to get its native dimensions.
pub fn probe_dimensions(path: &Path) -> CacheResult<Size> {
    probe_header(path).map(|(size, _)| size)
}

fn probe_header(path: &Path) -> CacheResult<(Size, Option<ImageFormat>)> {
    let reader = open_reader(path)?;
    let format = reader.format();
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CacheError::image(path, e))?;
    if width == 0 || height == 0 {
        return Err(CacheError::InvalidDimensions {
            path: path.to_path_buf(),
        });
    }
    Ok((Size::new(width, height), format))
}

/// Decode an image at native resolution.
pub fn decode(path: &Path) -> CacheResult<DynamicImage> {
    open_reader(path)?
        .decode()
        .map_err(|e| CacheError::image(path, e))
}

fn resize_to(img: DynamicImage, target: Size) -> DynamicImage {
    if img.dimensions() == (target.width, target.height) {
        img
    } else {
        img.resize_exact(target.width, target.height, FilterType::Triangle)
    }
}

/// Decode a JPEG at the smallest DCT scale (1/8, 1/4, 1/2 or full) that
/// still covers `target` in both dimensions.
///
/// `None` when the decoder fails or produces a pixel layout other than
/// 8-bit gray or RGB; callers fall back to a full decode.
fn decode_jpeg_scaled(path: &Path, target: Size) -> Option<DynamicImage> {
    let file = File::open(path).ok()?;
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let requested = |dim: u32| u16::try_from(dim).unwrap_or(u16::MAX);
    let scaled = decoder.scale(requested(target.width), requested(target.height));
    let pixels = match scaled.and_then(|_| decoder.decode()) {
        Ok(pixels) => pixels,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "scaled JPEG decode failed");
            return None;
        }
    };
    let info = decoder.info()?;
    let (width, height) = (u32::from(info.width), u32::from(info.height));
    match info.pixel_format {
        PixelFormat::L8 => GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8),
        PixelFormat::RGB24 => RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8),
        _ => None,
    }
}

/// Decode and resize to `target`, taking the reduced-scale JPEG path when
/// the source is a JPEG being shrunk.
fn decode_resized(
    path: &Path,
    native: Size,
    format: Option<ImageFormat>,
    target: Size,
) -> CacheResult<DynamicImage> {
    let shrinking = target.width < native.width && target.height < native.height;
    let scaled = match format {
        Some(ImageFormat::Jpeg) if shrinking => decode_jpeg_scaled(path, target),
        _ => None,
    };
    let img = match scaled {
        Some(img) => img,
        None => decode(path)?,
    };
    Ok(resize_to(img, target))
}

/// Decode a thumbnail whose largest side is at most `max_dim`.
///
/// Dimensions are probed first so small images skip the resize step and
/// large JPEGs never decode at full resolution.
pub fn decode_thumbnail(path: &Path, max_dim: u32) -> CacheResult<DynamicImage> {
    let (native, format) = probe_header(path)?;
    match native.capped(max_dim) {
        Some(target) => decode_resized(path, native, format, target),
        None => decode(path),
    }
}

/// Decode an image scaled to fit `bounds` while keeping aspect ratio.
pub fn decode_fitted(path: &Path, bounds: Size) -> CacheResult<DynamicImage> {
    let (native, format) = probe_header(path)?;
    decode_resized(path, native, format, native.fit_within(bounds))
}

/// Encode as baseline JPEG at the given quality (1-100).
///
/// Alpha is dropped since JPEG has no transparency.
pub fn encode_jpeg(img: &DynamicImage, quality: u8, path: &Path) -> CacheResult<Vec<u8>> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| CacheError::image(path, e))?;
    Ok(buf)
}
