//! Decoded image values and the disk encoding used for them.

use std::{fmt, io::Cursor, sync::Arc};

use image::{DynamicImage, ImageEncoder, codecs::jpeg::JpegEncoder};

use crate::{error::Result, units::ByteSize};

/// Highest JPEG quality setting; the disk tier's default.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// A decoded image shared between the caller and the memory tier.
///
/// Cloning only bumps a reference count.
#[derive(Clone)]
pub struct CachedImage(Arc<DynamicImage>);

impl CachedImage {
    /// Take ownership of a decoded image.
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Borrow the decoded pixels.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.0
    }

    /// True when both values share the same decoded buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Size of the decoded pixel buffer.
    pub fn decoded_size(&self) -> ByteSize {
        ByteSize::from_bytes(self.0.as_bytes().len() as u64)
    }
}

impl From<DynamicImage> for CachedImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("color", &self.0.color())
            .finish()
    }
}

/// Encodes images for the disk tier and decodes them back.
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    jpeg_quality: u8,
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(MAX_JPEG_QUALITY)
    }
}

impl ImageCodec {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            jpeg_quality: quality.clamp(1, MAX_JPEG_QUALITY),
        }
    }

    /// Effective JPEG quality after clamping.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// JPEG-encode `image`. Alpha is dropped; JPEG has no alpha channel.
    pub fn encode(&self, image: &CachedImage) -> Result<Vec<u8>> {
        let rgb = image.as_dynamic().to_rgb8();
        let mut out = Cursor::new(Vec::with_capacity(rgb.as_raw().len() / 4));
        JpegEncoder::new_with_quality(&mut out, self.jpeg_quality).write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(out.into_inner())
    }

    /// Decode any format the `image` crate can sniff from the bytes.
    pub fn decode(&self, bytes: &[u8]) -> Result<CachedImage> {
        let image = image::load_from_memory(bytes)?;
        Ok(CachedImage::new(image))
    }
}
