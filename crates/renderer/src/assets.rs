//! Registry of externally supplied assets: static images, streaming textures
//! and fonts.
//!
//! The registry owns every payload behind an `Arc`. Consumers such as the
//! shader cache keep only `Weak` references and rebuild when the registry
//! reports an [`AssetChange`].

use core::fmt;
use core::str::FromStr;
use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Image,
    Stream,
    Font,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Stream => "stream",
            Self::Font => "font",
        };
        formatter.write_str(name)
    }
}

/// Pixel layout of a streamed texture upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba,
    Rgb,
    Gray,
    GrayAlpha,
    /// An encoded image file; width and height come from the file.
    File,
}

impl TextureFormat {
    /// Bytes per pixel for raw formats.
    pub const fn channels(self) -> Option<usize> {
        match self {
            Self::Rgba => Some(4),
            Self::Rgb => Some(3),
            Self::Gray => Some(1),
            Self::GrayAlpha => Some(2),
            Self::File => None,
        }
    }
}

impl FromStr for TextureFormat {
    type Err = AssetError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "rgba" => Ok(Self::Rgba),
            "rgb" => Ok(Self::Rgb),
            "g" => Ok(Self::Gray),
            "ga" => Ok(Self::GrayAlpha),
            "file" => Ok(Self::File),
            other => Err(AssetError::UnknownFormat(other.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to decode image data")]
    Decode(#[from] image::ImageError),
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("unknown texture format `{0}`")]
    UnknownFormat(String),
    #[error("texture has zero size")]
    ZeroSize,
    #[error("texture size {width}x{height} is too large")]
    TooLarge { width: u32, height: u32 },
    #[error("font data is empty")]
    EmptyFont,
}

/// Decoded pixels as premultiplied RGBA8, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageAsset {
    /// Decodes an encoded image file (PNG, JPEG, WebP).
    ///
    /// # Errors
    /// Returns [`AssetError::Decode`] for unreadable data and
    /// [`AssetError::ZeroSize`] for an empty image.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_straight_rgba(width, height, rgba.into_raw())
    }

    /// Builds an asset from a raw texture upload in `format`.
    ///
    /// # Errors
    /// Returns an error if the byte count does not match `width * height`
    /// pixels of `format`, or if decoding a `File` upload fails.
    pub fn from_texture(
        format: TextureFormat,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<Self, AssetError> {
        let Some(channels) = format.channels() else {
            return Self::from_encoded(bytes);
        };
        if width == 0 || height == 0 {
            return Err(AssetError::ZeroSize);
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(channels))
            .ok_or(AssetError::TooLarge { width, height })?;
        if bytes.len() != expected {
            return Err(AssetError::SizeMismatch {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }
        let rgba: Vec<u8> = match format {
            TextureFormat::Rgba => bytes.to_vec(),
            TextureFormat::Rgb => bytes
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            TextureFormat::Gray => bytes.iter().flat_map(|&luma| [luma, luma, luma, 255]).collect(),
            TextureFormat::GrayAlpha => bytes
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            TextureFormat::File => return Self::from_encoded(bytes),
        };
        Self::from_straight_rgba(width, height, rgba)
    }

    fn from_straight_rgba(width: u32, height: u32, mut pixels: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::ZeroSize);
        }
        premultiply_in_place(&mut pixels);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn premultiply_in_place(bytes: &mut [u8]) {
    for pixel in bytes.chunks_exact_mut(4) {
        let alpha = u16::from(pixel[3]);
        if alpha == 255 {
            continue;
        }
        for channel in &mut pixel[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }
}

/// Raw font file bytes (TTF/OTF/TTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    bytes: Arc<[u8]>,
    generation: u64,
}

impl FontAsset {
    /// # Errors
    /// Returns [`AssetError::EmptyFont`] for an empty buffer.
    pub fn new(bytes: Vec<u8>) -> Result<Self, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::EmptyFont);
        }
        Ok(Self {
            bytes: bytes.into(),
            generation: 0,
        })
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    /// Registry generation at insertion; changes whenever the id is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A decoded payload ready for insertion.
#[derive(Debug, Clone)]
pub enum Asset {
    Image(ImageAsset),
    Stream(ImageAsset),
    Font(FontAsset),
}

impl Asset {
    pub const fn kind(&self) -> AssetKind {
        match self {
            Self::Image(_) => AssetKind::Image,
            Self::Stream(_) => AssetKind::Stream,
            Self::Font(_) => AssetKind::Font,
        }
    }
}

/// Emitted for every content change so dependents can invalidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetChange {
    pub kind: AssetKind,
    pub id: String,
}

#[derive(Debug, Default)]
pub struct AssetRegistry {
    images: HashMap<String, Arc<ImageAsset>>,
    streams: HashMap<String, Arc<ImageAsset>>,
    fonts: HashMap<String, Arc<FontAsset>>,
    generation: u64,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a decoded asset, replacing any previous payload under `id`.
    pub fn insert(&mut self, id: &str, asset: Asset) -> AssetChange {
        self.generation += 1;
        let kind = asset.kind();
        match asset {
            Asset::Image(image) => {
                self.images.insert(id.to_owned(), Arc::new(image));
            }
            Asset::Stream(image) => {
                self.streams.insert(id.to_owned(), Arc::new(image));
            }
            Asset::Font(mut font) => {
                font.generation = self.generation;
                self.fonts.insert(id.to_owned(), Arc::new(font));
            }
        }
        debug!(target: "renderer", "asset {kind} `{id}` stored (generation {})", self.generation);
        AssetChange {
            kind,
            id: id.to_owned(),
        }
    }

    /// Decodes and stores a static image file.
    ///
    /// # Errors
    /// Returns the decode error; the previous image under `id` is kept.
    pub fn put_image(&mut self, id: &str, bytes: &[u8]) -> Result<AssetChange, AssetError> {
        let image = ImageAsset::from_encoded(bytes)?;
        Ok(self.insert(id, Asset::Image(image)))
    }

    /// Stores a streamed texture frame.
    ///
    /// # Errors
    /// Returns an error on a size mismatch or undecodable `File` data; the
    /// previous frame under `id` is kept.
    pub fn put_stream(
        &mut self,
        id: &str,
        format: TextureFormat,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<AssetChange, AssetError> {
        let image = ImageAsset::from_texture(format, width, height, bytes)?;
        Ok(self.insert(id, Asset::Stream(image)))
    }

    /// # Errors
    /// Returns [`AssetError::EmptyFont`] for an empty buffer.
    pub fn put_font(&mut self, id: &str, bytes: Vec<u8>) -> Result<AssetChange, AssetError> {
        let font = FontAsset::new(bytes)?;
        Ok(self.insert(id, Asset::Font(font)))
    }

    /// Removes an asset. Returns `None` if nothing was stored under `id`.
    pub fn delete(&mut self, kind: AssetKind, id: &str) -> Option<AssetChange> {
        let removed = match kind {
            AssetKind::Image => self.images.remove(id).is_some(),
            AssetKind::Stream => self.streams.remove(id).is_some(),
            AssetKind::Font => self.fonts.remove(id).is_some(),
        };
        removed.then(|| {
            debug!(target: "renderer", "asset {kind} `{id}` deleted");
            AssetChange {
                kind,
                id: id.to_owned(),
            }
        })
    }

    pub fn image(&self, id: &str) -> Option<&Arc<ImageAsset>> {
        self.images.get(id)
    }

    pub fn stream(&self, id: &str) -> Option<&Arc<ImageAsset>> {
        self.streams.get(id)
    }

    /// Image or stream under `id`, images first. Used by sprite draws, which
    /// may name either.
    pub fn texture(&self, id: &str) -> Option<&Arc<ImageAsset>> {
        self.image(id).or_else(|| self.stream(id))
    }

    pub fn font(&self, id: &str) -> Option<&Arc<FontAsset>> {
        self.fonts.get(id)
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.streams.len() + self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.streams.clear();
        self.fonts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_1x1(rgba: [u8; 4]) -> Vec<u8> {
        let mut out = Vec::new();
        let img = image::RgbaImage::from_raw(1, 1, rgba.to_vec()).unwrap();
        img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn parses_texture_format_names() {
        assert_eq!("rgba".parse::<TextureFormat>().unwrap(), TextureFormat::Rgba);
        assert_eq!("ga".parse::<TextureFormat>().unwrap(), TextureFormat::GrayAlpha);
        assert!(matches!(
            "bgra".parse::<TextureFormat>(),
            Err(AssetError::UnknownFormat(name)) if name == "bgra"
        ));
    }

    #[test]
    fn raw_stream_size_must_match() {
        let err = ImageAsset::from_texture(TextureFormat::Rgb, 2, 2, &[0; 11]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::SizeMismatch {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn oversized_stream_is_rejected() {
        let err = ImageAsset::from_texture(TextureFormat::Rgba, u32::MAX, u32::MAX, &[0; 4]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::TooLarge {
                width: u32::MAX,
                height: u32::MAX
            }
        ));
    }

    #[test]
    fn gray_alpha_expands_and_premultiplies() {
        let image = ImageAsset::from_texture(TextureFormat::GrayAlpha, 1, 1, &[200, 128]).unwrap();
        assert_eq!(image.pixels(), &[100, 100, 100, 128]);
    }

    #[test]
    fn decodes_png_images() {
        let mut registry = AssetRegistry::new();
        let change = registry.put_image("dot", &png_1x1([255, 0, 0, 255])).unwrap();
        assert_eq!(change.kind, AssetKind::Image);
        let image = registry.image("dot").unwrap();
        assert_eq!((image.width(), image.height()), (1, 1));
        assert_eq!(image.pixels(), &[255, 0, 0, 255]);
    }

    #[test]
    fn failed_put_keeps_previous_payload() {
        let mut registry = AssetRegistry::new();
        registry
            .put_stream("cam", TextureFormat::Gray, 1, 1, &[7])
            .unwrap();
        assert!(registry
            .put_stream("cam", TextureFormat::Gray, 2, 2, &[7])
            .is_err());
        assert_eq!(registry.stream("cam").unwrap().width(), 1);
    }

    #[test]
    fn delete_reports_only_existing_assets() {
        let mut registry = AssetRegistry::new();
        registry.put_font("mono", vec![1, 2, 3]).unwrap();
        assert!(registry.delete(AssetKind::Font, "mono").is_some());
        assert!(registry.delete(AssetKind::Font, "mono").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn texture_lookup_prefers_images() {
        let mut registry = AssetRegistry::new();
        registry
            .put_stream("tex", TextureFormat::Gray, 2, 1, &[1, 2])
            .unwrap();
        assert_eq!(registry.texture("tex").unwrap().width(), 2);
        registry.put_image("tex", &png_1x1([0, 0, 0, 255])).unwrap();
        assert_eq!(registry.texture("tex").unwrap().width(), 1);
    }

    #[test]
    fn font_generation_changes_on_replace() {
        let mut registry = AssetRegistry::new();
        registry.put_font("ui", vec![1]).unwrap();
        let first = registry.font("ui").unwrap().generation();
        registry.put_font("ui", vec![2]).unwrap();
        assert!(registry.font("ui").unwrap().generation() > first);
    }
}
