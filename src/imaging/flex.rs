use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use image::ImageDecoder as _;

use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::frame::ImageFrame;

/// An image that is either still encoded (PNG, JPEG, ...) or decoded into pixels.
///
/// Encoded images carry the header metadata (dimensions, channel count) so they can be
/// inspected without decoding. Grayscale sources report 3 channels (4 with alpha), since
/// decoded frames are always RGB or RGBA.
#[derive(Clone, Debug)]
pub enum FlexImage {
    /// Compressed bytes plus header metadata.
    Encoded {
        /// Encoded file bytes.
        bytes: Arc<[u8]>,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Channel count after decoding.
        channels: u8,
    },
    /// Decoded pixels.
    Decoded(ImageFrame),
}

impl From<ImageFrame> for FlexImage {
    fn from(frame: ImageFrame) -> Self {
        Self::Decoded(frame)
    }
}

impl FlexImage {
    /// Wrap encoded bytes, reading only the header.
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>) -> OneShotResult<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let (width, height, channels) = {
            let decoder = image::ImageReader::new(Cursor::new(&bytes[..]))
                .with_guessed_format()
                .context("guess image format")?
                .into_decoder()?;
            let (width, height) = decoder.dimensions();
            let channels: u8 = if decoder.color_type().has_alpha() { 4 } else { 3 };
            (width, height, channels)
        };
        if width == 0 || height == 0 {
            return Err(OneShotError::image("encoded image has zero dimensions"));
        }
        Ok(Self::Encoded {
            bytes,
            width,
            height,
            channels,
        })
    }

    /// Read an image file without decoding it.
    pub fn open(path: &Path) -> OneShotResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Self::from_encoded(bytes)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Encoded { width, .. } => *width,
            Self::Decoded(f) => f.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Encoded { height, .. } => *height,
            Self::Decoded(f) => f.height(),
        }
    }

    /// Channels per pixel once decoded.
    pub fn channels(&self) -> u8 {
        match self {
            Self::Encoded { channels, .. } => *channels,
            Self::Decoded(f) => f.channels(),
        }
    }

    /// Returns `true` when pixel data is directly available.
    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    /// Decoded frame, if any.
    pub fn as_frame(&self) -> Option<&ImageFrame> {
        match self {
            Self::Decoded(f) => Some(f),
            Self::Encoded { .. } => None,
        }
    }

    /// Raw pixel bytes; only available once decoded.
    pub fn pixel_data(&self) -> Option<&[u8]> {
        self.as_frame().map(ImageFrame::data)
    }

    /// Decode into pixels, copying if already decoded.
    pub fn decode(&self) -> OneShotResult<ImageFrame> {
        match self {
            Self::Decoded(f) => Ok(f.clone()),
            Self::Encoded { bytes, .. } => {
                let img = image::load_from_memory(bytes)?;
                ImageFrame::from_dynamic(&img)
            }
        }
    }

    /// Decode into pixels, consuming `self`.
    pub fn into_decoded(self) -> OneShotResult<ImageFrame> {
        match self {
            Self::Decoded(f) => Ok(f),
            encoded @ Self::Encoded { .. } => encoded.decode(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/flex.rs"]
mod tests;
