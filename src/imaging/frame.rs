use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Rgb8, Rgba8};
use crate::foundation::error::{OneShotError, OneShotResult};

/// Decoded 8-bit image buffer.
///
/// Pixels are stored row-major with `channels` interleaved bytes per pixel (3 = RGB, 4 = RGBA,
/// straight alpha). Rows start every `stride` bytes; `stride` may exceed `width * channels` when
/// rows are padded. Dimensions and channel count are fixed once the buffer is allocated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFrame {
    width: u32,
    height: u32,
    channels: u8,
    stride: usize,
    data: Vec<u8>,
}

impl ImageFrame {
    /// Allocate a zero-filled, tightly packed buffer.
    pub fn new(width: u32, height: u32, channels: u8) -> OneShotResult<Self> {
        let stride = row_bytes(width, channels)?;
        Self::with_stride(width, height, channels, stride)
    }

    /// Allocate a zero-filled buffer with an explicit row stride in bytes.
    pub fn with_stride(width: u32, height: u32, channels: u8, stride: usize) -> OneShotResult<Self> {
        validate_shape(width, height, channels)?;
        let min_stride = row_bytes(width, channels)?;
        if stride < min_stride {
            return Err(OneShotError::validation(format!(
                "row stride {stride} is smaller than width*channels ({min_stride})"
            )));
        }
        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| OneShotError::validation("image buffer size overflow"))?;
        Ok(Self {
            width,
            height,
            channels,
            stride,
            data: vec![0u8; len],
        })
    }

    /// Allocate an RGB buffer filled with `px`.
    pub fn filled_rgb(width: u32, height: u32, px: Rgb8) -> OneShotResult<Self> {
        let mut out = Self::new(width, height, 3)?;
        for chunk in out.data.chunks_exact_mut(3) {
            chunk.copy_from_slice(&[px.r, px.g, px.b]);
        }
        Ok(out)
    }

    /// Allocate an RGBA buffer filled with `px`.
    pub fn filled_rgba(width: u32, height: u32, px: Rgba8) -> OneShotResult<Self> {
        let mut out = Self::new(width, height, 4)?;
        for chunk in out.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px.to_array());
        }
        Ok(out)
    }

    /// Wrap tightly packed pixel bytes.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> OneShotResult<Self> {
        let stride = row_bytes(width, channels)?;
        Self::from_raw_with_stride(width, height, channels, stride, data)
    }

    /// Wrap pixel bytes whose rows start every `stride` bytes.
    pub fn from_raw_with_stride(
        width: u32,
        height: u32,
        channels: u8,
        stride: usize,
        data: Vec<u8>,
    ) -> OneShotResult<Self> {
        validate_shape(width, height, channels)?;
        let min_stride = row_bytes(width, channels)?;
        if stride < min_stride {
            return Err(OneShotError::validation(format!(
                "row stride {stride} is smaller than width*channels ({min_stride})"
            )));
        }
        let expected = stride
            .checked_mul(height as usize)
            .ok_or_else(|| OneShotError::validation("image buffer size overflow"))?;
        if data.len() != expected {
            return Err(OneShotError::validation(format!(
                "expected {expected} bytes for {width}x{height}x{channels} (stride {stride}), got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Interleaved channels per pixel (3 or 4).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Bytes between the starts of consecutive rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Dimensions as a [`Canvas`].
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Raw bytes including any row padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel bytes of row `y` without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = (y as usize) * self.stride;
        &self.data[start..start + self.row_len()]
    }

    /// Mutable pixel bytes of row `y` without padding.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = (y as usize) * self.stride;
        let len = self.row_len();
        &mut self.data[start..start + len]
    }

    fn row_len(&self) -> usize {
        (self.width as usize) * (self.channels as usize)
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize) * self.stride + (x as usize) * (self.channels as usize)
    }

    /// Read a pixel as RGBA; RGB buffers report alpha 255.
    pub fn rgba_at(&self, x: u32, y: u32) -> Rgba8 {
        let i = self.offset(x, y);
        let d = &self.data;
        if self.channels == 4 {
            Rgba8::new(d[i], d[i + 1], d[i + 2], d[i + 3])
        } else {
            Rgba8::new(d[i], d[i + 1], d[i + 2], 255)
        }
    }

    /// Read the colour channels of a pixel.
    pub fn rgb_at(&self, x: u32, y: u32) -> Rgb8 {
        self.rgba_at(x, y).rgb()
    }

    /// Write a pixel; the alpha channel is dropped on RGB buffers.
    pub fn set_rgba(&mut self, x: u32, y: u32, px: Rgba8) {
        let i = self.offset(x, y);
        let n = self.channels as usize;
        self.data[i..i + n].copy_from_slice(&px.to_array()[..n]);
    }

    /// Write the colour channels of a pixel, leaving alpha untouched.
    pub fn set_rgb(&mut self, x: u32, y: u32, px: Rgb8) {
        let i = self.offset(x, y);
        self.data[i..i + 3].copy_from_slice(&[px.r, px.g, px.b]);
    }

    /// Write only the alpha channel. No-op on RGB buffers.
    pub fn set_alpha(&mut self, x: u32, y: u32, a: u8) {
        if self.channels == 4 {
            let i = self.offset(x, y);
            self.data[i + 3] = a;
        }
    }

    /// Copy into a tightly packed RGBA buffer; RGB sources become opaque.
    pub fn to_rgba(&self) -> ImageFrame {
        let mut data = Vec::with_capacity((self.width as usize) * (self.height as usize) * 4);
        for y in 0..self.height {
            let row = self.row(y);
            if self.channels == 4 {
                data.extend_from_slice(row);
            } else {
                for px in row.chunks_exact(3) {
                    data.extend_from_slice(&[px[0], px[1], px[2], 255]);
                }
            }
        }
        ImageFrame {
            width: self.width,
            height: self.height,
            channels: 4,
            stride: (self.width as usize) * 4,
            data,
        }
    }

    /// Copy into a tightly packed RGBA buffer with every alpha forced to 255.
    pub fn to_opaque_rgba(&self) -> ImageFrame {
        let mut out = self.to_rgba();
        for px in out.data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        out
    }

    /// Copy into a tightly packed RGB buffer, dropping alpha.
    pub fn to_rgb(&self) -> ImageFrame {
        let mut data = Vec::with_capacity((self.width as usize) * (self.height as usize) * 3);
        for y in 0..self.height {
            for px in self.row(y).chunks_exact(self.channels as usize) {
                data.extend_from_slice(&px[..3]);
            }
        }
        ImageFrame {
            width: self.width,
            height: self.height,
            channels: 3,
            stride: (self.width as usize) * 3,
            data,
        }
    }

    /// Tightly packed copy of the pixel bytes.
    pub fn to_packed(&self) -> Vec<u8> {
        if self.stride == self.row_len() {
            return self.data.clone();
        }
        let mut out = Vec::with_capacity(self.row_len() * (self.height as usize));
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// Convert from an `image` crate buffer. Images with an alpha channel stay RGBA.
    pub fn from_dynamic(img: &image::DynamicImage) -> OneShotResult<Self> {
        if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            Self::from_raw(w, h, 4, rgba.into_raw())
        } else {
            let rgb = img.to_rgb8();
            let (w, h) = rgb.dimensions();
            Self::from_raw(w, h, 3, rgb.into_raw())
        }
    }

    /// Convert into an `image` crate buffer.
    pub fn to_dynamic(&self) -> OneShotResult<image::DynamicImage> {
        let packed = self.to_packed();
        let img = if self.channels == 4 {
            image::RgbaImage::from_raw(self.width, self.height, packed)
                .map(image::DynamicImage::ImageRgba8)
        } else {
            image::RgbImage::from_raw(self.width, self.height, packed)
                .map(image::DynamicImage::ImageRgb8)
        };
        img.ok_or_else(|| OneShotError::internal("packed buffer does not match image dimensions"))
    }

    /// Write the buffer as a PNG file.
    pub fn save_png(&self, path: &Path) -> OneShotResult<()> {
        let color = if self.channels == 4 {
            image::ColorType::Rgba8
        } else {
            image::ColorType::Rgb8
        };
        image::save_buffer_with_format(
            path,
            &self.to_packed(),
            self.width,
            self.height,
            color,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

fn validate_shape(width: u32, height: u32, channels: u8) -> OneShotResult<()> {
    if width == 0 || height == 0 {
        return Err(OneShotError::validation(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    if channels != 3 && channels != 4 {
        return Err(OneShotError::validation(format!(
            "image channel count must be 3 or 4, got {channels}"
        )));
    }
    Ok(())
}

fn row_bytes(width: u32, channels: u8) -> OneShotResult<usize> {
    (width as usize)
        .checked_mul(channels as usize)
        .ok_or_else(|| OneShotError::validation("image row size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/frame.rs"]
mod tests;
