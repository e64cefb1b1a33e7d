use image::imageops::FilterType;

use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::flex::FlexImage;
use crate::imaging::frame::ImageFrame;

/// Resize `image` to `width`x`height` with `channels` channels (3 or 4).
///
/// Geometry changes use bilinear filtering. Channel changes drop alpha (4 -> 3) or add an opaque
/// alpha (3 -> 4). With `decode == false` an image that already has the requested shape is
/// returned as-is, possibly still encoded; any real conversion always yields a decoded image.
pub fn resize_image(
    image: &FlexImage,
    width: u32,
    height: u32,
    channels: u8,
    decode: bool,
) -> OneShotResult<FlexImage> {
    if width == 0 || height == 0 {
        return Err(OneShotError::validation(format!(
            "resize target must be non-zero, got {width}x{height}"
        )));
    }
    if channels != 3 && channels != 4 {
        return Err(OneShotError::validation(format!(
            "resize target channel count must be 3 or 4, got {channels}"
        )));
    }

    let same_shape =
        image.width() == width && image.height() == height && image.channels() == channels;
    if same_shape && (!decode || image.is_decoded()) {
        return Ok(image.clone());
    }

    let mut frame = image.decode()?;
    if frame.width() != width || frame.height() != height {
        let resized = image::imageops::resize(
            &frame.to_rgba().to_dynamic()?,
            width,
            height,
            FilterType::Triangle,
        );
        let rgba = ImageFrame::from_raw(width, height, 4, resized.into_raw())?;
        frame = if frame.channels() == 4 {
            rgba
        } else {
            rgba.to_rgb()
        };
    }

    let frame = match (frame.channels(), channels) {
        (3, 4) => frame.to_rgba(),
        (4, 3) => frame.to_rgb(),
        _ => frame,
    };
    Ok(FlexImage::Decoded(frame))
}

#[cfg(test)]
#[path = "../../tests/unit/imaging/resize.rs"]
mod tests;
