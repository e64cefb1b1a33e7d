//! Straight-alpha "over" compositing onto an opaque RGB output.

use crate::foundation::core::{RGB_WHITE, Rgb8, Rgba8};
use crate::foundation::error::{OneShotError, OneShotResult};
use crate::imaging::frame::ImageFrame;

/// Blend `fg` over `bg` into an opaque colour.
///
/// Opacities are whole numbers: `a = alpha / 255` with integer division, so only alpha 255
/// counts as covering. Per channel
/// `(c_fg * a_fg + c_bg * a_bg * (1 - a_fg)) / (a_fg + a_bg * (1 - a_fg))`
/// with truncating division. When both opacities are 0 the background colour is kept.
pub fn over(fg: Rgba8, bg: Rgba8) -> Rgb8 {
    let a_fg = u32::from(fg.a) / 255;
    let a_bg = u32::from(bg.a) / 255;
    let coverage = a_fg + a_bg * (1 - a_fg);
    if coverage == 0 {
        return bg.rgb();
    }
    let blend = |c_fg: u8, c_bg: u8| -> u8 {
        let num = u32::from(c_fg) * a_fg + u32::from(c_bg) * a_bg * (1 - a_fg);
        (num / coverage) as u8
    };
    Rgb8::new(blend(fg.r, bg.r), blend(fg.g, bg.g), blend(fg.b, bg.b))
}

/// Composite an RGBA foreground over a same-sized background into a new RGB image.
///
/// RGB backgrounds are read as opaque.
pub fn composite(foreground: &ImageFrame, background: &ImageFrame) -> OneShotResult<ImageFrame> {
    let mut out = ImageFrame::filled_rgb(foreground.width(), foreground.height(), RGB_WHITE)?;
    composite_into(&mut out, foreground, background)?;
    Ok(out)
}

/// Composite into an existing RGB buffer of the same size.
pub fn composite_into(
    out: &mut ImageFrame,
    foreground: &ImageFrame,
    background: &ImageFrame,
) -> OneShotResult<()> {
    if foreground.canvas() != background.canvas() || foreground.canvas() != out.canvas() {
        return Err(OneShotError::validation(format!(
            "composite expects equal sizes, got fg {}x{}, bg {}x{}, out {}x{}",
            foreground.width(),
            foreground.height(),
            background.width(),
            background.height(),
            out.width(),
            out.height()
        )));
    }
    if foreground.channels() != 4 {
        return Err(OneShotError::internal(
            "composite foreground must be an RGBA buffer",
        ));
    }
    if out.channels() != 3 {
        return Err(OneShotError::internal("composite output must be an RGB buffer"));
    }

    for y in 0..out.height() {
        for x in 0..out.width() {
            let px = over(foreground.rgba_at(x, y), background.rgba_at(x, y));
            out.set_rgb(x, y, px);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/augment/composite.rs"]
mod tests;
