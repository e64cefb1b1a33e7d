use super::*;
use crate::foundation::core::{Rgb8, Rgba8};

#[test]
fn channel_normalization_keeps_geometry() {
    let src = FlexImage::from(ImageFrame::filled_rgb(7, 5, Rgb8::new(1, 2, 3)).unwrap());
    let out = resize_image(&src, 7, 5, 4, true).unwrap();
    assert!(out.is_decoded());
    assert_eq!((out.width(), out.height(), out.channels()), (7, 5, 4));
    let frame = out.as_frame().unwrap();
    assert_eq!(frame.rgba_at(6, 4), Rgba8::new(1, 2, 3, 255));
}

#[test]
fn dropping_alpha_keeps_colour() {
    let src = FlexImage::from(ImageFrame::filled_rgba(2, 2, Rgba8::new(9, 9, 9, 10)).unwrap());
    let out = resize_image(&src, 2, 2, 3, true).unwrap();
    assert_eq!(out.as_frame().unwrap().rgb_at(1, 1), Rgb8::new(9, 9, 9));
}

#[test]
fn geometry_change_resamples_solid_colour() {
    let src = FlexImage::from(ImageFrame::filled_rgba(4, 4, Rgba8::new(50, 60, 70, 255)).unwrap());
    let out = resize_image(&src, 8, 2, 4, true).unwrap();
    let frame = out.as_frame().unwrap();
    assert_eq!((frame.width(), frame.height()), (8, 2));
    assert_eq!(frame.rgba_at(3, 1), Rgba8::new(50, 60, 70, 255));
}

#[test]
fn rejects_invalid_targets() {
    let src = FlexImage::from(ImageFrame::new(2, 2, 3).unwrap());
    assert!(resize_image(&src, 0, 2, 4, true).is_err());
    assert!(resize_image(&src, 2, 2, 2, true).is_err());
}
