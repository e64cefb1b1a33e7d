use super::*;
use crate::foundation::core::{Affine, Vec2};

fn solid(w: u32, h: u32, px: Rgba8) -> ImageFrame {
    ImageFrame::filled_rgba(w, h, px).unwrap()
}

#[test]
fn identity_reproduces_source_exactly() {
    let mut src = solid(3, 2, Rgba8::new(0, 0, 0, 255));
    src.set_rgba(1, 0, Rgba8::new(10, 20, 30, 40));
    src.set_rgba(2, 1, Rgba8::new(200, 100, 50, 255));
    let out = resample(&src, src.canvas(), &Homography::IDENTITY).unwrap();
    assert_eq!(out, src);
}

#[test]
fn solid_opaque_source_is_exact_or_transparent() {
    let colour = Rgba8::new(12, 200, 77, 255);
    let src = solid(17, 9, colour);
    let forward = Homography::from_affine(
        Affine::translate(Vec2::new(40.0, 30.0))
            * Affine::rotate(0.37)
            * Affine::scale_non_uniform(1.7, 2.3),
    );
    let out = resample(
        &src,
        Canvas::new(96, 80).unwrap(),
        &forward.inverse().unwrap(),
    )
    .unwrap();

    let mut inside = 0;
    for y in 0..out.height() {
        for x in 0..out.width() {
            let px = out.rgba_at(x, y);
            if px.a == 0 {
                assert_eq!(px, RGBA_WHITE);
            } else {
                assert_eq!(px, colour);
                inside += 1;
            }
        }
    }
    assert!(inside > 0);
}

#[test]
fn half_pixel_offset_interpolates_neighbours() {
    let mut src = solid(2, 1, Rgba8::new(0, 0, 0, 255));
    src.set_rgba(1, 0, Rgba8::new(100, 200, 51, 255));
    let p = sample_bilinear(&src, Point::new(0.5, 0.0)).unwrap();
    assert_eq!(p, Rgba8::new(50, 100, 26, 255));
}

#[test]
fn support_covers_the_whole_source_area() {
    let src = solid(4, 4, Rgba8::new(1, 2, 3, 255));
    assert!(sample_bilinear(&src, Point::new(3.0, 3.0)).is_some());
    assert!(sample_bilinear(&src, Point::new(3.5, 3.99)).is_some());
    assert!(sample_bilinear(&src, Point::new(-1e-9, 0.0)).is_some());
    assert!(sample_bilinear(&src, Point::new(4.0, 0.0)).is_none());
    assert!(sample_bilinear(&src, Point::new(0.0, 4.0)).is_none());
    assert!(sample_bilinear(&src, Point::new(-0.5, 0.0)).is_none());
    assert!(sample_bilinear(&src, Point::new(f64::NAN, 0.0)).is_none());
}

#[test]
fn past_last_pixel_centre_reproduces_edge_pixel() {
    let mut src = solid(2, 1, Rgba8::new(0, 0, 0, 255));
    src.set_rgba(1, 0, Rgba8::new(100, 200, 51, 255));
    assert_eq!(
        sample_bilinear(&src, Point::new(1.5, 0.5)),
        Some(Rgba8::new(100, 200, 51, 255))
    );
}

#[test]
fn upscaled_object_fills_its_whole_outline() {
    let src = solid(10, 10, Rgba8::new(0, 0, 255, 255));
    let forward = Homography::from_affine(
        Affine::translate(Vec2::new(40.0, 40.0)) * Affine::scale(2.0),
    );
    let out = resample(&src, Canvas::new(100, 100).unwrap(), &forward.inverse().unwrap()).unwrap();
    for y in 0..100 {
        for x in 0..100 {
            let inside = (40..60).contains(&x) && (40..60).contains(&y);
            assert_eq!(out.rgba_at(x, y).a == 255, inside, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn translation_places_block_at_offset() {
    let src = solid(2, 2, Rgba8::new(9, 9, 9, 255));
    let inv = Homography::translate(Vec2::new(-3.0, -1.0));
    let out = resample(&src, Canvas::new(6, 4).unwrap(), &inv).unwrap();
    for y in 0..4 {
        for x in 0..6 {
            let expect_inside = (3..5).contains(&x) && (1..3).contains(&y);
            assert_eq!(out.rgba_at(x, y).a == 255, expect_inside, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn non_rgba_buffers_are_internal_errors() {
    let rgb = ImageFrame::new(2, 2, 3).unwrap();
    let err = resample(&rgb, Canvas::new(2, 2).unwrap(), &Homography::IDENTITY).unwrap_err();
    assert!(err.is_internal());

    let src = solid(2, 2, Rgba8::new(0, 0, 0, 255));
    let mut dst = ImageFrame::new(2, 2, 3).unwrap();
    assert!(
        resample_into(&src, &mut dst, &Homography::IDENTITY)
            .unwrap_err()
            .is_internal()
    );
}

#[test]
fn padded_destination_rows_are_filled() {
    let src = solid(2, 2, Rgba8::new(5, 6, 7, 255));
    let mut dst = ImageFrame::with_stride(2, 2, 4, 12).unwrap();
    resample_into(&src, &mut dst, &Homography::IDENTITY).unwrap();
    assert_eq!(dst.rgba_at(1, 1), Rgba8::new(5, 6, 7, 255));
}
