use super::*;

#[test]
fn rejects_bad_shapes() {
    assert!(ImageFrame::new(0, 2, 3).is_err());
    assert!(ImageFrame::new(2, 2, 1).is_err());
    assert!(ImageFrame::with_stride(4, 2, 4, 15).is_err());
    assert!(ImageFrame::from_raw(2, 2, 3, vec![0; 11]).is_err());
}

#[test]
fn padded_rows_are_addressed_by_stride() {
    let mut f = ImageFrame::with_stride(2, 3, 4, 12).unwrap();
    assert_eq!(f.data().len(), 36);
    f.set_rgba(1, 2, Rgba8::new(1, 2, 3, 4));
    assert_eq!(f.rgba_at(1, 2), Rgba8::new(1, 2, 3, 4));
    assert_eq!(&f.data()[28..32], &[1, 2, 3, 4]);
    assert_eq!(f.row(2), &[0, 0, 0, 0, 1, 2, 3, 4]);
    assert_eq!(f.to_packed().len(), 24);
}

#[test]
fn rgb_reads_as_opaque_and_converts_to_rgba() {
    let f = ImageFrame::filled_rgb(2, 1, Rgb8::new(9, 8, 7)).unwrap();
    assert_eq!(f.rgba_at(1, 0), Rgba8::new(9, 8, 7, 255));
    let rgba = f.to_rgba();
    assert_eq!(rgba.channels(), 4);
    assert_eq!(rgba.data(), &[9, 8, 7, 255, 9, 8, 7, 255]);
    assert_eq!(rgba.to_rgb(), f);
}

#[test]
fn set_alpha_only_touches_alpha() {
    let mut f = ImageFrame::filled_rgba(1, 1, Rgba8::new(10, 20, 30, 40)).unwrap();
    f.set_alpha(0, 0, 255);
    assert_eq!(f.rgba_at(0, 0), Rgba8::new(10, 20, 30, 255));
    f.set_rgb(0, 0, Rgb8::new(1, 1, 1));
    assert_eq!(f.rgba_at(0, 0), Rgba8::new(1, 1, 1, 255));
}

#[test]
fn dynamic_image_round_trip_keeps_alpha_choice() {
    let f = ImageFrame::filled_rgba(3, 2, Rgba8::new(1, 2, 3, 128)).unwrap();
    let back = ImageFrame::from_dynamic(&f.to_dynamic().unwrap()).unwrap();
    assert_eq!(back, f);

    let g = ImageFrame::filled_rgb(3, 2, Rgb8::new(4, 5, 6)).unwrap();
    let back = ImageFrame::from_dynamic(&g.to_dynamic().unwrap()).unwrap();
    assert_eq!(back.channels(), 3);
}

#[test]
fn opaque_conversion_forces_alpha() {
    let f = ImageFrame::filled_rgba(2, 2, Rgba8::new(3, 4, 5, 0)).unwrap();
    let o = f.to_opaque_rgba();
    assert_eq!(o.rgba_at(1, 1), Rgba8::new(3, 4, 5, 255));
}
