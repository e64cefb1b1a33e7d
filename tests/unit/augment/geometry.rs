use super::*;
use crate::foundation::core::{Affine, Vec2};

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn warped_corners_follow_source_corner_order() {
    let src = Rect::new(0.0, 0.0, 20.0, 10.0);
    let h = Homography([[0.9, -0.2, 30.0], [0.3, 1.1, 12.0], [0.0005, 0.001, 1.0]]);
    let q = compute_warped_corners(&h, src);
    let expected = [
        Point::new(0.0, 0.0),
        Point::new(20.0, 0.0),
        Point::new(20.0, 10.0),
        Point::new(0.0, 10.0),
    ];
    assert_eq!(q.corners.len(), 4);
    for (got, p) in q.corners.iter().zip(expected) {
        assert!(close(*got, h.apply(p)));
    }
}

#[test]
fn translation_moves_rect_rigidly() {
    let h = Homography::translate(Vec2::new(10.0, 10.0));
    let q = compute_warped_corners(&h, Rect::new(0.0, 0.0, 20.0, 20.0));
    assert_eq!(q.bounding_box(), Rect::new(10.0, 10.0, 30.0, 30.0));
    assert!((q.signed_area() - 400.0).abs() < 1e-9);
    assert!(q.is_convex());
}

#[test]
fn contains_is_closed_and_winding_independent() {
    let q = Quad::from_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
    assert!(q.contains(Point::new(2.0, 2.0)));
    assert!(q.contains(Point::new(0.0, 0.0)));
    assert!(q.contains(Point::new(4.0, 2.0)));
    assert!(!q.contains(Point::new(4.01, 2.0)));

    let mut reversed = q.corners;
    reversed.reverse();
    let r = Quad::new(reversed);
    assert!(r.signed_area() < 0.0);
    assert!(r.contains(Point::new(2.0, 2.0)));
    assert!(!r.contains(Point::new(-1.0, 2.0)));
}

#[test]
fn rotated_quad_excludes_bbox_corners() {
    let a = Affine::translate(Vec2::new(50.0, 50.0)) * Affine::rotate(std::f64::consts::FRAC_PI_4);
    let q = compute_warped_corners(
        &Homography::from_affine(a),
        Rect::new(-10.0, -10.0, 10.0, 10.0),
    );
    let bb = q.bounding_box();
    assert!(q.contains(Point::new(50.0, 50.0)));
    assert!(!q.contains(Point::new(bb.x0 + 0.5, bb.y0 + 0.5)));
}

#[test]
fn degenerate_and_bow_tie_quads_are_not_convex() {
    let flat = Quad::new([
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(3.0, 0.0),
    ]);
    assert!(!flat.is_convex());
    assert!(!flat.contains(Point::new(1.0, 0.0)));

    let bow_tie = Quad::new([
        Point::new(0.0, 0.0),
        Point::new(4.0, 4.0),
        Point::new(4.0, 0.0),
        Point::new(0.0, 4.0),
    ]);
    assert!(!bow_tie.is_convex());
}

#[test]
fn overlap_requires_shared_area() {
    let q = Quad::from_rect(Rect::new(-5.0, -5.0, 0.0, 0.0));
    assert!(!q.overlaps(Rect::new(0.0, 0.0, 10.0, 10.0)));
    let q = Quad::from_rect(Rect::new(-5.0, -5.0, 1.0, 1.0));
    assert!(q.overlaps(Rect::new(0.0, 0.0, 10.0, 10.0)));
}
