use crate::foundation::error::{OneShotError, OneShotResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Pixel dimensions of an image or canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> OneShotResult<Self> {
        if width == 0 || height == 0 {
            return Err(OneShotError::validation(format!(
                "canvas dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Canvas area as a `kurbo::Rect` anchored at the origin.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Straight (non-premultiplied) RGB8 pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a pixel from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Promote to RGBA with the given alpha.
    pub const fn with_alpha(self, a: u8) -> Rgba8 {
        Rgba8 {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// Straight (non-premultiplied) RGBA8 pixel. Alpha 0 is transparent, 255 opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Build a pixel from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Drop the alpha channel.
    pub const fn rgb(self) -> Rgb8 {
        Rgb8 {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }

    /// Channels in `[r, g, b, a]` order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Build a pixel from `[r, g, b, a]`.
    pub const fn from_array(px: [u8; 4]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }
}

/// Fill colour of a fresh superimposed (output) buffer.
pub const RGB_WHITE: Rgb8 = Rgb8::new(255, 255, 255);

/// Fill colour of a fresh transformed buffer: white, fully transparent.
pub const RGBA_WHITE: Rgba8 = Rgba8::new(255, 255, 255, 0);

/// Determinants below this magnitude are treated as singular.
pub const DEGENERATE_EPSILON: f64 = 1e-12;

/// 3x3 homogeneous transform in row-major order, mapping `(x, y, 1)` column vectors.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Homography(pub [[f64; 3]; 3]);

impl Default for Homography {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Homography {
    /// The identity transform.
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Pure translation.
    pub fn translate(v: Vec2) -> Self {
        Self([[1.0, 0.0, v.x], [0.0, 1.0, v.y], [0.0, 0.0, 1.0]])
    }

    /// Lift a 2-D affine transform.
    pub fn from_affine(a: Affine) -> Self {
        let [xx, yx, xy, yy, x0, y0] = a.as_coeffs();
        Self([[xx, xy, x0], [yx, yy, y0], [0.0, 0.0, 1.0]])
    }

    /// Return the affine part when the projective row is `(0, 0, 1)`.
    pub fn to_affine(&self) -> Option<Affine> {
        let m = &self.0;
        if m[2][0] != 0.0 || m[2][1] != 0.0 || m[2][2] == 0.0 {
            return None;
        }
        let s = 1.0 / m[2][2];
        Some(Affine::new([
            m[0][0] * s,
            m[1][0] * s,
            m[0][1] * s,
            m[1][1] * s,
            m[0][2] * s,
            m[1][2] * s,
        ]))
    }

    /// Determinant of the 3x3 matrix.
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Scale so that `m[2][2] == 1` when possible.
    pub fn normalized(&self) -> Self {
        let w = self.0[2][2];
        if w.abs() < DEGENERATE_EPSILON {
            return *self;
        }
        let mut out = self.0;
        for row in &mut out {
            for v in row.iter_mut() {
                *v /= w;
            }
        }
        Self(out)
    }

    /// Returns `true` when the transform can be inverted.
    pub fn is_invertible(&self) -> bool {
        let d = self.determinant();
        d.is_finite() && d.abs() > DEGENERATE_EPSILON
    }

    /// Inverse via the adjugate, or `None` for singular transforms.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_invertible() {
            return None;
        }
        let m = &self.0;
        let inv_det = 1.0 / self.determinant();
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        let adj = [
            [cof(1, 2, 1, 2), -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
            [-cof(1, 2, 0, 2), cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
            [cof(1, 2, 0, 1), -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
        ];
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = adj[i][j] * inv_det;
            }
        }
        Some(Self(out).normalized())
    }

    /// Homogeneous weight `w` of `p` under this transform.
    pub fn weight(&self, p: Point) -> f64 {
        let m = &self.0;
        m[2][0] * p.x + m[2][1] * p.y + m[2][2]
    }

    /// Map `p`, returning `None` when it lands at infinity.
    pub fn project(&self, p: Point) -> Option<Point> {
        let m = &self.0;
        let w = self.weight(p);
        if !w.is_finite() || w.abs() < DEGENERATE_EPSILON {
            return None;
        }
        let x = (m[0][0] * p.x + m[0][1] * p.y + m[0][2]) / w;
        let y = (m[1][0] * p.x + m[1][1] * p.y + m[1][2]) / w;
        Some(Point::new(x, y))
    }

    /// Map `p`; points at infinity map to non-finite coordinates.
    pub fn apply(&self, p: Point) -> Point {
        self.project(p)
            .unwrap_or(Point::new(f64::INFINITY, f64::INFINITY))
    }
}

impl std::ops::Mul for Homography {
    type Output = Homography;

    /// Composition `self * rhs`: `rhs` is applied first.
    fn mul(self, rhs: Homography) -> Homography {
        let (a, b) = (&self.0, &rhs.0);
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
            }
        }
        Homography(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
