//! Randomized placement of an object rectangle inside a canvas.
//!
//! The object is treated as a planar card in 3-D: it is centred at the origin, tilted about the
//! x and y axes, rotated in-plane, pushed to the focal distance and projected back onto the
//! canvas. Without tilt the result is exactly "scale, rotate, translate".

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::augment::config::SamplerConfig;
use crate::augment::geometry::{Quad, compute_warped_corners};
use crate::foundation::core::{Canvas, Homography, Point, Rect};
use crate::foundation::error::{OneShotError, OneShotResult};
use crate::foundation::math::row_seed;

/// A transform that places an object image on a canvas.
///
/// Implementors guarantee `inverse()` is the inverse of `transform()` and that
/// `warped_corners()` is the object rectangle mapped through `transform()`.
pub trait Warp {
    /// Object space to canvas space.
    fn transform(&self) -> Homography;
    /// Canvas space to object space.
    fn inverse(&self) -> Homography;
    /// Object rectangle corners in canvas space.
    fn warped_corners(&self) -> Quad;
}

/// Concrete placement parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WarpParams {
    /// Object pixels to canvas pixels, at zero tilt.
    pub scale: f64,
    /// In-plane rotation, clockwise in image space.
    pub rotation_deg: f64,
    /// Tilt about the horizontal axis.
    pub tilt_x_deg: f64,
    /// Tilt about the vertical axis.
    pub tilt_y_deg: f64,
    /// Canvas position of the object centre.
    pub center: Point,
}

impl WarpParams {
    /// Untilted, unrotated placement.
    pub fn placement(scale: f64, center: Point) -> Self {
        Self {
            scale,
            rotation_deg: 0.0,
            tilt_x_deg: 0.0,
            tilt_y_deg: 0.0,
            center,
        }
    }
}

/// A fixed, pre-validated [`Warp`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedWarp {
    transform: Homography,
    inverse: Homography,
    corners: Quad,
}

impl FixedWarp {
    /// Validate `transform` and compute its inverse and the warped `source_rect`.
    pub fn new(transform: Homography, source_rect: Rect) -> OneShotResult<Self> {
        let inverse = transform
            .inverse()
            .ok_or_else(|| OneShotError::validation("warp transform is not invertible"))?;
        Ok(Self {
            transform,
            inverse,
            corners: compute_warped_corners(&transform, source_rect),
        })
    }
}

impl Warp for FixedWarp {
    fn transform(&self) -> Homography {
        self.transform
    }

    fn inverse(&self) -> Homography {
        self.inverse
    }

    fn warped_corners(&self) -> Quad {
        self.corners
    }
}

/// Draws random placements of a `width`x`height` object and keeps the last accepted one.
///
/// Draws are deterministic in `(seed, row)`. Until the first draw the sampler holds the
/// identity placement.
#[derive(Clone, Debug)]
pub struct ParameterSampler {
    object: Rect,
    config: SamplerConfig,
    params: WarpParams,
    transform: Homography,
    inverse: Homography,
    corners: Quad,
}

impl ParameterSampler {
    /// Create a sampler for an object of the given pixel size.
    pub fn new(object_width: u32, object_height: u32, config: SamplerConfig) -> OneShotResult<Self> {
        config.validate()?;
        let object = object_rect(object_width, object_height)?;
        Ok(Self {
            object,
            config,
            params: WarpParams::placement(1.0, object.center()),
            transform: Homography::IDENTITY,
            inverse: Homography::IDENTITY,
            corners: Quad::from_rect(object),
        })
    }

    /// Build a sampler holding an explicit placement on `canvas`.
    pub fn with_params(
        object_width: u32,
        object_height: u32,
        canvas: Canvas,
        params: WarpParams,
    ) -> OneShotResult<Self> {
        let mut sampler = Self::new(object_width, object_height, SamplerConfig::default())?;
        let candidate = sampler.evaluate(canvas, params).ok_or_else(|| {
            OneShotError::validation(format!("degenerate warp parameters: {params:?}"))
        })?;
        sampler.commit(candidate);
        Ok(sampler)
    }

    /// Randomization ranges.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Parameters of the current placement.
    pub fn params(&self) -> WarpParams {
        self.params
    }

    /// Draw a new placement for `canvas`.
    ///
    /// Degenerate draws (singular, behind the camera, non-convex, or off-canvas) are re-drawn from
    /// the same stream. After `max_attempts` rejections the object is centred at `min_scale`
    /// without rotation or tilt.
    pub fn sample(&mut self, canvas: Canvas, seed: u64, row: u64) -> OneShotResult<WarpParams> {
        let canvas = Canvas::new(canvas.width, canvas.height)?;
        let mut rng = StdRng::seed_from_u64(row_seed(seed, row));
        for attempt in 0..self.config.max_attempts {
            let params = self.draw(&mut rng, canvas);
            if let Some(candidate) = self.evaluate(canvas, params) {
                self.commit(candidate);
                return Ok(self.params);
            }
            tracing::debug!(seed, row, attempt, ?params, "rejected degenerate warp draw");
        }

        let params = self.fallback_params(canvas);
        tracing::warn!(
            seed,
            row,
            attempts = self.config.max_attempts,
            "warp sampling exhausted its attempts, using centred placement"
        );
        let candidate = self
            .evaluate(canvas, params)
            .ok_or_else(|| OneShotError::internal("centred fallback warp is degenerate"))?;
        self.commit(candidate);
        Ok(self.params)
    }

    fn draw(&self, rng: &mut StdRng, canvas: Canvas) -> WarpParams {
        let cfg = &self.config;
        let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
        let frac = rng.random_range(cfg.min_scale..=cfg.max_scale);
        let rotation_deg = rng.random_range(-cfg.max_rotation_deg..=cfg.max_rotation_deg);
        let tilt_x_deg = rng.random_range(-cfg.max_tilt_deg..=cfg.max_tilt_deg);
        let tilt_y_deg = rng.random_range(-cfg.max_tilt_deg..=cfg.max_tilt_deg);
        let cx = rng.random_range(cw * cfg.margin..=cw * (1.0 - cfg.margin));
        let cy = rng.random_range(ch * cfg.margin..=ch * (1.0 - cfg.margin));
        WarpParams {
            scale: frac * cw.min(ch) / self.object_extent(),
            rotation_deg,
            tilt_x_deg,
            tilt_y_deg,
            center: Point::new(cx, cy),
        }
    }

    fn fallback_params(&self, canvas: Canvas) -> WarpParams {
        let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
        WarpParams::placement(
            self.config.min_scale * cw.min(ch) / self.object_extent(),
            Point::new(cw * 0.5, ch * 0.5),
        )
    }

    fn object_extent(&self) -> f64 {
        self.object.width().max(self.object.height())
    }

    fn evaluate(&self, canvas: Canvas, params: WarpParams) -> Option<Candidate> {
        if !params.scale.is_finite() || params.scale <= 0.0 {
            return None;
        }
        let transform = warp_homography(self.object, canvas, &params);
        if !transform.is_invertible() {
            return None;
        }
        let corners = Quad::from_rect(self.object).corners;
        if corners.iter().any(|p| transform.weight(*p) <= 0.0) {
            return None;
        }
        let quad = compute_warped_corners(&transform, self.object);
        if !quad.is_convex() || !quad.overlaps(canvas.rect()) {
            return None;
        }
        let inverse = transform.inverse()?;
        Some(Candidate {
            params,
            transform,
            inverse,
            quad,
        })
    }

    fn commit(&mut self, c: Candidate) {
        self.params = c.params;
        self.transform = c.transform;
        self.inverse = c.inverse;
        self.corners = c.quad;
    }
}

impl Warp for ParameterSampler {
    fn transform(&self) -> Homography {
        self.transform
    }

    fn inverse(&self) -> Homography {
        self.inverse
    }

    fn warped_corners(&self) -> Quad {
        self.corners
    }
}

struct Candidate {
    params: WarpParams,
    transform: Homography,
    inverse: Homography,
    quad: Quad,
}

fn object_rect(width: u32, height: u32) -> OneShotResult<Rect> {
    if width == 0 || height == 0 {
        return Err(OneShotError::validation(format!(
            "object dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(Rect::new(0.0, 0.0, f64::from(width), f64::from(height)))
}

/// Build the object-to-canvas homography for `params`.
///
/// Pipeline: centre the object, scale, tilt about x, tilt about y, rotate in-plane, translate to
/// focal distance `f`, project with focal length `f` around `params.center`.
pub(crate) fn warp_homography(object: Rect, canvas: Canvas, params: &WarpParams) -> Homography {
    // Canvas-sized integers keep the untilted case exact.
    let focal = 2.0 * f64::from(canvas.width.max(canvas.height));
    let rot = rotation_zyx(
        params.rotation_deg.to_radians(),
        params.tilt_y_deg.to_radians(),
        params.tilt_x_deg.to_radians(),
    );
    let s = params.scale;
    let (hw, hh) = (object.width() * 0.5, object.height() * 0.5);
    let (ox, oy) = (object.x0 + hw, object.y0 + hh);

    // Columns: scaled x axis, scaled y axis, translation of the object origin.
    let mut m = [[0.0; 3]; 3];
    for i in 0..3 {
        m[i][0] = s * rot[i][0];
        m[i][1] = s * rot[i][1];
        m[i][2] = -s * (rot[i][0] * ox + rot[i][1] * oy);
    }
    m[2][2] += focal;

    let k = Homography([
        [focal, 0.0, params.center.x],
        [0.0, focal, params.center.y],
        [0.0, 0.0, 1.0],
    ]);
    (k * Homography(m)).normalized()
}

fn rotation_zyx(gamma: f64, phi: f64, theta: f64) -> [[f64; 3]; 3] {
    let (sg, cg) = gamma.sin_cos();
    let (sp, cp) = phi.sin_cos();
    let (st, ct) = theta.sin_cos();
    let rz = [[cg, -sg, 0.0], [sg, cg, 0.0], [0.0, 0.0, 1.0]];
    let ry = [[cp, 0.0, sp], [0.0, 1.0, 0.0], [-sp, 0.0, cp]];
    let rx = [[1.0, 0.0, 0.0], [0.0, ct, -st], [0.0, st, ct]];
    mat_mul(&mat_mul(&rz, &ry), &rx)
}

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    (Homography(*a) * Homography(*b)).0
}

#[cfg(test)]
#[path = "../../tests/unit/augment/sampler.rs"]
mod tests;
