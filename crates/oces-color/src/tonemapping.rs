//! Tone scale, black-point compensation and highlight rolloff.
//!
//! The forward tone scale maps scene-referred OCES intensity to display
//! luminance. Black-point compensation then fits display luminance into
//! linear code values, and the optional rolloff compresses the top of that
//! range toward a darker white.
#![allow(clippy::excessive_precision)]

use oces_core::limits::LOG_FLOOR;
use oces_core::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::gamut::restore_hue;

/// Knots per half of the segmented spline.
const N_KNOTS: usize = 8;
/// Coefficients per half of the segmented spline.
pub const N_COEFS: usize = N_KNOTS + 2;

/// Tolerance (in log10 units) when checking coefficients against anchors.
const ANCHOR_TOLERANCE: f32 = 1e-3;

/// Quadratic B-spline basis, rows applied to `[t², t, 1]`.
const BASIS: [[f32; 3]; 3] = [[0.5, -1.0, 0.5], [-1.0, 1.0, 0.5], [0.5, 0.0, 0.0]];

/// Segmented quadratic spline in log10-log10 space.
///
/// Below `min_point` and above `max_point` the curve continues linearly (in
/// log-log) with `slope_low` / `slope_high`. Between the anchors the low and
/// high coefficient tables each span eight knots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentedSplineParams {
    pub coefs_low: [f32; N_COEFS],
    pub coefs_high: [f32; N_COEFS],
    pub min_point: [f32; 2],
    pub mid_point: [f32; 2],
    pub max_point: [f32; 2],
    pub slope_low: f32,
    pub slope_high: f32,
}

impl SegmentedSplineParams {
    /// 48 nit cinema rendering, 0.02 nit black.
    pub const ODT_48NITS: Self = Self {
        coefs_low: [
            -1.6989700043,
            -1.6989700043,
            -1.4779000000,
            -1.2291000000,
            -0.8648000000,
            -0.4480000000,
            0.0051800000,
            0.4511080334,
            0.9113744414,
            0.9113744414,
        ],
        coefs_high: [
            0.5154386965,
            0.8470437783,
            1.1358000000,
            1.3802000000,
            1.5197000000,
            1.5985000000,
            1.6467000000,
            1.6746091357,
            1.6878733390,
            1.6878733390,
        ],
        min_point: [0.0028798932, 0.02],
        mid_point: [4.7999999997, 4.8],
        max_point: [1005.7193595080, 48.0],
        slope_low: 0.0,
        slope_high: 0.04,
    };

    /// Check that the curve is monotonic and passes through its anchors.
    pub fn validate(&self) -> Result<()> {
        let anchors = [self.min_point, self.mid_point, self.max_point];
        for p in anchors.iter().flatten() {
            if !p.is_finite() || *p <= 0.0 {
                return Err(TransformError::out_of_range("spline anchor", *p));
            }
        }
        if !(self.min_point[0] < self.mid_point[0] && self.mid_point[0] < self.max_point[0]) {
            return Err(TransformError::InvalidParameter(
                "spline anchors must increase in x".into(),
            ));
        }
        if !(self.min_point[1] < self.mid_point[1] && self.mid_point[1] < self.max_point[1]) {
            return Err(TransformError::InvalidParameter(
                "spline anchors must increase in y".into(),
            ));
        }
        for slope in [self.slope_low, self.slope_high] {
            if !slope.is_finite() || slope < 0.0 {
                return Err(TransformError::out_of_range("spline end slope", slope));
            }
        }
        for coefs in [&self.coefs_low, &self.coefs_high] {
            if coefs.iter().any(|c| !c.is_finite()) || coefs.windows(2).any(|w| w[1] < w[0]) {
                return Err(TransformError::InvalidParameter(
                    "spline coefficients must be finite and non-decreasing".into(),
                ));
            }
        }

        let joins = [
            (knot_value(&self.coefs_low, 0), self.min_point[1]),
            (knot_value(&self.coefs_low, N_KNOTS - 1), self.mid_point[1]),
            (knot_value(&self.coefs_high, 0), self.mid_point[1]),
            (knot_value(&self.coefs_high, N_KNOTS - 1), self.max_point[1]),
        ];
        for (log_y, anchor) in joins {
            if (log_y - anchor.log10()).abs() > ANCHOR_TOLERANCE {
                return Err(TransformError::InvalidParameter(format!(
                    "spline coefficients do not meet anchor {anchor}"
                )));
            }
        }
        Ok(())
    }
}

/// Curve value at knot `k`, the midpoint of two adjacent coefficients.
#[inline]
fn knot_value(coefs: &[f32; N_COEFS], k: usize) -> f32 {
    0.5 * (coefs[k] + coefs[k + 1])
}

#[inline]
fn eval_segment(coefs: &[f32; N_COEFS], knot_coord: f32) -> f32 {
    let j = (knot_coord.max(0.0) as usize).min(N_KNOTS - 1);
    let t = knot_coord - j as f32;
    let cf = [coefs[j], coefs[j + 1], coefs[j + 2]];
    let m = [
        cf[0] * BASIS[0][0] + cf[1] * BASIS[1][0] + cf[2] * BASIS[2][0],
        cf[0] * BASIS[0][1] + cf[1] * BASIS[1][1] + cf[2] * BASIS[2][1],
        cf[0] * BASIS[0][2] + cf[1] * BASIS[1][2] + cf[2] * BASIS[2][2],
    ];
    (m[0] * t + m[1]) * t + m[2]
}

/// Forward ODT tone scale: OCES intensity to display luminance.
///
/// Non-positive input is floored before the logarithm, so scene black maps
/// to the curve's minimum luminance.
pub fn odt_tonescale_fwd(x: f32, c: &SegmentedSplineParams) -> f32 {
    let log_x = x.max(LOG_FLOOR).log10();
    let log_min = c.min_point[0].log10();
    let log_mid = c.mid_point[0].log10();
    let log_max = c.max_point[0].log10();

    let log_y = if log_x <= log_min {
        log_x * c.slope_low + (c.min_point[1].log10() - c.slope_low * log_min)
    } else if log_x < log_mid {
        let knot_coord = (N_KNOTS - 1) as f32 * (log_x - log_min) / (log_mid - log_min);
        eval_segment(&c.coefs_low, knot_coord)
    } else if log_x < log_max {
        let knot_coord = (N_KNOTS - 1) as f32 * (log_x - log_mid) / (log_max - log_mid);
        eval_segment(&c.coefs_high, knot_coord)
    } else {
        log_x * c.slope_high + (c.max_point[1].log10() - c.slope_high * log_max)
    };
    10f32.powf(log_y)
}

/// Per-channel tone curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ToneCurve {
    /// Identity; for transforms fed display-linear data.
    Linear,
    SegmentedSpline(SegmentedSplineParams),
}

impl ToneCurve {
    #[inline]
    pub fn forward(&self, x: f32) -> f32 {
        match self {
            Self::Linear => x,
            Self::SegmentedSpline(params) => odt_tonescale_fwd(x, params),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Linear => Ok(()),
            Self::SegmentedSpline(params) => params.validate(),
        }
    }
}

/// Highlight rolloff toward `white`.
///
/// Inputs up to `1 - width` pass through; the top `width` of the range bends
/// quadratically so that 1.0 lands on `white`; anything above plateaus there.
/// Monotonic as long as `width >= 2 * (1 - white)`.
pub fn roll_white_fwd(x: f32, white: f32, width: f32) -> f32 {
    let x0 = -1.0;
    let x1 = x0 + width;
    let y0 = -white;
    let y1 = x1;
    let m1 = x1 - x0;
    let a = y0 - y1 + m1;
    let b = 2.0 * (y1 - y0) - m1;
    let c = y0;
    let t = (-x - x0) / (x1 - x0);
    let rolled = if t < 0.0 {
        -(t * b + c)
    } else if t > 1.0 {
        x
    } else {
        -((t * a + b) * t + c)
    };
    rolled.min(white)
}

/// Rolloff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollWhite {
    /// Where 1.0 lands after the rolloff.
    pub white: f32,
    /// Width of the transition below 1.0.
    pub width: f32,
}

impl RollWhite {
    pub fn new(white: f32, width: f32) -> Result<Self> {
        let roll = Self { white, width };
        roll.validate()?;
        Ok(roll)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.width <= 1.0) {
            return Err(TransformError::out_of_range("rolloff width", self.width));
        }
        if !(self.white > 0.0 && self.white <= 1.0) {
            return Err(TransformError::out_of_range("rolloff white", self.white));
        }
        if self.width < 2.0 * (1.0 - self.white) {
            return Err(TransformError::InvalidParameter(format!(
                "rolloff width {} too narrow for white {}",
                self.width, self.white
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        roll_white_fwd(x, self.white, self.width)
    }
}

/// Two-point affine fit from `[min_exposure, max_exposure]` to `[black_out, white_out]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackPoint {
    pub min_exposure: f32,
    pub max_exposure: f32,
    pub black_out: f32,
    pub white_out: f32,
}

impl BlackPoint {
    pub const IDENTITY: Self = Self {
        min_exposure: 0.0,
        max_exposure: 1.0,
        black_out: 0.0,
        white_out: 1.0,
    };

    /// Display luminance `[black, white]` in nits to linear code values `[0, 1]`.
    pub const fn luminance(black: f32, white: f32) -> Self {
        Self {
            min_exposure: black,
            max_exposure: white,
            black_out: 0.0,
            white_out: 1.0,
        }
    }

    /// Scale and offset of the fit.
    pub fn coefficients(&self) -> Result<(f32, f32)> {
        let values = [
            self.min_exposure,
            self.max_exposure,
            self.black_out,
            self.white_out,
        ];
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(TransformError::out_of_range("black point", *v));
        }
        let span = self.max_exposure - self.min_exposure;
        if span <= 0.0 {
            return Err(TransformError::out_of_range("exposure span", span));
        }
        let scale = (self.white_out - self.black_out) / span;
        let offset = self.black_out - self.min_exposure * scale;
        Ok((scale, offset))
    }
}

impl Default for BlackPoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Stage two configuration: everything between rendering and display primaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneScale {
    pub curve: ToneCurve,
    /// Restore the pre-curve hue after per-channel tone mapping.
    #[serde(default)]
    pub restore_hue: bool,
    #[serde(default)]
    pub black_point: BlackPoint,
    #[serde(default)]
    pub roll_white: Option<RollWhite>,
    /// Applied after the rolloff.
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl ToneScale {
    pub const IDENTITY: Self = Self {
        curve: ToneCurve::Linear,
        restore_hue: false,
        black_point: BlackPoint::IDENTITY,
        roll_white: None,
        scale: 1.0,
    };

    pub(crate) fn compile(&self) -> Result<ToneStage> {
        self.curve.validate()?;
        if let Some(roll) = &self.roll_white {
            roll.validate()?;
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(TransformError::out_of_range("scale factor", self.scale));
        }
        let (bpc_scale, bpc_offset) = self.black_point.coefficients()?;
        Ok(ToneStage {
            curve: self.curve,
            restore_hue: self.restore_hue,
            bpc_scale,
            bpc_offset,
            roll_white: self.roll_white,
            scale: self.scale,
        })
    }
}

impl Default for ToneScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Validated stage two, ready for per-pixel use.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ToneStage {
    curve: ToneCurve,
    restore_hue: bool,
    bpc_scale: f32,
    bpc_offset: f32,
    roll_white: Option<RollWhite>,
    scale: f32,
}

impl ToneStage {
    pub(crate) fn apply(&self, rgb: Vec3) -> Vec3 {
        let mut out = Vec3::new(
            self.curve.forward(rgb.x),
            self.curve.forward(rgb.y),
            self.curve.forward(rgb.z),
        );
        if self.restore_hue {
            out = restore_hue(rgb, out);
        }
        out = out * self.bpc_scale + Vec3::splat(self.bpc_offset);
        if let Some(roll) = &self.roll_white {
            out = Vec3::new(roll.apply(out.x), roll.apply(out.y), roll.apply(out.z));
        }
        out * self.scale
    }
}
