//! Transfer functions and code-value quantization.
#![allow(clippy::excessive_precision)]

use oces_core::limits::MAX_BIT_DEPTH;
use oces_core::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Pure power-law encode, `x^(1/gamma)`.
///
/// Negative and NaN input is rejected rather than producing NaN, as is a
/// gamma that is not a positive finite number.
pub fn encode(x: f32, gamma: f32) -> Result<f32> {
    check_gamma(gamma)?;
    check_linear(x)?;
    Ok(x.powf(1.0 / gamma))
}

/// Pure power-law decode, `v^gamma`.
pub fn decode(v: f32, gamma: f32) -> Result<f32> {
    check_gamma(gamma)?;
    check_code(v)?;
    Ok(v.powf(gamma))
}

#[inline]
fn check_linear(x: f32) -> Result<()> {
    if x.is_nan() || x < 0.0 {
        return Err(TransformError::out_of_range("linear value", x));
    }
    Ok(())
}

#[inline]
fn check_code(v: f32) -> Result<()> {
    if v.is_nan() || v < 0.0 {
        return Err(TransformError::out_of_range("encoded value", v));
    }
    Ok(())
}

/// Transfer function from display-linear light to signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransferFunction {
    Linear,
    Gamma(f32),
    /// Inverse of the BT.1886 EOTF for a display with white `lw` and black `lb`.
    Bt1886 { gamma: f32, lw: f32, lb: f32 },
    /// IEC 61966-2-1 piecewise curve.
    Srgb,
}

impl TransferFunction {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Linear | Self::Srgb => Ok(()),
            Self::Gamma(g) => check_gamma(g),
            Self::Bt1886 { gamma, lw, lb } => {
                check_gamma(gamma)?;
                if !(lb.is_finite() && lb >= 0.0) {
                    return Err(TransformError::out_of_range("black luminance", lb));
                }
                if !(lw.is_finite() && lw > lb) {
                    return Err(TransformError::out_of_range("white luminance", lw));
                }
                Ok(())
            }
        }
    }

    /// Linear light to signal.
    pub fn encode(&self, x: f32) -> Result<f32> {
        check_linear(x)?;
        Ok(match *self {
            Self::Linear => x,
            Self::Gamma(g) => x.powf(1.0 / g),
            Self::Bt1886 { gamma, lw, lb } => {
                let (a, b) = bt1886_coefs(gamma, lw, lb);
                (x / a).powf(1.0 / gamma) - b
            }
            Self::Srgb => {
                if x <= 0.0031308 {
                    x * 12.92
                } else {
                    1.055 * x.powf(1.0 / 2.4) - 0.055
                }
            }
        })
    }

    /// Signal to linear light.
    pub fn decode(&self, v: f32) -> Result<f32> {
        check_code(v)?;
        Ok(match *self {
            Self::Linear => v,
            Self::Gamma(g) => v.powf(g),
            Self::Bt1886 { gamma, lw, lb } => {
                let (a, b) = bt1886_coefs(gamma, lw, lb);
                a * (v + b).max(0.0).powf(gamma)
            }
            Self::Srgb => {
                if v <= 0.04045 {
                    v / 12.92
                } else {
                    ((v + 0.055) / 1.055).powf(2.4)
                }
            }
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "Linear",
            Self::Gamma(_) => "Gamma",
            Self::Bt1886 { .. } => "BT.1886",
            Self::Srgb => "sRGB",
        }
    }
}

fn check_gamma(g: f32) -> Result<()> {
    if !(g.is_finite() && g > 0.0) {
        return Err(TransformError::out_of_range("gamma", g));
    }
    Ok(())
}

const fn max_code_for(bit_depth: u32) -> u32 {
    match 1u32.checked_shl(bit_depth) {
        Some(v) => v - 1,
        None => u32::MAX,
    }
}

/// Gain and black lift of the BT.1886 EOTF.
fn bt1886_coefs(gamma: f32, lw: f32, lb: f32) -> (f32, f32) {
    let w = lw.powf(1.0 / gamma);
    let k = lb.powf(1.0 / gamma);
    ((w - k).powf(gamma), k / (w - k))
}

/// Integer code-value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantization {
    pub bit_depth: u32,
    pub min_code: u32,
    pub max_code: u32,
}

impl Quantization {
    /// Full range at the given depth.
    ///
    /// Depths of 32 bits and above saturate to `u32::MAX` instead of
    /// overflowing; [`Self::validate`] rejects them.
    pub const fn full(bit_depth: u32) -> Self {
        Self {
            bit_depth,
            min_code: 0,
            max_code: max_code_for(bit_depth),
        }
    }

    /// Largest code value representable at this depth.
    pub fn code_max(&self) -> f32 {
        max_code_for(self.bit_depth) as f32
    }

    pub fn validate(&self) -> Result<()> {
        if self.bit_depth == 0 || self.bit_depth > MAX_BIT_DEPTH {
            return Err(TransformError::out_of_range(
                "bit depth",
                self.bit_depth as f32,
            ));
        }
        if self.min_code > self.max_code || self.max_code as f32 > self.code_max() {
            return Err(TransformError::InvalidParameter(format!(
                "code range [{}, {}] does not fit {} bits",
                self.min_code, self.max_code, self.bit_depth
            )));
        }
        Ok(())
    }

    /// Scale an encoded `[0, 1]` value to a code value, round and clamp.
    #[inline]
    pub fn quantize(&self, v: f32) -> f32 {
        (v * self.code_max())
            .round()
            .clamp(self.min_code as f32, self.max_code as f32)
    }
}

/// What the pipeline hands back after encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputEncoding {
    /// Encoded signal as-is.
    #[default]
    Float,
    /// Integer code values (stored as floats).
    Quantized(Quantization),
    /// Code values divided by the maximum code value, for hosts that expect
    /// float output but must see the quantization steps.
    Normalized(Quantization),
}

impl OutputEncoding {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Float => Ok(()),
            Self::Quantized(q) | Self::Normalized(q) => q.validate(),
        }
    }

    #[inline]
    pub fn apply(&self, v: f32) -> f32 {
        match self {
            Self::Float => v,
            Self::Quantized(q) => q.quantize(v),
            Self::Normalized(q) => q.quantize(v) / q.code_max(),
        }
    }
}

/// Stage five: transfer encode plus output adapter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Encoder {
    pub(crate) transfer: TransferFunction,
    pub(crate) output: OutputEncoding,
}

impl Encoder {
    pub(crate) fn new(transfer: TransferFunction, output: OutputEncoding) -> Result<Self> {
        transfer.validate()?;
        output.validate()?;
        Ok(Self { transfer, output })
    }

    pub(crate) fn apply(&self, rgb: Vec3) -> Result<Vec3> {
        let channel = |x: f32| -> Result<f32> { Ok(self.output.apply(self.transfer.encode(x)?)) };
        Ok(Vec3::new(channel(rgb.x)?, channel(rgb.y)?, channel(rgb.z)?))
    }
}
