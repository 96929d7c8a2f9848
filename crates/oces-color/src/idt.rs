//! Input device transforms: camera encodings to ACES.

use oces_core::linalg::{embed, DMat3};
use oces_core::{mult_f3_f44, Mat4, Pixel, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::PixelTransform;
use crate::color_space::{rgb_to_rgb, ChromaticAdaptation, Chromaticities, AP0};
use crate::error::{Result, TransformError};
use crate::transfer;

/// Film density per 10-bit code value.
const CINEON_DENSITY_PER_CODE: f32 = 0.002;
/// Largest 10-bit code value.
const CINEON_CODE_MAX: f32 = 1023.0;

/// How the camera signal is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEncoding {
    Linear,
    /// Power law, decoded as `v^gamma`.
    Gamma(f32),
    /// Printing-density log with 10-bit reference points.
    CineonLog {
        ref_white: f32,
        ref_black: f32,
        neg_gamma: f32,
    },
}

impl InputEncoding {
    /// Kodak reference: white at 685, black at 95, negative gamma 0.6.
    pub const CINEON: Self = Self::CineonLog {
        ref_white: 685.0,
        ref_black: 95.0,
        neg_gamma: 0.6,
    };

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Linear => Ok(()),
            Self::Gamma(g) => {
                if !(g.is_finite() && g > 0.0) {
                    return Err(TransformError::out_of_range("gamma", g));
                }
                Ok(())
            }
            Self::CineonLog {
                ref_white,
                ref_black,
                neg_gamma,
            } => {
                if !(neg_gamma.is_finite() && neg_gamma > 0.0) {
                    return Err(TransformError::out_of_range("negative gamma", neg_gamma));
                }
                if !(ref_black.is_finite() && ref_black >= 0.0 && ref_black < ref_white) {
                    return Err(TransformError::out_of_range("reference black", ref_black));
                }
                if ref_white > CINEON_CODE_MAX {
                    return Err(TransformError::out_of_range("reference white", ref_white));
                }
                Ok(())
            }
        }
    }

    /// Signal (normalized to `[0, 1]`) to linear light.
    pub fn decode(&self, v: f32) -> Result<f32> {
        if !v.is_finite() {
            return Err(TransformError::out_of_range("input channel", v));
        }
        match *self {
            Self::Linear => Ok(v),
            Self::Gamma(g) => transfer::decode(v, g),
            Self::CineonLog {
                ref_white,
                ref_black,
                neg_gamma,
            } => {
                let k = CINEON_DENSITY_PER_CODE / neg_gamma;
                let black = 10f32.powf((ref_black - ref_white) * k);
                let code = v * CINEON_CODE_MAX;
                Ok((10f32.powf((code - ref_white) * k) - black) / (1.0 - black))
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "Linear",
            Self::Gamma(_) => "Gamma",
            Self::CineonLog { .. } => "Cineon",
        }
    }
}

/// Camera RGB to ACES 2065-1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraMatrix {
    /// Row-major matrix, as published by camera vendors.
    Explicit([[f64; 3]; 3]),
    /// Derived from the camera's native primaries.
    Primaries {
        primaries: Chromaticities,
        #[serde(default)]
        adaptation: ChromaticAdaptation,
    },
}

impl CameraMatrix {
    pub const IDENTITY: Self = Self::Explicit([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    fn derive(&self) -> Result<Mat4> {
        match self {
            Self::Explicit(rows) => {
                if rows.iter().flatten().any(|v| !v.is_finite()) {
                    return Err(TransformError::InvalidParameter(
                        "camera matrix has non-finite entries".into(),
                    ));
                }
                Ok(embed(DMat3::from_cols_array_2d(rows).transpose()))
            }
            Self::Primaries {
                primaries,
                adaptation,
            } => {
                if *primaries == AP0 {
                    return Ok(Mat4::IDENTITY);
                }
                Ok(embed(rgb_to_rgb(primaries, &AP0, *adaptation)?))
            }
        }
    }
}

/// Configuration of one input device transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub encoding: InputEncoding,
    pub matrix: CameraMatrix,
    /// Multiplier applied after the matrix, e.g. to normalize an exposure index.
    #[serde(default = "unit_exposure")]
    pub exposure_scale: f32,
}

fn unit_exposure() -> f32 {
    1.0
}

impl InputDescriptor {
    pub fn new(name: impl Into<String>, encoding: InputEncoding, matrix: CameraMatrix) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            encoding,
            matrix,
            exposure_scale: 1.0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_exposure_scale(mut self, scale: f32) -> Self {
        self.exposure_scale = scale;
        self
    }

    pub fn compile(&self) -> Result<InputTransform> {
        InputTransform::new(self)
    }
}

/// A compiled, immutable input transform.
#[derive(Debug, Clone)]
pub struct InputTransform {
    name: String,
    encoding: InputEncoding,
    to_aces: Mat4,
    exposure_scale: f32,
}

impl InputTransform {
    pub fn new(descriptor: &InputDescriptor) -> Result<Self> {
        descriptor.encoding.validate()?;
        let scale = descriptor.exposure_scale;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(TransformError::out_of_range("exposure scale", scale));
        }
        let to_aces = descriptor.matrix.derive()?;

        debug!(
            transform = %descriptor.name,
            encoding = descriptor.encoding.name(),
            "Compiled input transform"
        );

        Ok(Self {
            name: descriptor.name.clone(),
            encoding: descriptor.encoding,
            to_aces,
            exposure_scale: scale,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.to_aces
    }

    /// Decode, convert to ACES primaries and scale.
    pub fn apply(&self, rgb: Vec3) -> Result<Vec3> {
        let linear = Vec3::new(
            self.encoding.decode(rgb.x)?,
            self.encoding.decode(rgb.y)?,
            self.encoding.decode(rgb.z)?,
        );
        Ok(mult_f3_f44(linear, &self.to_aces) * self.exposure_scale)
    }
}

impl PixelTransform for InputTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_pixel(&self, pixel: Pixel) -> Result<Pixel> {
        Ok(pixel.with_triple(self.apply(pixel.triple())?))
    }
}
