//! Output transform pipeline: OCES to display code values.
//!
//! Every output transform runs the same five stages in the same order:
//!
//! 1. input → rendering primaries (matrix)
//! 2. tone scale, black-point compensation, rolloff, scale
//! 3. rendering → display primaries (matrix, optional adaptation)
//! 4. gamut clip with hue restoration
//! 5. transfer encode and optional quantization
//!
//! A descriptor only changes the constants of each stage.

use oces_core::linalg::{embed, DMat3};
use oces_core::{mult_f3_f44, Mat4, Pixel, Vec3};
use tracing::debug;

use crate::batch::PixelTransform;
use crate::color_space::{rgb_to_rgb, ChromaticAdaptation, Chromaticities};
use crate::descriptor::TransformDescriptor;
use crate::error::{Result, TransformError};
use crate::gamut::GamutClip;
use crate::tonemapping::ToneStage;
use crate::transfer::Encoder;

/// A compiled, immutable output transform.
#[derive(Debug, Clone)]
pub struct OutputTransform {
    name: String,
    to_rendering: Mat4,
    tone: ToneStage,
    to_display: Mat4,
    clip: GamutClip,
    encoder: Encoder,
}

/// Matrix between two sets of primaries; identical primaries give an exact identity.
fn stage_matrix(
    from: &Chromaticities,
    to: &Chromaticities,
    adaptation: ChromaticAdaptation,
) -> Result<Mat4> {
    if from == to {
        return Ok(Mat4::IDENTITY);
    }
    let m: DMat3 = rgb_to_rgb(from, to, adaptation)?;
    Ok(embed(m))
}

impl OutputTransform {
    pub fn new(descriptor: &TransformDescriptor) -> Result<Self> {
        let to_rendering = stage_matrix(
            &descriptor.input_primaries,
            &descriptor.rendering_primaries,
            ChromaticAdaptation::None,
        )?;
        let tone = descriptor.tone.compile()?;
        let to_display = stage_matrix(
            &descriptor.rendering_primaries,
            &descriptor.display_primaries,
            descriptor.adaptation,
        )?;
        descriptor.clip.validate()?;
        let encoder = Encoder::new(descriptor.transfer, descriptor.output)?;

        debug!(
            transform = %descriptor.name,
            transfer = descriptor.transfer.name(),
            adaptation = ?descriptor.adaptation,
            "Compiled output transform"
        );

        Ok(Self {
            name: descriptor.name.clone(),
            to_rendering,
            tone,
            to_display,
            clip: descriptor.clip,
            encoder,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage one matrix.
    pub fn rendering_matrix(&self) -> &Mat4 {
        &self.to_rendering
    }

    /// Stage three matrix.
    pub fn display_matrix(&self) -> &Mat4 {
        &self.to_display
    }

    /// Run the five stages on one color triple.
    ///
    /// Non-finite input fails with `OutOfRange`, as does any value the
    /// transfer function cannot encode.
    pub fn apply(&self, rgb: Vec3) -> Result<Vec3> {
        if let Some(bad) = rgb.to_array().into_iter().find(|v| !v.is_finite()) {
            return Err(TransformError::out_of_range("input channel", bad));
        }
        let rendering = mult_f3_f44(rgb, &self.to_rendering);
        let toned = self.tone.apply(rendering);
        let display = mult_f3_f44(toned, &self.to_display);
        let clipped = self.clip.apply(display);
        self.encoder.apply(clipped)
    }
}

impl PixelTransform for OutputTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_pixel(&self, pixel: Pixel) -> Result<Pixel> {
        Ok(pixel.with_triple(self.apply(pixel.triple())?))
    }
}

/// Compile `descriptor` and evaluate a single triple.
///
/// For more than a handful of pixels compile once with
/// [`OutputTransform::new`] instead.
pub fn apply(descriptor: &TransformDescriptor, rgb: Vec3) -> Result<Vec3> {
    OutputTransform::new(descriptor)?.apply(rgb)
}
