//! Output transform descriptors.
//!
//! A descriptor is plain configuration: it names the primaries at each end of
//! the pipeline and the constants of every stage. Compiling it into an
//! [`OutputTransform`](crate::pipeline::OutputTransform) derives the matrices
//! and validates every parameter.

use serde::{Deserialize, Serialize};

use crate::color_space::{ChromaticAdaptation, Chromaticities, AP0, AP1};
use crate::error::{Result, TransformError};
use crate::gamut::GamutClip;
use crate::pipeline::OutputTransform;
use crate::tonemapping::ToneScale;
use crate::transfer::{OutputEncoding, TransferFunction};

/// Configuration of one output device transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Primaries of the incoming scene-referred data.
    #[serde(default = "default_input")]
    pub input_primaries: Chromaticities,
    /// Primaries the tone scale runs in.
    #[serde(default = "default_rendering")]
    pub rendering_primaries: Chromaticities,
    pub display_primaries: Chromaticities,
    /// White point handling between rendering and display primaries.
    #[serde(default)]
    pub adaptation: ChromaticAdaptation,
    #[serde(default)]
    pub tone: ToneScale,
    #[serde(default)]
    pub clip: GamutClip,
    pub transfer: TransferFunction,
    #[serde(default)]
    pub output: OutputEncoding,
}

fn default_input() -> Chromaticities {
    AP0
}

fn default_rendering() -> Chromaticities {
    AP1
}

impl TransformDescriptor {
    /// OCES in, ACEScg rendering, identity tone scale, unit-cube clip.
    pub fn new(
        name: impl Into<String>,
        display_primaries: Chromaticities,
        transfer: TransferFunction,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_primaries: AP0,
            rendering_primaries: AP1,
            display_primaries,
            adaptation: ChromaticAdaptation::None,
            tone: ToneScale::IDENTITY,
            clip: GamutClip::UNIT_CUBE,
            transfer,
            output: OutputEncoding::Float,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input_primaries(mut self, primaries: Chromaticities) -> Self {
        self.input_primaries = primaries;
        self
    }

    pub fn with_rendering_primaries(mut self, primaries: Chromaticities) -> Self {
        self.rendering_primaries = primaries;
        self
    }

    pub fn with_adaptation(mut self, adaptation: ChromaticAdaptation) -> Self {
        self.adaptation = adaptation;
        self
    }

    pub fn with_tone(mut self, tone: ToneScale) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_clip(mut self, clip: GamutClip) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_output(mut self, output: OutputEncoding) -> Self {
        self.output = output;
        self
    }

    /// Validate by compiling.
    pub fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }

    pub fn compile(&self) -> Result<OutputTransform> {
        OutputTransform::new(self)
    }

    /// Pretty JSON, as written to registry files.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            TransformError::Serialization(format!("Failed to serialize {}: {}", self.name, e))
        })
    }
}
