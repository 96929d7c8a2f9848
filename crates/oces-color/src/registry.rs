//! Named transform registry with versioned JSON persistence.
//!
//! The built-in set is constructed once per process and is read-only. User
//! registries start from it (or from nothing), merge in files, and can be
//! written back out.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::color_space::{
    ChromaticAdaptation, AP1, CIE_XYZ, P3_D60, P3_D65, P3_DCI, REC2020, REC709,
};
use crate::descriptor::TransformDescriptor;
use crate::error::{Result, TransformError};
use crate::gamut::GamutClip;
use crate::idt::{CameraMatrix, InputDescriptor, InputEncoding, InputTransform};
use crate::pipeline::OutputTransform;
use crate::tonemapping::{BlackPoint, RollWhite, SegmentedSplineParams, ToneCurve, ToneScale};
use crate::transfer::{OutputEncoding, Quantization, TransferFunction};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Cinema black and white luminance, in nits.
const CINEMA_BLACK: f32 = 0.02;
const CINEMA_WHITE: f32 = 48.0;
/// Peak luminance of the DCDM encoding, in nits.
const DCDM_PEAK: f32 = 52.37;

/// Versioned registry file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryFile {
    /// Schema version for migration.
    pub version: u32,
    #[serde(default)]
    pub outputs: Vec<TransformDescriptor>,
    #[serde(default)]
    pub inputs: Vec<InputDescriptor>,
}

impl RegistryFile {
    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| {
            TransformError::Serialization(format!("Failed to serialize registry: {}", e))
        })
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| TransformError::Serialization(format!("Invalid JSON: {}", e)))?;

        // A missing version marks a v0 file; anything else must be an integer.
        let version = match raw.get("version") {
            None => 0,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    TransformError::Serialization(format!("Invalid registry version: {}", v))
                })?,
        };
        if version > CURRENT_VERSION {
            return Err(TransformError::Serialization(format!(
                "Registry file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;
        serde_json::from_value(migrated)
            .map_err(|e| TransformError::Serialization(format!("Failed to parse registry: {}", e)))
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;
    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 was a bare array of output descriptors.
                if data.is_array() {
                    data = serde_json::json!({
                        "version": 1,
                        "outputs": data,
                        "inputs": [],
                    });
                } else if let Some(obj) = data.as_object_mut() {
                    obj.insert("version".into(), serde_json::json!(1));
                }
                version = 1;
            }
            _ => {
                return Err(TransformError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }
    Ok(data)
}

/// Named output and input transforms.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    outputs: BTreeMap<String, TransformDescriptor>,
    inputs: BTreeMap<String, InputDescriptor>,
}

static BUILTIN: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared built-in registry.
    pub fn builtin() -> &'static Registry {
        BUILTIN.get_or_init(|| {
            let mut registry = Registry::new();
            for d in builtin_outputs() {
                registry.outputs.insert(d.name.clone(), d);
            }
            for d in builtin_inputs() {
                registry.inputs.insert(d.name.clone(), d);
            }
            info!(
                outputs = registry.outputs.len(),
                inputs = registry.inputs.len(),
                "Built-in transform registry ready"
            );
            registry
        })
    }

    /// A mutable copy of the built-in set.
    pub fn with_builtins() -> Self {
        Self::builtin().clone()
    }

    pub fn output(&self, name: &str) -> Result<&TransformDescriptor> {
        self.outputs
            .get(name)
            .ok_or_else(|| TransformError::UnknownTransform(name.to_string()))
    }

    pub fn input(&self, name: &str) -> Result<&InputDescriptor> {
        self.inputs
            .get(name)
            .ok_or_else(|| TransformError::UnknownTransform(name.to_string()))
    }

    /// Look up and compile an output transform.
    pub fn compile_output(&self, name: &str) -> Result<OutputTransform> {
        self.output(name)?.compile()
    }

    /// Look up and compile an input transform.
    pub fn compile_input(&self, name: &str) -> Result<InputTransform> {
        self.input(name)?.compile()
    }

    /// Output transform names, sorted.
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    /// Input transform names, sorted.
    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &TransformDescriptor> {
        self.outputs.values()
    }

    pub fn inputs(&self) -> impl Iterator<Item = &InputDescriptor> {
        self.inputs.values()
    }

    /// Add or replace an output transform after validating it.
    pub fn insert_output(&mut self, descriptor: TransformDescriptor) -> Result<()> {
        descriptor.validate()?;
        self.outputs.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Add or replace an input transform after validating it.
    pub fn insert_input(&mut self, descriptor: InputDescriptor) -> Result<()> {
        descriptor.compile()?;
        self.inputs.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Add every entry of `file`, replacing entries with the same name.
    ///
    /// Nothing is added unless every entry validates.
    pub fn merge(&mut self, file: RegistryFile) -> Result<()> {
        for d in &file.outputs {
            d.validate()?;
        }
        for d in &file.inputs {
            d.compile()?;
        }
        let (outputs, inputs) = (file.outputs.len(), file.inputs.len());
        self.outputs
            .extend(file.outputs.into_iter().map(|d| (d.name.clone(), d)));
        self.inputs
            .extend(file.inputs.into_iter().map(|d| (d.name.clone(), d)));
        info!(outputs, inputs, "Merged transform definitions");
        Ok(())
    }

    /// Snapshot as a file at the current version.
    pub fn to_file(&self) -> RegistryFile {
        RegistryFile {
            version: CURRENT_VERSION,
            outputs: self.outputs.values().cloned().collect(),
            inputs: self.inputs.values().cloned().collect(),
        }
    }

    /// Save to a file path.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_file().to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Load a file path and merge it into this registry.
    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let data = std::fs::read(path)?;
        let file = RegistryFile::from_json(&data)?;
        info!(path = %path.display(), version = file.version, "Loading registry file");
        self.merge(file)
    }
}

/// Tone scale shared by the cinema-referred outputs: 48 nit spline, then
/// cinema black/white fit into `[0, 1]`.
fn cinema_tone() -> ToneScale {
    ToneScale {
        curve: ToneCurve::SegmentedSpline(SegmentedSplineParams::ODT_48NITS),
        restore_hue: false,
        black_point: BlackPoint::luminance(CINEMA_BLACK, CINEMA_WHITE),
        roll_white: None,
        scale: 1.0,
    }
}

fn builtin_outputs() -> Vec<TransformDescriptor> {
    let bt1886 = TransferFunction::Bt1886 {
        gamma: 2.4,
        lw: 1.0,
        lb: 0.0,
    };
    vec![
        TransformDescriptor::new("rgbmonitor_100nits_dim", REC709, TransferFunction::Srgb)
            .with_description("sRGB monitor, D65, 100 nits")
            .with_adaptation(ChromaticAdaptation::Bradford)
            .with_tone(cinema_tone()),
        TransformDescriptor::new("rec709_100nits_dim", REC709, bt1886)
            .with_description("Rec. 709 broadcast monitor, BT.1886, 100 nits")
            .with_adaptation(ChromaticAdaptation::Bradford)
            .with_tone(cinema_tone()),
        TransformDescriptor::new("rec709_d60sim_100nits_dim", REC709, bt1886)
            .with_description("Rec. 709 monitor simulating an ACES white")
            .with_tone(ToneScale {
                scale: 0.955,
                ..cinema_tone()
            }),
        TransformDescriptor::new("rec2020_100nits_dim", REC2020, bt1886)
            .with_description("Rec. 2020 monitor, BT.1886, 100 nits")
            .with_adaptation(ChromaticAdaptation::Bradford)
            .with_tone(cinema_tone()),
        TransformDescriptor::new("p3dci_48nits", P3_DCI, TransferFunction::Gamma(2.6))
            .with_description("DCI-P3 projector, D60 white simulated inside the DCI white")
            .with_tone(ToneScale {
                roll_white: Some(RollWhite {
                    white: 0.918,
                    width: 0.5,
                }),
                scale: 0.96,
                ..cinema_tone()
            }),
        TransformDescriptor::new("p3d60_48nits", P3_D60, TransferFunction::Gamma(2.6))
            .with_description("P3 projector calibrated to the ACES white")
            .with_tone(cinema_tone()),
        TransformDescriptor::new("p3d65_48nits", P3_D65, TransferFunction::Gamma(2.6))
            .with_description("P3 projector calibrated to D65")
            .with_adaptation(ChromaticAdaptation::Bradford)
            .with_tone(cinema_tone()),
        TransformDescriptor::new("dcdm", CIE_XYZ, TransferFunction::Gamma(2.6))
            .with_description("Digital cinema distribution master, 12-bit X'Y'Z'")
            .with_tone(ToneScale {
                scale: CINEMA_WHITE / DCDM_PEAK,
                ..cinema_tone()
            })
            .with_clip(GamutClip::PLAIN)
            .with_output(OutputEncoding::Quantized(Quantization::full(12))),
    ]
}

fn builtin_inputs() -> Vec<InputDescriptor> {
    vec![
        InputDescriptor::new("aces2065_linear", InputEncoding::Linear, CameraMatrix::IDENTITY)
            .with_description("Linear ACES 2065-1, unchanged"),
        InputDescriptor::new(
            "acescg_linear",
            InputEncoding::Linear,
            CameraMatrix::Primaries {
                primaries: AP1,
                adaptation: ChromaticAdaptation::None,
            },
        )
        .with_description("Linear ACEScg"),
        InputDescriptor::new(
            "rec709_gamma24",
            InputEncoding::Gamma(2.4),
            CameraMatrix::Primaries {
                primaries: REC709,
                adaptation: ChromaticAdaptation::Bradford,
            },
        )
        .with_description("Display-referred Rec. 709 video"),
        InputDescriptor::new(
            "cineon_rec709",
            InputEncoding::CINEON,
            CameraMatrix::Primaries {
                primaries: REC709,
                adaptation: ChromaticAdaptation::Bradford,
            },
        )
        .with_description("Cineon log scans with Rec. 709 primaries"),
    ]
}
