//! OCES Color - Device transform evaluation
//!
//! Output device transforms take scene-referred OCES data to display code
//! values through a fixed five-stage pipeline; input device transforms take
//! camera encodings to ACES. Both are built from serializable descriptors
//! and kept in a named registry.

pub mod batch;
pub mod color_space;
pub mod descriptor;
pub mod error;
pub mod gamut;
pub mod idt;
pub mod pipeline;
pub mod registry;
pub mod tonemapping;
pub mod transfer;

pub use batch::{BatchReport, ErrorPolicy, PixelTransform};
pub use color_space::{
    adaptation_matrix, convert_3x3, rgb_to_rgb, rgb_to_xyz, rgb_to_xyz_f44, xyz_to_rgb,
    xyz_to_rgb_f44, ChromaticAdaptation, Chromaticities, ColorSpace,
};
pub use descriptor::TransformDescriptor;
pub use error::{Result, TransformError};
pub use gamut::{restore_hue, smart_clip, GamutClip};
pub use idt::{CameraMatrix, InputDescriptor, InputEncoding, InputTransform};
pub use pipeline::{apply, OutputTransform};
pub use registry::{Registry, RegistryFile};
pub use tonemapping::{
    odt_tonescale_fwd, roll_white_fwd, BlackPoint, RollWhite, SegmentedSplineParams, ToneCurve,
    ToneScale,
};
pub use transfer::{decode, encode, OutputEncoding, Quantization, TransferFunction};
