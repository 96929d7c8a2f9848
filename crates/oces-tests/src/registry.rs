//! Integration tests for registry persistence.

use oces_color::color_space::{P3_D65, REC709};
use oces_color::registry::CURRENT_VERSION;
use oces_color::{
    CameraMatrix, ChromaticAdaptation, InputDescriptor, InputEncoding, Registry, RegistryFile,
    TransferFunction, TransformDescriptor, TransformError,
};
use oces_core::Vec3;

// ── Helpers ────────────────────────────────────────────────────

fn custom_output() -> TransformDescriptor {
    TransformDescriptor::new("studio_p3d65_gamma24", P3_D65, TransferFunction::Gamma(2.4))
        .with_description("Grading suite projector")
        .with_adaptation(ChromaticAdaptation::Bradford)
}

fn custom_input() -> InputDescriptor {
    InputDescriptor::new(
        "studio_camera",
        InputEncoding::Gamma(2.2),
        CameraMatrix::Primaries {
            primaries: REC709,
            adaptation: ChromaticAdaptation::Bradford,
        },
    )
    .with_exposure_scale(0.5)
}

// ── Save & load ────────────────────────────────────────────────

#[test]
fn save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");

    let mut registry = Registry::new();
    registry.insert_output(custom_output()).unwrap();
    registry.insert_input(custom_input()).unwrap();
    registry.save_to_file(&path).unwrap();

    let mut loaded = Registry::new();
    loaded.load_from_file(&path).unwrap();
    assert_eq!(loaded.output("studio_p3d65_gamma24").unwrap(), &custom_output());
    assert_eq!(loaded.input("studio_camera").unwrap(), &custom_input());
}

#[test]
fn loaded_file_extends_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extra.json");
    let file = RegistryFile {
        version: CURRENT_VERSION,
        outputs: vec![custom_output()],
        inputs: vec![],
    };
    std::fs::write(&path, file.to_json().unwrap()).unwrap();

    let mut registry = Registry::with_builtins();
    let before = registry.output_names().count();
    registry.load_from_file(&path).unwrap();
    assert_eq!(registry.output_names().count(), before + 1);
    assert!(registry.output("dcdm").is_ok());

    let t = registry.compile_output("studio_p3d65_gamma24").unwrap();
    let out = t.apply(Vec3::splat(0.18)).unwrap();
    assert!((out.x - out.y).abs() < 1e-4);
}

#[test]
fn hand_written_json_uses_defaults() {
    let json = br#"{
        "version": 1,
        "outputs": [{
            "name": "minimal",
            "display_primaries": {
                "red": [0.64, 0.33],
                "green": [0.3, 0.6],
                "blue": [0.15, 0.06],
                "white": [0.3127, 0.329]
            },
            "adaptation": "Bradford",
            "transfer": "Srgb",
            "output": { "Quantized": { "bit_depth": 8, "min_code": 0, "max_code": 255 } }
        }]
    }"#;
    let mut registry = Registry::new();
    registry.merge(RegistryFile::from_json(json).unwrap()).unwrap();
    let t = registry.compile_output("minimal").unwrap();
    let out = t.apply(Vec3::splat(1.0)).unwrap();
    // Identity tone scale: OCES white is display white.
    assert_eq!(out, Vec3::splat(255.0));
}

// ── Failures ───────────────────────────────────────────────────

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::new();
    let err = registry
        .load_from_file(&dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, TransformError::Io(_)));
}

#[test]
fn malformed_json_is_serialization_error() {
    assert!(matches!(
        RegistryFile::from_json(b"{ not json"),
        Err(TransformError::Serialization(_))
    ));
    assert!(matches!(
        RegistryFile::from_json(br#"{ "version": 1, "outputs": [{ "name": 3 }] }"#),
        Err(TransformError::Serialization(_))
    ));
}

#[test]
fn invalid_definition_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    let mut bad = custom_output();
    bad.display_primaries.green = bad.display_primaries.red;
    bad.display_primaries.blue = bad.display_primaries.red;
    let file = RegistryFile {
        version: CURRENT_VERSION,
        outputs: vec![bad],
        inputs: vec![],
    };
    std::fs::write(&path, file.to_json().unwrap()).unwrap();

    let mut registry = Registry::new();
    assert!(matches!(
        registry.load_from_file(&path),
        Err(TransformError::InvalidGamut(_))
    ));
    assert_eq!(registry.output_names().count(), 0);
}
