//! Integration tests for input transforms, alone and chained into outputs.

use oces_color::color_space::AP1;
use oces_color::{ErrorPolicy, InputTransform, PixelTransform, Registry, TransformError};
use oces_core::{Pixel, Vec3};

// ── Helpers ────────────────────────────────────────────────────

fn builtin(name: &str) -> InputTransform {
    Registry::builtin().compile_input(name).unwrap()
}

fn close(a: Vec3, b: Vec3, eps: f32) -> bool {
    (a - b).abs().max_element() < eps
}

// ── Built-in inputs ────────────────────────────────────────────

#[test]
fn aces_linear_is_exact_passthrough() {
    let t = builtin("aces2065_linear");
    let v = Vec3::new(-0.01, 0.18, 42.0);
    assert_eq!(t.apply(v).unwrap(), v);
}

#[test]
fn display_white_decodes_to_aces_white() {
    for name in ["rec709_gamma24", "acescg_linear"] {
        let out = builtin(name).apply(Vec3::ONE).unwrap();
        assert!(close(out, Vec3::ONE, 1e-5), "{name}: {out:?}");
    }
}

#[test]
fn cineon_reference_white_is_unity() {
    let code = 685.0 / 1023.0;
    let out = builtin("cineon_rec709").apply(Vec3::splat(code)).unwrap();
    assert!(close(out, Vec3::ONE, 1e-4), "{out:?}");
}

#[test]
fn gamma_input_rejects_negative_code_values() {
    let err = builtin("rec709_gamma24")
        .apply(Vec3::new(0.5, -0.1, 0.5))
        .unwrap_err();
    assert!(matches!(err, TransformError::OutOfRange { .. }));
}

#[test]
fn input_buffer_keeps_alpha() {
    let t = builtin("cineon_rec709");
    let mut pixels: Vec<Pixel> = (0..64)
        .map(|i| Pixel::new(0.3, 0.4, 0.5, i as f32 / 64.0))
        .collect();
    let report = t.process_buffer(&mut pixels, ErrorPolicy::Halt).unwrap();
    assert!(report.is_clean());
    for (i, p) in pixels.iter().enumerate() {
        assert_eq!(p.a, i as f32 / 64.0);
    }
}

// ── Input → output chains ──────────────────────────────────────

#[test]
fn acescg_idt_chains_into_odt() {
    let registry = Registry::builtin();
    let idt = builtin("acescg_linear");
    let odt = registry.compile_output("p3d60_48nits").unwrap();

    // Same output transform, but fed ACEScg directly.
    let direct = registry
        .output("p3d60_48nits")
        .unwrap()
        .clone()
        .with_input_primaries(AP1)
        .compile()
        .unwrap();

    for rgb in [
        Vec3::new(0.18, 0.18, 0.18),
        Vec3::new(0.5, 0.1, 0.05),
        Vec3::new(0.02, 0.3, 0.9),
    ] {
        let chained = odt.apply(idt.apply(rgb).unwrap()).unwrap();
        let expected = direct.apply(rgb).unwrap();
        assert!(close(chained, expected, 1e-3), "{rgb:?}: {chained:?} vs {expected:?}");
    }
}
