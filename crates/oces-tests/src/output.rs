//! Integration tests for output transforms.
//!
//! Exercises descriptors from oces-color end to end on oces-core pixels.

use oces_color::color_space::CIE_XYZ;
use oces_color::{
    ErrorPolicy, OutputEncoding, OutputTransform, PixelTransform, Quantization, Registry,
    TransferFunction, TransformDescriptor,
};
use oces_core::{Pixel, Vec3};

// ── Helpers ────────────────────────────────────────────────────

fn builtin(name: &str) -> OutputTransform {
    Registry::builtin().compile_output(name).unwrap()
}

fn grey(t: &OutputTransform, v: f32) -> Vec3 {
    t.apply(Vec3::splat(v)).unwrap()
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn gamma_26_12_bit_mid_grey() {
    let d = TransformDescriptor::new("scenario", CIE_XYZ, TransferFunction::Gamma(2.6))
        .with_input_primaries(CIE_XYZ)
        .with_rendering_primaries(CIE_XYZ)
        .with_output(OutputEncoding::Quantized(Quantization::full(12)));
    let t = d.compile().unwrap();
    let out = t.apply_pixel(Pixel::new(0.5, 0.5, 0.5, 0.75)).unwrap();
    let expected = (4095.0 * 0.5f32.powf(1.0 / 2.6)).round();
    assert_eq!([out.r, out.g, out.b], [expected; 3]);
    assert_eq!(out.a, 0.75);
}

#[test]
fn saturated_colors_stay_in_range() {
    let t = builtin("rec709_100nits_dim");
    let levels = [-0.5f32, 0.0, 0.01, 0.18, 1.0, 16.0, 500.0];
    for &r in &levels {
        for &g in &levels {
            for &b in &levels {
                let out = t.apply(Vec3::new(r, g, b)).unwrap();
                assert!(
                    out.min_element() >= 0.0 && out.max_element() <= 1.0,
                    "({r}, {g}, {b}) -> {out:?}"
                );
            }
        }
    }
}

// ── Built-in outputs ───────────────────────────────────────────

#[test]
fn srgb_monitor_keeps_neutrals_neutral() {
    let t = builtin("rgbmonitor_100nits_dim");
    for v in [0.01, 0.18, 1.0, 10.0] {
        let out = grey(&t, v);
        assert!((out.x - out.y).abs() < 1e-4, "{v} -> {out:?}");
        assert!((out.z - out.y).abs() < 1e-4, "{v} -> {out:?}");
    }
}

#[test]
fn huge_finite_channel_is_not_rejected() {
    let t = builtin("rgbmonitor_100nits_dim");
    let out = t.apply(Vec3::new(3.0e38, 0.0, 0.0)).unwrap();
    assert!(out.is_finite(), "{out:?}");
    assert!(out.x > 0.99 && out.max_element() <= 1.0, "{out:?}");
}

#[test]
fn srgb_monitor_black_and_white() {
    let t = builtin("rgbmonitor_100nits_dim");
    assert!(grey(&t, 0.0).max_element() < 1e-3);
    assert!(grey(&t, 1.0e5).min_element() > 0.999);
}

#[test]
fn grey_ramp_is_monotonic() {
    for name in ["rgbmonitor_100nits_dim", "rec709_100nits_dim", "p3d60_48nits"] {
        let t = builtin(name);
        let mut prev = 0.0;
        for i in 0..=64 {
            let v = 2f32.powf(i as f32 / 4.0 - 10.0);
            let y = grey(&t, v).y;
            assert!(y >= prev, "{name}: ramp dips at {v}");
            prev = y;
        }
    }
}

#[test]
fn dcdm_emits_12_bit_codes() {
    let t = builtin("dcdm");
    for v in [0.0, 0.02, 0.18, 2.0, 100.0] {
        let out = grey(&t, v);
        for c in out.to_array() {
            assert_eq!(c.fract(), 0.0);
            assert!((0.0..=4095.0).contains(&c));
        }
    }
    // Scene black lands on the first code value (float residue may round up by one).
    assert!(grey(&t, 0.0).max_element() <= 1.0);
    assert_eq!(grey(&t, 1.0e5), Vec3::splat(4095.0));
}

#[test]
fn p3dci_simulates_aces_white() {
    let t = builtin("p3dci_48nits");
    let out = grey(&t, 1.0e5);
    // ACES white is warmer than DCI white: red leads, green trails.
    assert!(out.x > out.z && out.z > out.y, "{out:?}");
    assert!(out.max_element() < 1.0);
}

// ── Buffers ────────────────────────────────────────────────────

#[test]
fn interleaved_buffer_matches_per_pixel() {
    let t = builtin("p3d65_48nits");
    let mut data: Vec<f32> = (0..256)
        .flat_map(|i| {
            let v = i as f32 / 32.0;
            [v, v * 0.7, v * 0.2, 1.0 - i as f32 / 256.0]
        })
        .collect();
    let expected: Vec<Pixel> = Pixel::cast_slice(&data)
        .unwrap()
        .iter()
        .map(|p| t.apply_pixel(*p).unwrap())
        .collect();

    let report = t.process_interleaved(&mut data, ErrorPolicy::Halt).unwrap();
    assert_eq!(report.pixels, 256);
    assert!(report.is_clean());
    assert_eq!(Pixel::cast_slice(&data).unwrap(), expected.as_slice());
}

#[test]
fn substitution_counts_failures() {
    let t = builtin("rec709_100nits_dim");
    let mut pixels = vec![Pixel::rgb(0.18, 0.18, 0.18); 10];
    pixels[3].g = f32::NAN;
    pixels[7].b = f32::INFINITY;
    let sentinel = Pixel::new(1.0, 0.0, 1.0, 1.0);
    let report = t
        .process_buffer(&mut pixels, ErrorPolicy::Substitute(sentinel))
        .unwrap();
    assert_eq!(report.substituted, 2);
    assert_eq!(pixels[3], sentinel);
    assert_eq!(pixels[7], sentinel);
    assert!(pixels[0].is_finite());
}

#[test]
fn compiled_transform_is_shared_across_threads() {
    let t = builtin("rgbmonitor_100nits_dim");
    let reference = grey(&t, 0.18);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| assert_eq!(grey(&t, 0.18), reference));
        }
    });
}
