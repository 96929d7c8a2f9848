//! Chromaticities, color space presets and RGB↔XYZ transforms.
#![allow(clippy::excessive_precision)]

use oces_core::linalg::{self, embed, DMat3, DVec3};
use oces_core::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};

/// Twice the signed area of the primaries triangle below which the
/// primaries are considered collinear.
const COLLINEAR_EPSILON: f64 = 1e-9;

/// CIE xy coordinates of the red, green and blue primaries and the white point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chromaticities {
    pub red: [f64; 2],
    pub green: [f64; 2],
    pub blue: [f64; 2],
    pub white: [f64; 2],
}

impl Chromaticities {
    pub const fn new(red: [f64; 2], green: [f64; 2], blue: [f64; 2], white: [f64; 2]) -> Self {
        Self {
            red,
            green,
            blue,
            white,
        }
    }

    /// The same primaries with a different white point.
    pub const fn with_white(self, white: [f64; 2]) -> Self {
        Self { white, ..self }
    }

    fn is_finite(&self) -> bool {
        [self.red, self.green, self.blue, self.white]
            .iter()
            .flatten()
            .all(|v| v.is_finite())
    }
}

pub const WHITE_D65: [f64; 2] = [0.3127, 0.3290];
pub const WHITE_ACES: [f64; 2] = [0.32168, 0.33767];
pub const WHITE_DCI: [f64; 2] = [0.3140, 0.3510];
pub const WHITE_E: [f64; 2] = [1.0 / 3.0, 1.0 / 3.0];

pub const AP0: Chromaticities = Chromaticities::new(
    [0.7347, 0.2653],
    [0.0000, 1.0000],
    [0.0001, -0.0770],
    WHITE_ACES,
);
pub const AP1: Chromaticities = Chromaticities::new(
    [0.713, 0.293],
    [0.165, 0.830],
    [0.128, 0.044],
    WHITE_ACES,
);
pub const REC709: Chromaticities =
    Chromaticities::new([0.640, 0.330], [0.300, 0.600], [0.150, 0.060], WHITE_D65);
pub const REC2020: Chromaticities =
    Chromaticities::new([0.708, 0.292], [0.170, 0.797], [0.131, 0.046], WHITE_D65);
pub const P3_DCI: Chromaticities =
    Chromaticities::new([0.680, 0.320], [0.265, 0.690], [0.150, 0.060], WHITE_DCI);
pub const P3_D65: Chromaticities = P3_DCI.with_white(WHITE_D65);
pub const P3_D60: Chromaticities = P3_DCI.with_white(WHITE_ACES);
pub const CIE_XYZ: Chromaticities =
    Chromaticities::new([1.0, 0.0], [0.0, 1.0], [0.0, 0.0], WHITE_E);

/// Named color spaces with fixed chromaticities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSpace {
    /// ACES 2065-1, the OCES primaries.
    Aces2065,
    /// ACEScg, the rendering primaries.
    AcesCg,
    Rec709,
    Rec2020,
    DciP3,
    P3D65,
    P3D60,
    Xyz,
}

impl ColorSpace {
    pub const ALL: [ColorSpace; 8] = [
        Self::Aces2065,
        Self::AcesCg,
        Self::Rec709,
        Self::Rec2020,
        Self::DciP3,
        Self::P3D65,
        Self::P3D60,
        Self::Xyz,
    ];

    pub fn chromaticities(&self) -> Chromaticities {
        match self {
            Self::Aces2065 => AP0,
            Self::AcesCg => AP1,
            Self::Rec709 => REC709,
            Self::Rec2020 => REC2020,
            Self::DciP3 => P3_DCI,
            Self::P3D65 => P3_D65,
            Self::P3D60 => P3_D60,
            Self::Xyz => CIE_XYZ,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Aces2065 => "ACES2065-1",
            Self::AcesCg => "ACEScg",
            Self::Rec709 => "Rec. 709",
            Self::Rec2020 => "Rec. 2020",
            Self::DciP3 => "DCI-P3",
            Self::P3D65 => "P3-D65",
            Self::P3D60 => "P3-D60",
            Self::Xyz => "CIE XYZ",
        }
    }
}

/// How the white point is carried across a primaries change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChromaticAdaptation {
    /// XYZ passes through; the source white lands wherever it lands.
    #[default]
    None,
    /// Bradford von Kries adaptation from the source white to the target white.
    Bradford,
}

/// CIE XYZ (Y = 1) of an xy chromaticity.
pub fn xy_to_xyz(xy: [f64; 2]) -> Result<DVec3> {
    let [x, y] = xy;
    if !x.is_finite() || !y.is_finite() || y == 0.0 {
        return Err(TransformError::InvalidGamut(format!(
            "white point ({x}, {y}) has no luminance"
        )));
    }
    Ok(DVec3::new(x / y, 1.0, (1.0 - x - y) / y))
}

/// Matrix mapping RGB in the given primaries to CIE XYZ, with white at luminance `y`.
pub fn rgb_to_xyz(c: &Chromaticities, y: f64) -> Result<DMat3> {
    if !c.is_finite() || !y.is_finite() || y <= 0.0 {
        return Err(TransformError::InvalidGamut(format!(
            "non-finite chromaticities or luminance scale {y}"
        )));
    }
    let [rx, ry] = c.red;
    let [gx, gy] = c.green;
    let [bx, by] = c.blue;
    let white = xy_to_xyz(c.white)? * y;
    let (x, z) = (white.x, white.z);

    let d = rx * (by - gy) + bx * (gy - ry) + gx * (ry - by);
    if d.abs() < COLLINEAR_EPSILON {
        return Err(TransformError::InvalidGamut(format!(
            "primaries {:?} {:?} {:?} are collinear",
            c.red, c.green, c.blue
        )));
    }

    // Scale of each primary so that R = G = B = 1 reproduces the white.
    let sr = (x * (by - gy) - gx * (y * (by - 1.0) + by * (x + z))
        + bx * (y * (gy - 1.0) + gy * (x + z)))
        / d;
    let sg = (x * (ry - by) + rx * (y * (by - 1.0) + by * (x + z))
        - bx * (y * (ry - 1.0) + ry * (x + z)))
        / d;
    let sb = (x * (gy - ry) - rx * (y * (gy - 1.0) + gy * (x + z))
        + gx * (y * (ry - 1.0) + ry * (x + z)))
        / d;

    Ok(DMat3::from_cols(
        DVec3::new(rx, ry, 1.0 - rx - ry) * sr,
        DVec3::new(gx, gy, 1.0 - gx - gy) * sg,
        DVec3::new(bx, by, 1.0 - bx - by) * sb,
    ))
}

/// Matrix mapping CIE XYZ to RGB in the given primaries (inverse of [`rgb_to_xyz`]).
pub fn xyz_to_rgb(c: &Chromaticities, y: f64) -> Result<DMat3> {
    let m = rgb_to_xyz(c, y)?;
    linalg::invert(m).map_err(|e| TransformError::InvalidGamut(e.to_string()))
}

/// [`rgb_to_xyz`] embedded in a 4x4 matrix for the per-pixel path.
pub fn rgb_to_xyz_f44(c: &Chromaticities, y: f64) -> Result<Mat4> {
    rgb_to_xyz(c, y).map(embed)
}

/// [`xyz_to_rgb`] embedded in a 4x4 matrix for the per-pixel path.
pub fn xyz_to_rgb_f44(c: &Chromaticities, y: f64) -> Result<Mat4> {
    xyz_to_rgb(c, y).map(embed)
}

fn bradford_cone() -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.8951, -0.7502, 0.0389),
        DVec3::new(0.2664, 1.7135, -0.0685),
        DVec3::new(-0.1614, 0.0367, 1.0296),
    )
}

/// Chromatic adaptation matrix (in XYZ) from one white point to another.
pub fn adaptation_matrix(
    from_white: [f64; 2],
    to_white: [f64; 2],
    method: ChromaticAdaptation,
) -> Result<DMat3> {
    match method {
        ChromaticAdaptation::None => Ok(DMat3::IDENTITY),
        ChromaticAdaptation::Bradford => {
            let cone = bradford_cone();
            let src = cone * xy_to_xyz(from_white)?;
            let dst = cone * xy_to_xyz(to_white)?;
            let gain = DMat3::from_diagonal(dst / src);
            let cone_inv = linalg::invert(cone)?;
            Ok(cone_inv * gain * cone)
        }
    }
}

/// RGB→RGB matrix between two sets of primaries via XYZ.
pub fn rgb_to_rgb(
    from: &Chromaticities,
    to: &Chromaticities,
    adaptation: ChromaticAdaptation,
) -> Result<DMat3> {
    let to_xyz = rgb_to_xyz(from, 1.0)?;
    let cat = adaptation_matrix(from.white, to.white, adaptation)?;
    let from_xyz = xyz_to_rgb(to, 1.0)?;
    Ok(from_xyz * cat * to_xyz)
}

/// Convert an RGB pixel from one color space to another via XYZ.
pub fn convert_3x3(
    pixel: [f32; 3],
    from: ColorSpace,
    to: ColorSpace,
    adaptation: ChromaticAdaptation,
) -> Result<[f32; 3]> {
    if from == to {
        return Ok(pixel);
    }
    let m = rgb_to_rgb(&from.chromaticities(), &to.chromaticities(), adaptation)?;
    let v = m * DVec3::new(pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
    Ok([v.x as f32, v.y as f32, v.z as f32])
}

#[cfg(test)]
mod tests {
    use super::*;
    use oces_core::limits::MATRIX_EPSILON;
    use oces_core::linalg::{is_identity, max_abs_diff};
    use proptest::prelude::*;

    #[test]
    fn test_inverse_is_identity_for_all_presets() {
        for space in ColorSpace::ALL {
            let c = space.chromaticities();
            let fwd = rgb_to_xyz(&c, 1.0).unwrap();
            let inv = xyz_to_rgb(&c, 1.0).unwrap();
            assert!(
                is_identity(&(inv * fwd), MATRIX_EPSILON),
                "{} not invertible",
                space.name()
            );
        }
    }

    #[test]
    fn test_f44_matrices_invert() {
        use oces_core::{mult_f3_f44, Vec3};
        let fwd = rgb_to_xyz_f44(&P3_D65, 1.0).unwrap();
        let inv = xyz_to_rgb_f44(&P3_D65, 1.0).unwrap();
        let v = Vec3::new(0.2, 0.7, 0.4);
        let back = mult_f3_f44(mult_f3_f44(v, &fwd), &inv);
        assert!((back - v).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_ap0_matrix() {
        let m = rgb_to_xyz(&AP0, 1.0).unwrap();
        let expected = DMat3::from_cols(
            DVec3::new(0.9525523959, 0.3439664498, 0.0),
            DVec3::new(0.0, 0.7281660966, 0.0),
            DVec3::new(0.0000936786, -0.0721325464, 1.0088251844),
        );
        assert!(max_abs_diff(&m, &expected) < 1e-6);
    }

    #[test]
    fn test_srgb_luminance_row() {
        let m = rgb_to_xyz(&REC709, 1.0).unwrap();
        assert!((m.x_axis.y - 0.2126).abs() < 1e-3);
        assert!((m.y_axis.y - 0.7152).abs() < 1e-3);
        assert!((m.z_axis.y - 0.0722).abs() < 1e-3);
    }

    #[test]
    fn test_xyz_primaries_are_identity() {
        let m = rgb_to_xyz(&CIE_XYZ, 1.0).unwrap();
        assert!(is_identity(&m, 1e-12));
    }

    #[test]
    fn test_white_maps_to_white_point() {
        let m = rgb_to_xyz(&REC709, 100.0).unwrap();
        let xyz = m * DVec3::ONE;
        assert!((xyz.y - 100.0).abs() < 1e-9);
        let sum = xyz.x + xyz.y + xyz.z;
        assert!((xyz.x / sum - 0.3127).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_primaries_rejected() {
        let c = Chromaticities::new([0.2, 0.2], [0.4, 0.4], [0.6, 0.6], WHITE_D65);
        assert!(matches!(
            rgb_to_xyz(&c, 1.0),
            Err(TransformError::InvalidGamut(_))
        ));
        assert!(matches!(
            xyz_to_rgb(&c, 1.0),
            Err(TransformError::InvalidGamut(_))
        ));
    }

    #[test]
    fn test_zero_white_rejected() {
        let c = REC709.with_white([0.3, 0.0]);
        assert!(matches!(
            rgb_to_xyz(&c, 1.0),
            Err(TransformError::InvalidGamut(_))
        ));
    }

    #[test]
    fn test_bradford_maps_white_to_white() {
        let cat = adaptation_matrix(WHITE_ACES, WHITE_D65, ChromaticAdaptation::Bradford).unwrap();
        let src = xy_to_xyz(WHITE_ACES).unwrap();
        let dst = xy_to_xyz(WHITE_D65).unwrap();
        assert!((cat * src - dst).abs().max_element() < 1e-9);
    }

    #[test]
    fn test_same_white_adaptation_is_identity() {
        let cat = adaptation_matrix(WHITE_D65, WHITE_D65, ChromaticAdaptation::Bradford).unwrap();
        assert!(is_identity(&cat, 1e-12));
    }

    #[test]
    fn test_adapted_white_stays_neutral() {
        let m = rgb_to_rgb(&AP1, &REC709, ChromaticAdaptation::Bradford).unwrap();
        let white = m * DVec3::ONE;
        assert!((white - DVec3::ONE).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let pixel = [0.5, 0.3, 0.8];
        let p = convert_3x3(
            pixel,
            ColorSpace::Rec709,
            ColorSpace::Rec2020,
            ChromaticAdaptation::None,
        )
        .unwrap();
        let back = convert_3x3(
            p,
            ColorSpace::Rec2020,
            ColorSpace::Rec709,
            ChromaticAdaptation::None,
        )
        .unwrap();
        for i in 0..3 {
            assert!((back[i] - pixel[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_color_space_names() {
        assert_eq!(ColorSpace::Rec709.name(), "Rec. 709");
        assert_eq!(ColorSpace::AcesCg.name(), "ACEScg");
    }

    /// Twice the signed area of the primaries triangle.
    fn gamut_area(c: &Chromaticities) -> f64 {
        let [r, g, b] = [c.red, c.green, c.blue];
        (g[0] - r[0]) * (b[1] - r[1]) - (b[0] - r[0]) * (g[1] - r[1])
    }

    proptest! {
        #[test]
        fn random_primaries_invert(
            rx in 0.45f64..0.75, ry in 0.25f64..0.35,
            gx in 0.05f64..0.3, gy in 0.5f64..0.85,
            bx in 0.1f64..0.18, by in 0.01f64..0.1,
            wx in 0.30f64..0.34, wy in 0.30f64..0.36,
        ) {
            let c = Chromaticities::new([rx, ry], [gx, gy], [bx, by], [wx, wy]);
            prop_assume!(gamut_area(&c).abs() > 1e-3);
            let fwd = rgb_to_xyz(&c, 1.0).unwrap();
            let inv = xyz_to_rgb(&c, 1.0).unwrap();
            prop_assert!(is_identity(&(inv * fwd), MATRIX_EPSILON));
            prop_assert!(is_identity(&(fwd * inv), MATRIX_EPSILON));
        }
    }
}
