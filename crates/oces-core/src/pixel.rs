//! RGBA pixels and interleaved float buffers.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::linalg::Vec3;

/// Channels per interleaved pixel.
pub const CHANNELS: usize = 4;

/// RGBA pixel with 32-bit float components.
///
/// Color channels are transformed; alpha is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Pixel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Pixel {
    /// Create a new pixel from RGBA components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a pixel from RGB with alpha = 1.0.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a pixel from a color triple and an alpha value.
    #[inline]
    pub fn from_triple(rgb: Vec3, a: f32) -> Self {
        Self {
            r: rgb.x,
            g: rgb.y,
            b: rgb.z,
            a,
        }
    }

    /// The color triple, without alpha.
    #[inline]
    pub fn triple(self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Replace the color channels, keeping alpha.
    #[inline]
    pub fn with_triple(self, rgb: Vec3) -> Self {
        Self::from_triple(rgb, self.a)
    }

    /// Whether every channel is finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// View an interleaved RGBA float slice as pixels.
    pub fn cast_slice(data: &[f32]) -> Result<&[Pixel]> {
        if data.len() % CHANNELS != 0 {
            return Err(CoreError::BufferLayout {
                len: data.len(),
                channels: CHANNELS,
            });
        }
        Ok(bytemuck::cast_slice(data))
    }

    /// Mutable view of an interleaved RGBA float slice as pixels.
    pub fn cast_slice_mut(data: &mut [f32]) -> Result<&mut [Pixel]> {
        if data.len() % CHANNELS != 0 {
            return Err(CoreError::BufferLayout {
                len: data.len(),
                channels: CHANNELS,
            });
        }
        Ok(bytemuck::cast_slice_mut(data))
    }

    // Common pixels
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

impl From<[f32; 4]> for Pixel {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Pixel> for [f32; 4] {
    fn from(p: Pixel) -> Self {
        [p.r, p.g, p.b, p.a]
    }
}
