//! Buffer evaluation shared by output and input transforms.

use oces_core::Pixel;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// What to do when a pixel fails to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Stop at the failure and return its error. Pixels already written stay
    /// written.
    #[default]
    Halt,
    /// Write the sentinel's color (keeping the pixel's alpha) and continue.
    Substitute(Pixel),
}

/// Outcome of a buffer evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub pixels: usize,
    pub substituted: usize,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.substituted == 0
    }
}

/// A compiled per-pixel transform.
///
/// Implementors are immutable once built, so buffers are evaluated across
/// rayon workers without locking.
pub trait PixelTransform: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Transform one pixel; alpha passes through.
    fn apply_pixel(&self, pixel: Pixel) -> Result<Pixel>;

    /// Transform a buffer in place.
    fn process_buffer(&self, pixels: &mut [Pixel], policy: ErrorPolicy) -> Result<BatchReport> {
        let substituted = match policy {
            ErrorPolicy::Halt => {
                pixels.par_iter_mut().try_for_each(|p| -> Result<()> {
                    *p = self.apply_pixel(*p)?;
                    Ok(())
                })?;
                0
            }
            ErrorPolicy::Substitute(sentinel) => pixels
                .par_iter_mut()
                .map(|p| match self.apply_pixel(*p) {
                    Ok(out) => {
                        *p = out;
                        0usize
                    }
                    Err(_) => {
                        *p = p.with_triple(sentinel.triple());
                        1
                    }
                })
                .sum(),
        };
        if substituted > 0 {
            warn!(
                transform = %self.name(),
                substituted,
                total = pixels.len(),
                "Substituted sentinel for failed pixels"
            );
        }
        Ok(BatchReport {
            pixels: pixels.len(),
            substituted,
        })
    }

    /// Transform an interleaved RGBA float buffer in place.
    fn process_interleaved(&self, data: &mut [f32], policy: ErrorPolicy) -> Result<BatchReport> {
        let pixels = Pixel::cast_slice_mut(data)?;
        self.process_buffer(pixels, policy)
    }
}
