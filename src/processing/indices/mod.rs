// src/processing/indices/mod.rs
pub mod formula;
pub mod ndi;

use crate::bands::BandRole;

// Re-export indices
pub use formula::FormulaIndex;
pub use ndi::NormalizedDifference;

/// Trait for spectral index calculators
pub trait IndexCalculator: Send + Sync {
    /// Return the name of the index
    fn name(&self) -> &str;

    /// Band roles the formula reads, in the order `calculate` receives them
    fn required_bands(&self) -> &[BandRole];

    /// Calculate the index for one pixel.
    ///
    /// `values` holds one finite reflectance per entry of `required_bands`.
    /// Returns `None` where the index is undefined for this pixel.
    fn calculate(&self, values: &[f32]) -> Option<f32>;

    /// Range the index stays within for non-negative reflectances.
    /// Values outside it are reported, never clamped.
    fn valid_range(&self) -> (f32, f32) {
        (-1.0, 1.0)
    }
}
