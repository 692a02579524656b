// src/processing/indices/ndi.rs
use crate::bands::BandRole;
use crate::processing::indices::IndexCalculator;

/// Normalized Difference Index (NDI) calculator: (A-B)/(A+B)
pub struct NormalizedDifference {
    name: String,
    bands: [BandRole; 2],
}

impl NormalizedDifference {
    pub fn new(name: impl Into<String>, band_a: BandRole, band_b: BandRole) -> Self {
        Self {
            name: name.into(),
            bands: [band_a, band_b],
        }
    }

    /// NDVI = (NIR - RED) / (NIR + RED)
    pub fn ndvi() -> Self {
        Self::new("NDVI", BandRole::Nir, BandRole::Red)
    }

    /// NDWI = (NIR - GREEN) / (NIR + GREEN)
    pub fn ndwi() -> Self {
        Self::new("NDWI", BandRole::Nir, BandRole::Green)
    }

    /// NDBI = (SWIR - NIR) / (SWIR + NIR)
    pub fn ndbi() -> Self {
        Self::new("NDBI", BandRole::Swir, BandRole::Nir)
    }
}

impl IndexCalculator for NormalizedDifference {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_bands(&self) -> &[BandRole] {
        &self.bands
    }

    fn calculate(&self, values: &[f32]) -> Option<f32> {
        // f64 so that a + b cannot overflow for large f32 inputs
        let (a, b) = (values[0] as f64, values[1] as f64);
        let sum = a + b;
        if sum == 0.0 {
            return None;
        }
        Some(((a - b) / sum) as f32).filter(|v| v.is_finite())
    }
}
