// src/processing/evaluator.rs
use std::collections::HashMap;

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bands::BandRole;
use crate::error::{Error, Result};
use crate::processing::registry::IndexRegistry;
use crate::raster::{IndexResult, RasterBand};

/// Applies registered index formulas to aligned raster bands.
///
/// Holds no state besides the registry, so one evaluator can serve
/// concurrent callers.
#[derive(Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r IndexRegistry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r IndexRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r IndexRegistry {
        self.registry
    }

    /// Computes `index` over `bands`.
    ///
    /// `bands` must hold exactly the roles the index requires, all with the
    /// same shape and spatial reference. Nothing is computed unless every
    /// check passes.
    pub fn evaluate(&self, index: &str, bands: &HashMap<BandRole, RasterBand>) -> Result<IndexResult> {
        let calculator = self.registry.get(index)?;
        let required = calculator.required_bands();

        let inputs = required
            .iter()
            .map(|&role| {
                bands.get(&role).ok_or_else(|| Error::MissingBand {
                    role,
                    source_name: "supplied bands".to_string(),
                })
            })
            .collect::<Result<Vec<&RasterBand>>>()?;

        if let Some(&role) = bands.keys().filter(|role| !required.contains(*role)).sorted().next() {
            return Err(Error::UnexpectedBand {
                role,
                index: calculator.name().to_string(),
            });
        }

        let reference = inputs[0];
        for (&role, band) in required.iter().zip(&inputs).skip(1) {
            if band.shape() != reference.shape() {
                return Err(Error::ShapeMismatch {
                    role,
                    reference: required[0],
                    detail: format!("shape {:?} vs {:?}", band.shape(), reference.shape()),
                });
            }
            if band.geo() != reference.geo() {
                return Err(Error::ShapeMismatch {
                    role,
                    reference: required[0],
                    detail: "spatial reference differs".to_string(),
                });
            }
        }

        let shape = reference.shape();
        let pixel_count = shape.0 * shape.1;

        let pixels: Vec<Option<f32>> = (0..pixel_count)
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(inputs.len()),
                |values, i| {
                    values.clear();
                    for band in &inputs {
                        let value = band.values()[i];
                        if band.is_no_data(value) {
                            return None;
                        }
                        values.push(value);
                    }
                    calculator.calculate(values).filter(|v| v.is_finite())
                },
            )
            .collect();

        let (min, max) = calculator.valid_range();
        let out_of_range = pixels
            .par_iter()
            .flatten()
            .filter(|&&v| v < min || v > max)
            .count();
        if out_of_range > 0 {
            warn!(
                index = calculator.name(),
                out_of_range,
                "{} pixels outside [{}, {}]; check input reflectances",
                out_of_range,
                min,
                max
            );
        }

        let result = IndexResult::from_pixels(
            calculator.name(),
            shape,
            pixels,
            reference.geo().clone(),
        )?
        .with_out_of_range(out_of_range);

        debug!(
            index = calculator.name(),
            bands = %required.iter().join(","),
            width = shape.0,
            height = shape.1,
            no_data = result.statistics().no_data,
            "evaluated index"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::indices::FormulaIndex;
    use crate::raster::GeoInfo;

    fn band(values: &[f32]) -> RasterBand {
        RasterBand::from_vec((2, 2), values.to_vec(), GeoInfo::default())
    }

    fn ndvi_inputs(nir: &[f32], red: &[f32]) -> HashMap<BandRole, RasterBand> {
        HashMap::from([(BandRole::Nir, band(nir)), (BandRole::Red, band(red))])
    }

    #[test]
    fn test_ndvi_pixels() {
        let registry = IndexRegistry::with_defaults();
        let evaluator = Evaluator::new(&registry);
        let result = evaluator
            .evaluate(
                "NDVI",
                &ndvi_inputs(&[400.0, 3000.0, 0.0, 5000.0], &[100.0, 3000.0, 0.0, 2500.0]),
            )
            .unwrap();

        assert_eq!(result.name(), "NDVI");
        assert_eq!(result.pixels()[0], Some(0.6));
        assert_eq!(result.pixels()[1], Some(0.0));
        assert_eq!(result.pixels()[2], None);
        assert!((result.pixels()[3].unwrap() - 0.33333).abs() < 0.0001);
        assert_eq!(result.out_of_range_count(), 0);
    }

    #[test]
    fn test_source_no_data_propagates() {
        let registry = IndexRegistry::with_defaults();
        let mut inputs = ndvi_inputs(&[400.0, 400.0, f32::NAN, 400.0], &[100.0; 4]);
        let nir = inputs.remove(&BandRole::Nir).unwrap().with_no_data(Some(400.0));
        inputs.insert(BandRole::Nir, nir);

        let result = Evaluator::new(&registry).evaluate("NDVI", &inputs).unwrap();
        assert!(result.pixels().iter().all(Option::is_none));
        assert_eq!(result.mean(), None);
    }

    #[test]
    fn test_negative_reflectance_is_flagged_not_clamped() {
        let registry = IndexRegistry::with_defaults();
        let result = Evaluator::new(&registry)
            .evaluate(
                "NDVI",
                &ndvi_inputs(&[5000.0, 5000.0, -999.0, 1.0], &[2500.0, -999.0, 2500.0, 1.0]),
            )
            .unwrap();

        assert!((result.pixels()[1].unwrap() - 1.4993).abs() < 0.0001);
        assert!((result.pixels()[2].unwrap() - (-2.3311)).abs() < 0.0001);
        assert_eq!(result.out_of_range_count(), 2);
    }

    #[test]
    fn test_unexpected_band() {
        let registry = IndexRegistry::with_defaults();
        let mut inputs = ndvi_inputs(&[1.0; 4], &[1.0; 4]);
        inputs.insert(BandRole::Swir, band(&[1.0; 4]));

        assert!(matches!(
            Evaluator::new(&registry).evaluate("NDVI", &inputs),
            Err(Error::UnexpectedBand { role: BandRole::Swir, .. })
        ));
    }

    #[test]
    fn test_spatial_reference_mismatch() {
        let registry = IndexRegistry::with_defaults();
        let mut inputs = ndvi_inputs(&[1.0; 4], &[1.0; 4]);
        let shifted = RasterBand::from_vec(
            (2, 2),
            vec![1.0; 4],
            GeoInfo::new("", [10.0, 1.0, 0.0, 0.0, 0.0, -1.0]),
        );
        inputs.insert(BandRole::Red, shifted);

        assert!(matches!(
            Evaluator::new(&registry).evaluate("NDVI", &inputs),
            Err(Error::ShapeMismatch { role: BandRole::Red, .. })
        ));
    }

    #[test]
    fn test_formula_returning_infinity_is_no_data() {
        let mut registry = IndexRegistry::new();
        registry
            .register(FormulaIndex::new("RATIO", vec![BandRole::Nir, BandRole::Red], |v| {
                Some(v[0] / v[1])
            }))
            .unwrap();

        let result = Evaluator::new(&registry)
            .evaluate("ratio", &ndvi_inputs(&[1.0, 1.0, 1.0, 1.0], &[0.0, 1.0, 2.0, 4.0]))
            .unwrap();
        assert_eq!(result.pixels(), &[None, Some(1.0), Some(0.5), Some(0.25)]);
    }
}
