// src/processing/indices/formula.rs
use crate::bands::BandRole;
use crate::processing::indices::IndexCalculator;

type Formula = Box<dyn Fn(&[f32]) -> Option<f32> + Send + Sync>;

/// Index defined by a closure over its declared bands.
///
/// The closure sees pixel values in the order of `bands`, so it can only
/// read the roles the definition declares.
pub struct FormulaIndex {
    name: String,
    bands: Vec<BandRole>,
    formula: Formula,
    range: (f32, f32),
}

impl FormulaIndex {
    pub fn new<F>(name: impl Into<String>, bands: Vec<BandRole>, formula: F) -> Self
    where
        F: Fn(&[f32]) -> Option<f32> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            bands,
            formula: Box::new(formula),
            range: (-1.0, 1.0),
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.range = (min, max);
        self
    }
}

impl IndexCalculator for FormulaIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_bands(&self) -> &[BandRole] {
        &self.bands
    }

    fn calculate(&self, values: &[f32]) -> Option<f32> {
        (self.formula)(values)
    }

    fn valid_range(&self) -> (f32, f32) {
        self.range
    }
}
