// src/processing/mod.rs
pub mod evaluator;
pub mod indices;
pub mod registry;
pub mod resolver;

// Re-export main components
pub use evaluator::Evaluator;
pub use indices::IndexCalculator;
pub use registry::IndexRegistry;
pub use resolver::{required_bands, resolve, ResolvedBands};
