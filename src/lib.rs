// src/lib.rs
pub mod bands;
pub mod batch;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod io;
pub mod processing;
pub mod raster;
pub mod satellite;
pub mod utils;

pub use bands::BandRole;
pub use catalog::{CatalogSearch, SceneCollection, SceneItem, SearchRequest};
pub use error::{Error, Result};
pub use processing::{Evaluator, IndexCalculator, IndexRegistry};
pub use raster::{GeoInfo, Grid, IndexResult, RasterBand, Statistics};
pub use satellite::{BandMap, Satellite, Sentinel2Product};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
