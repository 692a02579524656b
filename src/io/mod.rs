// src/io/mod.rs
pub mod colormap;
pub mod png;
pub mod reader;
pub mod writer;

use std::path::Path;

pub use colormap::Colormap;
pub use png::PngExporter;
pub use reader::{GdalLoader, RasterLoader};
pub use writer::{ExportFormat, Exporter, GeoTiffExporter};

use crate::error::Result;
use crate::raster::IndexResult;

/// Exports `result` to `path` in `format`.
pub fn export(
    result: &IndexResult,
    format: ExportFormat,
    path: &Path,
    geotiff: &GeoTiffExporter,
    png: &PngExporter,
) -> Result<()> {
    match format {
        ExportFormat::Tiff => geotiff.export(result, path),
        ExportFormat::Png => png.export(result, path),
    }
}
