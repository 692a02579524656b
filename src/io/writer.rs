// src/io/writer.rs
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::spatial_ref::SpatialRef;
use gdal::{DriverManager, Metadata};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::raster::IndexResult;
use crate::utils::fixed_point::to_fixed_point;

pub const NODATA_VALUE_FLOAT: f32 = -999.0;
pub const NODATA_VALUE_INT: i16 = -10000;

/// Persists an index result.
pub trait Exporter {
    fn export(&self, result: &IndexResult, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Tiff,
    Png,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tiff" | "tif" | "geotiff" => Ok(ExportFormat::Tiff),
            "png" => Ok(ExportFormat::Png),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Tiff => f.write_str("tiff"),
            ExportFormat::Png => f.write_str("png"),
        }
    }
}

/// Single-band GeoTIFF writer.
///
/// Float output keeps every value and writes no-data as -999. Fixed-point
/// output stores `value * scale_factor` as int16 with no-data -10000, so the
/// scale factor must stay within 1..=10000.
#[derive(Debug, Clone)]
pub struct GeoTiffExporter {
    pub fixed_point: bool,
    pub scale_factor: i32,
    pub compress: String,
    pub compress_level: u8,
    pub tiled: bool,
}

impl Default for GeoTiffExporter {
    fn default() -> Self {
        Self {
            fixed_point: true,
            scale_factor: 10000,
            compress: "DEFLATE".to_string(),
            compress_level: 6,
            tiled: true,
        }
    }
}

impl GeoTiffExporter {
    pub const MAX_SCALE_FACTOR: i32 = 10000;

    /// Checks the scale factor when writing fixed-point output.
    pub fn validate(&self) -> Result<()> {
        if self.fixed_point && !(1..=Self::MAX_SCALE_FACTOR).contains(&self.scale_factor) {
            return Err(Error::InvalidScaleFactor(self.scale_factor));
        }
        Ok(())
    }

    pub fn creation_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        let compress = self.compress.to_uppercase();

        // Add compression if not NONE
        if compress != "NONE" {
            options.push(format!("COMPRESS={compress}"));

            // Add compression level for supported algorithms
            match compress.as_str() {
                "DEFLATE" => options.push(format!("ZLEVEL={}", self.compress_level.min(9))),
                "ZSTD" => options.push(format!("ZSTD_LEVEL={}", self.compress_level.min(22))),
                _ => {}
            }
        }

        if self.tiled {
            options.push("TILED=YES".to_string());
        }

        options.push("NUM_THREADS=ALL_CPUS".to_string());
        options
    }
}

impl Exporter for GeoTiffExporter {
    fn export(&self, result: &IndexResult, path: &Path) -> Result<()> {
        self.validate()?;
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let creation_options = RasterCreationOptions::from_iter(self.creation_options());
        let (width, height) = result.shape();

        let projection = if result.geo().projection.is_empty() {
            SpatialRef::from_epsg(4326)?.to_wkt()?
        } else {
            result.geo().projection.clone()
        };

        debug!(
            path = %path.display(),
            index = result.name(),
            fixed_point = self.fixed_point,
            "writing GeoTIFF"
        );

        if self.fixed_point {
            if result.out_of_range_count() > 0 {
                warn!(
                    index = result.name(),
                    "int16 output saturates out-of-range values; use float output to keep them"
                );
            }

            let mut out_ds = driver.create_with_band_type_with_options::<i16, _>(
                path,
                width,
                height,
                1,
                &creation_options,
            )?;
            out_ds.set_projection(&projection)?;
            out_ds.set_geo_transform(&result.geo().geo_transform)?;

            {
                let mut band = out_ds.rasterband(1)?;
                band.set_no_data_value(Some(NODATA_VALUE_INT as f64))?;
                band.set_metadata_item("SCALE", &format!("{}", 1.0 / self.scale_factor as f64), "")?;
                band.set_metadata_item("OFFSET", "0", "")?;
                band.set_description(&format!("{} (scaled by {})", result.name(), self.scale_factor))?;

                let fixed_data = to_fixed_point(result.pixels(), self.scale_factor, NODATA_VALUE_INT);
                let mut buffer = Buffer::new((width, height), fixed_data);
                band.write((0, 0), (width, height), &mut buffer)?;
            }

            out_ds.flush_cache()?;
        } else {
            let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
                path,
                width,
                height,
                1,
                &creation_options,
            )?;
            out_ds.set_projection(&projection)?;
            out_ds.set_geo_transform(&result.geo().geo_transform)?;

            {
                let mut band = out_ds.rasterband(1)?;
                band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
                band.set_description(result.name())?;

                let mut buffer = result.to_buffer(NODATA_VALUE_FLOAT);
                band.write((0, 0), (width, height), &mut buffer)?;
            }

            out_ds.flush_cache()?;
        }

        Ok(())
    }
}
