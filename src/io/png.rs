// src/io/png.rs
use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgba};
use tracing::debug;

use crate::error::Result;
use crate::io::colormap::Colormap;
use crate::io::writer::Exporter;
use crate::raster::IndexResult;

/// Colour-mapped RGBA image of an index result. No-data pixels are transparent.
///
/// With both `min` and `max` set, values are clipped to that range before
/// mapping; otherwise the range of the valid pixels is used.
#[derive(Debug, Clone, Default)]
pub struct PngExporter {
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub colormap: Colormap,
}

impl PngExporter {
    pub fn new(min: Option<f32>, max: Option<f32>, colormap: Colormap) -> Self {
        Self { min, max, colormap }
    }

    /// Value range mapped onto the colour ramp.
    pub fn value_range(&self, result: &IndexResult) -> (f64, f64) {
        let (min, max) = match (self.min, self.max) {
            (Some(min), Some(max)) => (min as f64, max as f64),
            _ => {
                let stats = result.statistics();
                match (stats.min, stats.max) {
                    (Some(min), Some(max)) => (min as f64, max as f64),
                    _ => (0.0, 1.0),
                }
            }
        };
        if (max - min).abs() < f64::EPSILON {
            (min, min + 1.0)
        } else {
            (min, max)
        }
    }

    pub fn render(&self, result: &IndexResult) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        let (width, height) = result.shape();
        let (min, max) = self.value_range(result);
        let scale = 1.0 / (max - min);

        ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
            match result.get(x as usize, y as usize) {
                Some(value) => {
                    let t = (value as f64 - min) * scale;
                    let [r, g, b] = self.colormap.evaluate(t);
                    Rgba([r, g, b, 255])
                }
                None => Rgba([0, 0, 0, 0]),
            }
        })
    }
}

impl Exporter for PngExporter {
    fn export(&self, result: &IndexResult, path: &Path) -> Result<()> {
        debug!(
            path = %path.display(),
            index = result.name(),
            colormap = %self.colormap,
            "writing PNG"
        );
        self.render(result).save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoInfo;

    fn result() -> IndexResult {
        IndexResult::from_pixels(
            "NDVI",
            (2, 2),
            vec![Some(-0.5), Some(0.0), Some(0.5), None],
            GeoInfo::default(),
        )
        .unwrap()
    }

    #[test]
    fn explicit_range_clips() {
        let exporter = PngExporter::new(Some(0.0), Some(0.5), Colormap::Grayscale);
        let image = exporter.render(&result());
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(0, 1), &Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(1, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn automatic_range_uses_valid_pixels() {
        let exporter = PngExporter::default();
        assert_eq!(exporter.value_range(&result()), (-0.5, 0.5));

        let flat = IndexResult::from_pixels("NDVI", (1, 1), vec![Some(0.2)], GeoInfo::default()).unwrap();
        let (min, max) = exporter.value_range(&flat);
        assert!((max - min - 1.0).abs() < 1e-9);

        let empty = IndexResult::from_pixels("NDVI", (1, 1), vec![None], GeoInfo::default()).unwrap();
        assert_eq!(exporter.value_range(&empty), (0.0, 1.0));
    }
}
