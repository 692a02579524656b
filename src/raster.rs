// src/raster.rs
use std::fmt;

use gdal::raster::Buffer;
use geo::{coord, Rect};
use serde::Serialize;

use crate::error::{Error, Result};

/// Spatial reference shared by every band of one computation.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
}

impl GeoInfo {
    pub fn new(projection: impl Into<String>, geo_transform: [f64; 6]) -> Self {
        Self {
            projection: projection.into(),
            geo_transform,
        }
    }
}

impl Default for GeoInfo {
    /// Identity transform with no projection.
    fn default() -> Self {
        Self {
            projection: String::new(),
            geo_transform: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
        }
    }
}

/// Pixel grid every band of a computation is read onto.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// (width, height)
    pub size: (usize, usize),
    pub geo: GeoInfo,
}

impl Grid {
    pub fn new(size: (usize, usize), geo: GeoInfo) -> Self {
        Self { size, geo }
    }

    /// Ground area of one pixel in CRS units.
    pub fn pixel_area(&self) -> f64 {
        (self.geo.geo_transform[1] * self.geo.geo_transform[5]).abs()
    }

    /// Extent covered by the grid, in its own CRS.
    pub fn bounds(&self) -> Rect<f64> {
        let [origin_x, pixel_w, _, origin_y, _, pixel_h] = self.geo.geo_transform;
        Rect::new(
            coord! { x: origin_x, y: origin_y },
            coord! {
                x: origin_x + self.size.0 as f64 * pixel_w,
                y: origin_y + self.size.1 as f64 * pixel_h,
            },
        )
    }
}

/// One band of reflectance values, already clipped and aligned by the loader.
pub struct RasterBand {
    data: Buffer<f32>,
    geo: GeoInfo,
    no_data: Option<f32>,
}

impl RasterBand {
    pub fn new(data: Buffer<f32>, geo: GeoInfo) -> Self {
        Self {
            data,
            geo,
            no_data: None,
        }
    }

    /// `shape` is (width, height); `values` is row-major.
    pub fn from_vec(shape: (usize, usize), values: Vec<f32>, geo: GeoInfo) -> Self {
        Self::new(Buffer::new(shape, values), geo)
    }

    /// Marks `value` as the source no-data value of this band.
    pub fn with_no_data(mut self, value: Option<f32>) -> Self {
        self.no_data = value;
        self
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    pub fn values(&self) -> &[f32] {
        self.data.data()
    }

    pub fn geo(&self) -> &GeoInfo {
        &self.geo
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.shape(), self.geo.clone())
    }

    pub fn no_data(&self) -> Option<f32> {
        self.no_data
    }

    /// True when `value` cannot take part in an index computation.
    pub fn is_no_data(&self, value: f32) -> bool {
        !value.is_finite() || self.no_data.is_some_and(|nd| nd == value)
    }
}

impl Clone for RasterBand {
    fn clone(&self) -> Self {
        Self {
            data: Buffer::new(self.shape(), self.values().to_vec()),
            geo: self.geo.clone(),
            no_data: self.no_data,
        }
    }
}

impl fmt::Debug for RasterBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterBand")
            .field("shape", &self.shape())
            .field("geo", &self.geo)
            .field("no_data", &self.no_data)
            .finish()
    }
}

/// Summary of the valid pixels of an [`IndexResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub valid: usize,
    pub no_data: usize,
    pub mean: Option<f64>,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

/// Output of one index evaluation. `None` pixels carry no data.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResult {
    name: String,
    shape: (usize, usize),
    pixels: Vec<Option<f32>>,
    geo: GeoInfo,
    out_of_range: usize,
}

impl IndexResult {
    /// `pixels` is row-major and must hold exactly width x height values.
    pub fn from_pixels(
        name: impl Into<String>,
        shape: (usize, usize),
        pixels: Vec<Option<f32>>,
        geo: GeoInfo,
    ) -> Result<Self> {
        if shape.0 * shape.1 != pixels.len() {
            return Err(Error::PixelCount {
                shape,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            shape,
            pixels,
            geo,
            out_of_range: 0,
        })
    }

    pub(crate) fn with_out_of_range(mut self, count: usize) -> Self {
        self.out_of_range = count;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// (width, height)
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn pixels(&self) -> &[Option<f32>] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.shape.0 || y >= self.shape.1 {
            return None;
        }
        self.pixels[y * self.shape.0 + x]
    }

    pub fn geo(&self) -> &GeoInfo {
        &self.geo
    }

    /// Number of valid pixels that fell outside the index's natural range.
    pub fn out_of_range_count(&self) -> usize {
        self.out_of_range
    }

    /// Mean over valid pixels; `None` when every pixel is no-data.
    pub fn mean(&self) -> Option<f64> {
        self.statistics().mean
    }

    pub fn statistics(&self) -> Statistics {
        let mut valid = 0usize;
        let mut sum = 0.0f64;
        let mut min: Option<f32> = None;
        let mut max: Option<f32> = None;

        for value in self.pixels.iter().flatten() {
            valid += 1;
            sum += *value as f64;
            min = Some(min.map_or(*value, |m| m.min(*value)));
            max = Some(max.map_or(*value, |m| m.max(*value)));
        }

        Statistics {
            valid,
            no_data: self.pixels.len() - valid,
            mean: (valid > 0).then(|| sum / valid as f64),
            min,
            max,
        }
    }

    /// Dense buffer with no-data pixels replaced by `no_data`.
    pub fn to_buffer(&self, no_data: f32) -> Buffer<f32> {
        let data = self
            .pixels
            .iter()
            .map(|value| value.unwrap_or(no_data))
            .collect();
        Buffer::new(self.shape, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_skips_no_data() {
        let result = IndexResult::from_pixels(
            "NDVI",
            (2, 2),
            vec![Some(0.2), Some(0.4), Some(0.6), None],
            GeoInfo::default(),
        )
        .unwrap();
        let stats = result.statistics();
        assert_eq!(stats.valid, 3);
        assert_eq!(stats.no_data, 1);
        assert!((stats.mean.unwrap() - 0.4).abs() < 1e-6);
        assert_eq!(stats.min, Some(0.2));
        assert_eq!(stats.max, Some(0.6));
    }

    #[test]
    fn mean_of_all_no_data_is_none() {
        let result = IndexResult::from_pixels("NDVI", (1, 2), vec![None, None], GeoInfo::default()).unwrap();
        assert_eq!(result.mean(), None);
        assert_eq!(result.statistics().min, None);
    }

    #[test]
    fn get_uses_row_major_order() {
        let result = IndexResult::from_pixels(
            "NDVI",
            (3, 2),
            vec![Some(0.0), Some(0.1), Some(0.2), Some(0.3), None, Some(0.5)],
            GeoInfo::default(),
        )
        .unwrap();
        assert_eq!(result.get(1, 0), Some(0.1));
        assert_eq!(result.get(0, 1), Some(0.3));
        assert_eq!(result.get(1, 1), None);
        assert_eq!(result.get(3, 0), None);
    }

    #[test]
    fn pixel_count_must_match_shape() {
        let err = IndexResult::from_pixels("NDVI", (2, 2), vec![Some(0.1); 3], GeoInfo::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PixelCount {
                shape: (2, 2),
                actual: 3
            }
        ));
    }

    #[test]
    fn grid_bounds_and_pixel_area() {
        let grid = Grid::new(
            (4, 2),
            GeoInfo::new("", [500000.0, 20.0, 0.0, 2600000.0, 0.0, -20.0]),
        );
        let bounds = grid.bounds();
        assert_eq!((bounds.min().x, bounds.max().x), (500000.0, 500080.0));
        assert_eq!((bounds.min().y, bounds.max().y), (2599960.0, 2600000.0));
        assert_eq!(grid.pixel_area(), 400.0);
    }

    #[test]
    fn band_no_data_includes_non_finite() {
        let band = RasterBand::from_vec((2, 1), vec![1.0, 2.0], GeoInfo::default())
            .with_no_data(Some(0.0));
        assert!(band.is_no_data(0.0));
        assert!(band.is_no_data(f32::NAN));
        assert!(band.is_no_data(f32::INFINITY));
        assert!(!band.is_no_data(2.0));
    }
}
