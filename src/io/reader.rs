// src/io/reader.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use geo::Rect;
use tracing::debug;

use crate::error::{Error, Result};
use crate::raster::{GeoInfo, Grid, RasterBand};
use crate::utils::cache::RasterCache;
use crate::utils::geometry::{transform_rect, Geometry};

/// Source of clipped raster bands for a scene.
///
/// A computation asks every band for its [`Grid`], picks one, then loads
/// each band onto that grid so that pixels line up.
pub trait RasterLoader: Send + Sync {
    /// Native grid of the band, limited to the lon/lat `clip` when given.
    fn grid(&self, scene_id: &str, band_label: &str, clip: Option<&Geometry>) -> Result<Grid>;

    /// Band values sampled onto `target`.
    fn load(&self, scene_id: &str, band_label: &str, target: &Grid) -> Result<RasterBand>;
}

/// Reads `<root>/<scene_id>/<band_label>.tif` with GDAL.
///
/// Clip geometries are lon/lat (EPSG:4326) and are transformed to the
/// raster's CRS before the pixel window is computed. Bands are resampled
/// onto the target grid by nearest neighbour.
pub struct GdalLoader {
    root: PathBuf,
    cache: Arc<RasterCache>,
}

impl GdalLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self::with_cache(root, Arc::new(RasterCache::new()))
    }

    pub fn with_cache<P: AsRef<Path>>(root: P, cache: Arc<RasterCache>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache,
        }
    }

    pub fn band_path(&self, scene_id: &str, band_label: &str) -> PathBuf {
        self.root.join(scene_id).join(format!("{band_label}.tif"))
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl RasterLoader for GdalLoader {
    fn grid(&self, scene_id: &str, band_label: &str, clip: Option<&Geometry>) -> Result<Grid> {
        let path = self.band_path(scene_id, band_label);
        let dataset = self.cache.get_dataset(&path)?;
        let dataset = dataset.lock();

        let raster_size = dataset.raster_size();
        let projection = dataset.projection();
        let geo_transform = dataset.geo_transform()?;

        let Some(geometry) = clip else {
            return Ok(Grid::new(raster_size, GeoInfo::new(projection, geo_transform)));
        };

        let bbox = lonlat_to_dataset(geometry.bbox()?, &dataset)?;
        let window = clip_window(&geo_transform, raster_size, bbox)
            .ok_or_else(|| Error::EmptyClip(path.display().to_string()))?;
        Ok(Grid::new(window.size, GeoInfo::new(projection, window.geo_transform)))
    }

    fn load(&self, scene_id: &str, band_label: &str, target: &Grid) -> Result<RasterBand> {
        let path = self.band_path(scene_id, band_label);
        let dataset = self.cache.get_dataset(&path)?;
        let dataset = dataset.lock();

        let raster_size = dataset.raster_size();
        let projection = dataset.projection();
        let geo_transform = dataset.geo_transform()?;
        if !same_crs(&projection, &target.geo.projection)? {
            return Err(Error::CrsMismatch(path.display().to_string()));
        }

        let window = clip_window(&geo_transform, raster_size, target.bounds())
            .ok_or_else(|| Error::EmptyClip(path.display().to_string()))?;

        let band = dataset.rasterband(1)?;
        let no_data = band.no_data_value().map(|v| v as f32);

        debug!(
            path = %path.display(),
            offset = ?window.offset,
            size = ?window.size,
            target = ?target.size,
            "reading band"
        );
        let buffer = band.read_as::<f32>(
            (window.offset.0 as isize, window.offset.1 as isize),
            window.size,
            window.size,
            None,
        )?;

        let values = if window.size == target.size && window.geo_transform == target.geo.geo_transform {
            buffer.data().to_vec()
        } else {
            resample_nearest(&window, buffer.data(), target)
        };

        Ok(RasterBand::from_vec(target.size, values, target.geo.clone()).with_no_data(no_data))
    }
}

/// Moves a lon/lat box into the dataset's CRS.
///
/// Datasets without a projection, and geographic ones, take the box as is.
fn lonlat_to_dataset(bbox: Rect<f64>, dataset: &Dataset) -> Result<Rect<f64>> {
    if dataset.projection().is_empty() {
        return Ok(bbox);
    }
    let srs = dataset.spatial_ref()?;
    if srs.is_geographic() {
        return Ok(bbox);
    }
    transform_rect(bbox, &SpatialRef::from_epsg(4326)?, &srs)
}

fn same_crs(a: &str, b: &str) -> Result<bool> {
    if a == b {
        return Ok(true);
    }
    if a.is_empty() || b.is_empty() {
        return Ok(false);
    }
    Ok(SpatialRef::from_wkt(a)? == SpatialRef::from_wkt(b)?)
}

/// Samples `values` (the pixels of `window`) at the centre of every `target`
/// pixel. Centres that fall outside the window become NaN.
pub fn resample_nearest(window: &Window, values: &[f32], target: &Grid) -> Vec<f32> {
    let [src_x, src_w, _, src_y, _, src_h] = window.geo_transform;
    let [dst_x, dst_w, _, dst_y, _, dst_h] = target.geo.geo_transform;
    let (width, height) = target.size;

    let cols: Vec<Option<usize>> = (0..width)
        .map(|col| {
            let x = dst_x + (col as f64 + 0.5) * dst_w;
            source_index((x - src_x) / src_w, window.size.0)
        })
        .collect();

    let mut out = Vec::with_capacity(width * height);
    for row in 0..height {
        let y = dst_y + (row as f64 + 0.5) * dst_h;
        let src_row = source_index((y - src_y) / src_h, window.size.1);
        out.extend(cols.iter().map(|col| match (src_row, col) {
            (Some(r), Some(c)) => values[r * window.size.0 + c],
            _ => f32::NAN,
        }));
    }
    out
}

fn source_index(position: f64, len: usize) -> Option<usize> {
    let index = position.floor();
    (index >= 0.0 && index < len as f64).then_some(index as usize)
}

/// Pixel window of a raster plus the geo-transform of that window.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub offset: (usize, usize),
    pub size: (usize, usize),
    pub geo_transform: [f64; 6],
}

/// Window of a north-up raster covering `bbox`, in the raster's CRS.
///
/// Box edges within 1e-6 pixels of a pixel edge snap onto it. Returns
/// `None` when the box misses the raster.
pub fn clip_window(geo_transform: &[f64; 6], raster_size: (usize, usize), bbox: Rect<f64>) -> Option<Window> {
    let [origin_x, pixel_w, _, origin_y, _, pixel_h] = *geo_transform;
    let (min, max) = (bbox.min(), bbox.max());

    let cols = [snap((min.x - origin_x) / pixel_w), snap((max.x - origin_x) / pixel_w)];
    let rows = [snap((min.y - origin_y) / pixel_h), snap((max.y - origin_y) / pixel_h)];

    let col0 = cols[0].min(cols[1]).floor().max(0.0) as usize;
    let col1 = (cols[0].max(cols[1]).ceil().max(0.0) as usize).min(raster_size.0);
    let row0 = rows[0].min(rows[1]).floor().max(0.0) as usize;
    let row1 = (rows[0].max(rows[1]).ceil().max(0.0) as usize).min(raster_size.1);

    if col0 >= col1 || row0 >= row1 {
        return None;
    }

    Some(Window {
        offset: (col0, row0),
        size: (col1 - col0, row1 - row0),
        geo_transform: [
            origin_x + col0 as f64 * pixel_w,
            pixel_w,
            0.0,
            origin_y + row0 as f64 * pixel_h,
            0.0,
            pixel_h,
        ],
    })
}

fn snap(position: f64) -> f64 {
    let nearest = position.round();
    if (position - nearest).abs() < 1e-6 {
        nearest
    } else {
        position
    }
}
