// src/utils/geometry.rs
use std::fs;
use std::path::Path;

use gdal::spatial_ref::{CoordTransform, SpatialRef};
use geo::{coord, BoundingRect, CoordsIter, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lon/lat (EPSG:4326) polygon used for searches and clipping.
///
/// Reads and writes GeoJSON `Polygon` geometries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "geojson::Geometry", into = "geojson::Geometry")]
pub struct Geometry {
    polygon: Polygon<f64>,
}

impl Geometry {
    /// Wraps `polygon` after checking its outer ring.
    pub fn new(polygon: Polygon<f64>) -> Result<Self> {
        let geometry = Self { polygon };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Needs an outer ring of at least 4 positions, all finite.
    pub fn validate(&self) -> Result<()> {
        let positions = self.polygon.exterior().coords_count();
        if positions < 4 {
            return Err(Error::InvalidGeometry(format!(
                "outer ring has {positions} positions, need at least 4"
            )));
        }
        if self.polygon.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(Error::InvalidGeometry("non-finite coordinate".to_string()));
        }
        Ok(())
    }

    /// Reads a GeoJSON geometry from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self {
            polygon: rect.to_polygon(),
        }
    }

    /// Square of `size` degrees centred on (`lon`, `lat`).
    pub fn sample_square(lon: f64, lat: f64, size: f64) -> Self {
        let half = size / 2.0;
        Self::from_rect(Rect::new(
            coord! { x: lon - half, y: lat - half },
            coord! { x: lon + half, y: lat + half },
        ))
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Bounding box of the outer ring.
    pub fn bbox(&self) -> Result<Rect<f64>> {
        self.polygon
            .bounding_rect()
            .ok_or_else(|| Error::InvalidGeometry("polygon is empty".to_string()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(geojson::Geometry::from(self.clone())).unwrap_or(serde_json::Value::Null)
    }
}

impl TryFrom<geojson::Geometry> for Geometry {
    type Error = Error;

    fn try_from(geometry: geojson::Geometry) -> Result<Self> {
        match geometry.value {
            value @ geojson::Value::Polygon(_) => {
                let polygon = Polygon::<f64>::try_from(value)
                    .map_err(|e| Error::InvalidGeometry(e.to_string()))?;
                Geometry::new(polygon)
            }
            _ => Err(Error::InvalidGeometry("expected a Polygon".to_string())),
        }
    }
}

impl From<Geometry> for geojson::Geometry {
    fn from(geometry: Geometry) -> Self {
        geojson::Geometry::new(geojson::Value::from(&geometry.polygon))
    }
}

/// Box enclosing `rect` after transforming it from `from` to `to`.
///
/// Geographic references are taken in their EPSG axis order (lat, lon), so
/// the x/y order is swapped on that side.
pub fn transform_rect(rect: Rect<f64>, from: &SpatialRef, to: &SpatialRef) -> Result<Rect<f64>> {
    let from_geo = from.is_geographic();
    let to_geo = to.is_geographic();
    let (min, max) = (rect.min(), rect.max());

    let bounds = if from_geo && !to_geo {
        [min.y, min.x, max.y, max.x]
    } else {
        [min.x, min.y, max.x, max.y]
    };

    let transform = CoordTransform::new(from, to)?;
    let out = transform.transform_bounds(&bounds, 21)?;

    let (x0, y0, x1, y1) = if to_geo && !from_geo {
        (out[1], out[0], out[3], out[2])
    } else {
        (out[0], out[1], out[2], out[3])
    };
    Ok(Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }))
}
