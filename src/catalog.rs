// src/catalog.rs
//! Scene discovery on a STAC catalog.
//!
//! Builds `POST /search` bodies and holds the items a search returned. The
//! HTTP transport lives behind [`CatalogSearch`].

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::RasterLoader;
use crate::processing::{required_bands, resolve, Evaluator};
use crate::raster::IndexResult;
use crate::satellite::Satellite;
use crate::utils::geometry::Geometry;

/// Body of a STAC item search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    #[serde(skip)]
    satellite: Satellite,
    collections: Vec<String>,
    datetime: String,
    intersects: Geometry,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    query: BTreeMap<String, serde_json::Value>,
}

impl SearchRequest {
    pub fn new(satellite: Satellite, start: NaiveDate, end: NaiveDate, geometry: Geometry) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        geometry.validate()?;

        let mut query = BTreeMap::new();
        if let Some(platform) = satellite.platform_filter() {
            query.insert("platform".to_string(), json!({ "eq": platform }));
        }

        Ok(Self {
            satellite,
            collections: vec![satellite.collection_id().to_string()],
            datetime: format!("{}/{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
            intersects: geometry,
            query,
        })
    }

    /// Keeps only scenes with cloud cover strictly below `max` percent.
    pub fn cloud_cover(mut self, max: u8) -> Self {
        self.query
            .insert("eo:cloud_cover".to_string(), json!({ "lt": max }));
        self
    }

    pub fn satellite(&self) -> Satellite {
        self.satellite
    }

    pub fn geometry(&self) -> &Geometry {
        &self.intersects
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Anything able to run a STAC item search.
pub trait CatalogSearch {
    fn search(&self, request: &SearchRequest) -> Result<SceneCollection>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneProperties {
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(rename = "eo:cloud_cover", default)]
    pub cloud_cover: Option<f64>,
    #[serde(default)]
    pub platform: Option<String>,
}

/// One STAC item, reduced to what scene selection needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneItem {
    pub id: String,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub properties: SceneProperties,
}

impl SceneItem {
    /// Item known only by id, e.g. a scene already on local disk.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bbox: None,
            properties: SceneProperties::default(),
        }
    }
}

/// Flat summary of a scene for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneInfo {
    pub id: String,
    pub datetime: Option<String>,
    pub cloud_cover: Option<f64>,
    pub platform: Option<String>,
    pub bbox: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<SceneItem>,
}

/// Items returned by one search, in catalog order.
#[derive(Debug, Clone)]
pub struct SceneCollection {
    satellite: Satellite,
    items: Vec<SceneItem>,
    geometry: Option<Geometry>,
}

impl SceneCollection {
    pub fn new(satellite: Satellite, items: Vec<SceneItem>, geometry: Option<Geometry>) -> Self {
        Self {
            satellite,
            items,
            geometry,
        }
    }

    /// Parses a STAC `FeatureCollection` response body.
    pub fn from_feature_collection(
        satellite: Satellite,
        body: &str,
        geometry: Option<Geometry>,
    ) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(body)?;
        Ok(Self::new(satellite, collection.features, geometry))
    }

    pub fn satellite(&self) -> Satellite {
        self.satellite
    }

    pub fn collection_id(&self) -> &'static str {
        self.satellite.collection_id()
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Result<&SceneItem> {
        if self.items.is_empty() {
            return Err(Error::NoItems);
        }
        self.items.get(index).ok_or(Error::ItemOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    pub fn item_info(&self, index: usize) -> Option<SceneInfo> {
        self.items.get(index).map(|item| SceneInfo {
            id: item.id.clone(),
            datetime: item.properties.datetime.map(|dt| dt.to_rfc3339()),
            cloud_cover: item.properties.cloud_cover,
            platform: item.properties.platform.clone(),
            bbox: item.bbox.clone(),
        })
    }

    /// Computes `index` for the item at `item_index`.
    ///
    /// Bands are clipped to the collection's geometry and read onto the
    /// finest grid among them, so mixed 10 m and 20 m bands line up.
    pub fn compute(
        &self,
        index: &str,
        item_index: usize,
        evaluator: &Evaluator<'_>,
        loader: &dyn RasterLoader,
    ) -> Result<IndexResult> {
        let item = self.item(item_index)?;
        let required = required_bands(evaluator.registry(), index)?;
        let labels = resolve(&self.satellite.band_map(), required)?;

        let grids = labels
            .values()
            .map(|label| loader.grid(&item.id, label, self.geometry.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let target = grids
            .into_iter()
            .min_by(|a, b| a.pixel_area().total_cmp(&b.pixel_area()))
            .ok_or_else(|| Error::InvalidDefinition {
                name: index.to_string(),
                reason: "no bands declared".to_string(),
            })?;

        debug!(scene = %item.id, index, ?labels, size = ?target.size, "loading bands");
        let bands = labels
            .iter()
            .map(|(role, label)| loader.load(&item.id, label, &target).map(|band| (*role, band)))
            .collect::<Result<HashMap<_, _>>>()?;

        evaluator.evaluate(index, &bands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_search_body_for_sentinel2() {
        let request = SearchRequest::new(
            Satellite::sentinel2("2A").unwrap(),
            date("2024-01-01"),
            date("2024-01-31"),
            Geometry::sample_square(77.0, 23.0, 0.05),
        )
        .unwrap()
        .cloud_cover(20);

        let body: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(body["collections"], json!(["sentinel-2-l2a"]));
        assert_eq!(body["datetime"], "2024-01-01/2024-01-31");
        assert_eq!(body["intersects"]["type"], "Polygon");
        assert_eq!(body["query"]["eo:cloud_cover"], json!({ "lt": 20 }));
        assert_eq!(body["query"]["platform"], json!({ "eq": "Sentinel-2A" }));
    }

    #[test]
    fn test_search_body_without_filters() {
        let request = SearchRequest::new(
            Satellite::Landsat8,
            date("2024-01-01"),
            date("2024-01-01"),
            Geometry::sample_square(0.0, 0.0, 1.0),
        )
        .unwrap();
        let body: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(body["collections"], json!(["landsat-8-c2-l2"]));
        assert!(body.get("query").is_none());
    }

    #[test]
    fn test_search_rejects_reversed_dates() {
        let result = SearchRequest::new(
            Satellite::Landsat8,
            date("2024-02-01"),
            date("2024-01-01"),
            Geometry::sample_square(0.0, 0.0, 1.0),
        );
        assert!(matches!(result, Err(Error::InvalidDateRange { .. })));
    }

    #[test]
    fn test_scene_collection_from_stac_response() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": "S2A_MSIL2A_20240105",
                    "bbox": [76.9, 22.9, 77.1, 23.1],
                    "properties": {
                        "datetime": "2024-01-05T05:21:11Z",
                        "eo:cloud_cover": 3.5,
                        "platform": "Sentinel-2A"
                    }
                },
                { "type": "Feature", "id": "S2A_MSIL2A_20240115", "properties": {} }
            ]
        }"#;
        let scenes =
            SceneCollection::from_feature_collection(Satellite::sentinel2("2A").unwrap(), body, None)
                .unwrap();

        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes.collection_id(), "sentinel-2-l2a");

        let info = scenes.item_info(0).unwrap();
        assert_eq!(info.id, "S2A_MSIL2A_20240105");
        assert_eq!(info.cloud_cover, Some(3.5));
        assert_eq!(info.platform.as_deref(), Some("Sentinel-2A"));
        assert_eq!(info.datetime.as_deref(), Some("2024-01-05T05:21:11+00:00"));

        let bare = scenes.item_info(1).unwrap();
        assert_eq!(bare.datetime, None);
        assert_eq!(bare.bbox, None);

        assert_eq!(scenes.item_info(2), None);
        assert!(matches!(
            scenes.item(2),
            Err(Error::ItemOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_empty_collection() {
        let scenes = SceneCollection::new(Satellite::Landsat8, vec![], None);
        assert!(matches!(scenes.item(0), Err(Error::NoItems)));
    }

    /// Catalog that answers every search with a fixed body
    struct CannedCatalog(&'static str);

    impl CatalogSearch for CannedCatalog {
        fn search(&self, request: &SearchRequest) -> Result<SceneCollection> {
            SceneCollection::from_feature_collection(
                request.satellite(),
                self.0,
                Some(request.geometry().clone()),
            )
        }
    }

    #[test]
    fn test_catalog_search_keeps_request_context() {
        let catalog = CannedCatalog(r#"{ "type": "FeatureCollection", "features": [ { "id": "LC08_1" } ] }"#);
        let request = SearchRequest::new(
            Satellite::Landsat8,
            date("2024-03-01"),
            date("2024-03-31"),
            Geometry::sample_square(-120.0, 38.0, 0.1),
        )
        .unwrap();

        let scenes = catalog.search(&request).unwrap();
        assert_eq!(scenes.collection_id(), "landsat-8-c2-l2");
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes.item(0).unwrap().id, "LC08_1");
    }
}
