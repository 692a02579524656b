// src/satellite.rs
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bands::BandRole;
use crate::error::{Error, Result};

const SENTINEL2_BANDS: [(BandRole, &str); 5] = [
    (BandRole::Red, "B04"),
    (BandRole::Green, "B03"),
    (BandRole::Blue, "B02"),
    (BandRole::Nir, "B08"),
    (BandRole::Swir, "B11"),
];

const LANDSAT8_BANDS: [(BandRole, &str); 5] = [
    (BandRole::Red, "red"),
    (BandRole::Green, "green"),
    (BandRole::Blue, "blue"),
    (BandRole::Nir, "nir08"),
    (BandRole::Swir, "swir16"),
];

/// Which Sentinel-2 platforms a search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sentinel2Product {
    #[default]
    #[serde(rename = "2A")]
    S2A,
    #[serde(rename = "2B")]
    S2B,
    #[serde(rename = "2C")]
    S2C,
    #[serde(rename = "all")]
    All,
}

impl Sentinel2Product {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel2Product::S2A => "2A",
            Sentinel2Product::S2B => "2B",
            Sentinel2Product::S2C => "2C",
            Sentinel2Product::All => "all",
        }
    }
}

impl fmt::Display for Sentinel2Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentinel2Product {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "2A" => Ok(Sentinel2Product::S2A),
            "2B" => Ok(Sentinel2Product::S2B),
            "2C" => Ok(Sentinel2Product::S2C),
            "ALL" => Ok(Sentinel2Product::All),
            _ => Err(Error::InvalidProduct(s.to_string())),
        }
    }
}

/// Band role to satellite band label, checked once when built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMap {
    satellite: String,
    labels: BTreeMap<BandRole, String>,
}

impl BandMap {
    /// Build a band map from explicit labels.
    ///
    /// Fails when a label is blank or when two roles share a label, since
    /// either would load the wrong data without any later error.
    pub fn new<I, S>(satellite: &str, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (BandRole, S)>,
        S: Into<String>,
    {
        let labels: BTreeMap<BandRole, String> = labels
            .into_iter()
            .map(|(role, label)| (role, label.into()))
            .collect();

        let invalid = |reason: String| Error::InvalidBandMap {
            satellite: satellite.to_string(),
            reason,
        };

        if labels.is_empty() {
            return Err(invalid("no bands defined".to_string()));
        }

        let mut seen = HashSet::new();
        for (role, label) in &labels {
            if label.trim().is_empty() {
                return Err(invalid(format!("empty label for {role}")));
            }
            if !seen.insert(label.as_str()) {
                return Err(invalid(format!("label {label} is used by more than one role")));
            }
        }

        Ok(Self {
            satellite: satellite.to_string(),
            labels,
        })
    }

    fn from_table(satellite: &str, table: &[(BandRole, &str)]) -> Self {
        Self {
            satellite: satellite.to_string(),
            labels: table
                .iter()
                .map(|(role, label)| (*role, label.to_string()))
                .collect(),
        }
    }

    pub fn satellite(&self) -> &str {
        &self.satellite
    }

    pub fn label(&self, role: BandRole) -> Option<&str> {
        self.labels.get(&role).map(String::as_str)
    }

    pub fn roles(&self) -> impl Iterator<Item = BandRole> + '_ {
        self.labels.keys().copied()
    }
}

/// A satellite collection on the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satellite {
    Sentinel2 { product: Sentinel2Product },
    Landsat8,
}

impl Satellite {
    /// Sentinel-2 restricted to `product` ("2A", "2B", "2C" or "all").
    pub fn sentinel2(product: &str) -> Result<Self> {
        Ok(Satellite::Sentinel2 {
            product: product.parse()?,
        })
    }

    /// Parses `name`, applying `product` to Sentinel-2.
    pub fn from_name(name: &str, product: Option<&str>) -> Result<Self> {
        match (name.parse::<Satellite>()?, product) {
            (Satellite::Sentinel2 { .. }, Some(product)) => Satellite::sentinel2(product),
            (Satellite::Landsat8, Some(product)) => Err(Error::InvalidProduct(product.to_string())),
            (satellite, None) => Ok(satellite),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Satellite::Sentinel2 { .. } => "Sentinel-2",
            Satellite::Landsat8 => "Landsat-8",
        }
    }

    /// STAC collection id on the catalog.
    pub fn collection_id(&self) -> &'static str {
        match self {
            Satellite::Sentinel2 { .. } => "sentinel-2-l2a",
            Satellite::Landsat8 => "landsat-8-c2-l2",
        }
    }

    pub fn band_map(&self) -> BandMap {
        match self {
            Satellite::Sentinel2 { .. } => BandMap::from_table(self.name(), &SENTINEL2_BANDS),
            Satellite::Landsat8 => BandMap::from_table(self.name(), &LANDSAT8_BANDS),
        }
    }

    /// Value for the `platform` query property, when searches are restricted.
    pub fn platform_filter(&self) -> Option<String> {
        match self {
            Satellite::Sentinel2 {
                product: Sentinel2Product::All,
            }
            | Satellite::Landsat8 => None,
            Satellite::Sentinel2 { product } => Some(format!("Sentinel-{product}")),
        }
    }
}

impl fmt::Display for Satellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Satellite::Sentinel2 { product } => write!(f, "{} ({product})", self.name()),
            Satellite::Landsat8 => f.write_str(self.name()),
        }
    }
}

impl FromStr for Satellite {
    type Err = Error;

    /// Parses a satellite name; Sentinel-2 defaults to the 2A product.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sentinel-2" | "sentinel2" | "s2" | "sentinel-2-l2a" => Ok(Satellite::Sentinel2 {
                product: Sentinel2Product::default(),
            }),
            "landsat-8" | "landsat8" | "l8" | "landsat-8-c2-l2" => Ok(Satellite::Landsat8),
            _ => Err(Error::UnknownSatellite(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel2_products() {
        for product in ["2A", "2B", "2C", "all"] {
            let sat = Satellite::sentinel2(product).unwrap();
            assert_eq!(sat.collection_id(), "sentinel-2-l2a");
            match sat {
                Satellite::Sentinel2 { product: p } => assert_eq!(p.as_str(), product),
                _ => panic!("expected Sentinel-2"),
            }
        }

        for invalid in ["invalid", "3A", ""] {
            assert!(matches!(
                Satellite::sentinel2(invalid),
                Err(Error::InvalidProduct(_))
            ));
        }
    }

    #[test]
    fn test_collection_ids() {
        assert_eq!(Satellite::Landsat8.collection_id(), "landsat-8-c2-l2");
        assert_eq!(
            "s2".parse::<Satellite>().unwrap(),
            Satellite::Sentinel2 {
                product: Sentinel2Product::S2A
            }
        );
        assert!(matches!(
            "modis".parse::<Satellite>(),
            Err(Error::UnknownSatellite(_))
        ));
    }

    #[test]
    fn test_from_name_with_product() {
        assert_eq!(
            Satellite::from_name("sentinel-2", Some("2C")).unwrap(),
            Satellite::Sentinel2 {
                product: Sentinel2Product::S2C
            }
        );
        assert_eq!(Satellite::from_name("landsat8", None).unwrap(), Satellite::Landsat8);
        assert!(matches!(
            Satellite::from_name("landsat8", Some("2A")),
            Err(Error::InvalidProduct(_))
        ));
    }

    #[test]
    fn test_platform_filter() {
        assert_eq!(
            Satellite::sentinel2("2B").unwrap().platform_filter().as_deref(),
            Some("Sentinel-2B")
        );
        assert_eq!(Satellite::sentinel2("all").unwrap().platform_filter(), None);
        assert_eq!(Satellite::Landsat8.platform_filter(), None);
    }

    #[test]
    fn test_builtin_band_maps_are_valid() {
        for (name, table) in [("Sentinel-2", SENTINEL2_BANDS), ("Landsat-8", LANDSAT8_BANDS)] {
            let checked = BandMap::new(name, table).unwrap();
            assert_eq!(checked, BandMap::from_table(name, &table));
        }

        let s2 = Satellite::sentinel2("all").unwrap().band_map();
        assert_eq!(s2.label(BandRole::Nir), Some("B08"));
        assert_eq!(s2.label(BandRole::Swir), Some("B11"));

        let l8 = Satellite::Landsat8.band_map();
        assert_eq!(l8.label(BandRole::Nir), Some("nir08"));
        assert_eq!(l8.label(BandRole::Swir), Some("swir16"));
    }

    #[test]
    fn test_band_map_validation() {
        assert!(matches!(
            BandMap::new("fake", [(BandRole::Red, "B1"), (BandRole::Nir, "B1")]),
            Err(Error::InvalidBandMap { .. })
        ));
        assert!(matches!(
            BandMap::new("fake", [(BandRole::Red, " ")]),
            Err(Error::InvalidBandMap { .. })
        ));
        assert!(matches!(
            BandMap::new("fake", Vec::<(BandRole, String)>::new()),
            Err(Error::InvalidBandMap { .. })
        ));
    }
}
