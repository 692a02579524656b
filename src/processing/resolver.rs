// src/processing/resolver.rs
use std::collections::BTreeMap;

use crate::bands::BandRole;
use crate::error::{Error, Result};
use crate::processing::registry::IndexRegistry;
use crate::satellite::BandMap;

/// Band labels to load for one index, keyed by role.
pub type ResolvedBands = BTreeMap<BandRole, String>;

/// Bands the index reads, in the order its formula consumes them.
pub fn required_bands<'r>(registry: &'r IndexRegistry, index: &str) -> Result<&'r [BandRole]> {
    Ok(registry.get(index)?.required_bands())
}

/// Looks up the satellite label for every required role.
pub fn resolve(band_map: &BandMap, required: &[BandRole]) -> Result<ResolvedBands> {
    required
        .iter()
        .map(|&role| {
            band_map
                .label(role)
                .map(|label| (role, label.to_string()))
                .ok_or_else(|| Error::MissingBand {
                    role,
                    source_name: band_map.satellite().to_string(),
                })
        })
        .collect()
}
