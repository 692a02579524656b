// src/bands.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Logical spectral channel, independent of how a satellite labels it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BandRole {
    Red,
    Green,
    Blue,
    Nir,
    Swir,
}

impl BandRole {
    pub const ALL: [BandRole; 5] = [
        BandRole::Red,
        BandRole::Green,
        BandRole::Blue,
        BandRole::Nir,
        BandRole::Swir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BandRole::Red => "RED",
            BandRole::Green => "GREEN",
            BandRole::Blue => "BLUE",
            BandRole::Nir => "NIR",
            BandRole::Swir => "SWIR",
        }
    }
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BandRole::ALL
            .iter()
            .copied()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownBandRole(s.to_string()))
    }
}
