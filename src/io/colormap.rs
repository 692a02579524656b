// src/io/colormap.rs
//! Colour ramps for PNG export.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A colour stop: position in [0, 1] mapped to an RGB colour.
#[derive(Debug, Clone, Copy)]
struct ColorStop {
    t: f64,
    rgb: [u8; 3],
}

const fn stop(t: f64, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop { t, rgb: [r, g, b] }
}

const VIRIDIS_STOPS: &[ColorStop] = &[
    stop(0.00, 68, 1, 84),
    stop(0.25, 59, 82, 139),
    stop(0.50, 33, 145, 140),
    stop(0.75, 94, 201, 98),
    stop(1.00, 253, 231, 37),
];

const NDVI_STOPS: &[ColorStop] = &[
    stop(0.0, 120, 70, 20),
    stop(0.3, 200, 170, 60),
    stop(0.5, 240, 230, 100),
    stop(0.7, 100, 180, 50),
    stop(1.0, 10, 100, 20),
];

const WATER_STOPS: &[ColorStop] = &[
    stop(0.00, 240, 249, 255),
    stop(0.25, 186, 228, 250),
    stop(0.50, 80, 180, 230),
    stop(0.75, 30, 120, 200),
    stop(1.00, 8, 48, 107),
];

const DIVERGENT_STOPS: &[ColorStop] = &[
    stop(0.00, 44, 62, 180),
    stop(0.25, 120, 160, 220),
    stop(0.50, 240, 240, 240),
    stop(0.75, 220, 120, 80),
    stop(1.00, 180, 30, 30),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    #[default]
    Viridis,
    Grayscale,
    Ndvi,
    Water,
    Divergent,
}

impl Colormap {
    pub const ALL: [Colormap; 5] = [
        Colormap::Viridis,
        Colormap::Grayscale,
        Colormap::Ndvi,
        Colormap::Water,
        Colormap::Divergent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Viridis => "viridis",
            Colormap::Grayscale => "gray",
            Colormap::Ndvi => "ndvi",
            Colormap::Water => "water",
            Colormap::Divergent => "divergent",
        }
    }

    /// Colour at normalized position `t`; values outside [0, 1] take the end colours.
    pub fn evaluate(&self, t: f64) -> [u8; 3] {
        match self {
            Colormap::Grayscale => {
                let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
                [v, v, v]
            }
            Colormap::Viridis => multi_stop(VIRIDIS_STOPS, t),
            Colormap::Ndvi => multi_stop(NDVI_STOPS, t),
            Colormap::Water => multi_stop(WATER_STOPS, t),
            Colormap::Divergent => multi_stop(DIVERGENT_STOPS, t),
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gray" | "grey" | "grayscale" => Ok(Colormap::Grayscale),
            name => Colormap::ALL
                .into_iter()
                .find(|map| map.name() == name)
                .ok_or_else(|| Error::UnknownColormap(s.to_string())),
        }
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

fn multi_stop(stops: &[ColorStop], t: f64) -> [u8; 3] {
    if t.is_nan() || t <= stops[0].t {
        return stops[0].rgb;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let ratio = (t - lo.t) / (hi.t - lo.t);
            return [
                lerp(lo.rgb[0], hi.rgb[0], ratio),
                lerp(lo.rgb[1], hi.rgb[1], ratio),
                lerp(lo.rgb[2], hi.rgb[2], ratio),
            ];
        }
    }
    stops[stops.len() - 1].rgb
}
