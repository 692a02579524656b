// src/error.rs
use thiserror::Error;

use crate::bands::BandRole;

/// Errors raised by band resolution, index evaluation and the I/O collaborators.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Band {role} is not available from {source_name}")]
    MissingBand { role: BandRole, source_name: String },

    #[error("Band {role} was supplied but {index} does not use it")]
    UnexpectedBand { role: BandRole, index: String },

    #[error("Band {role} does not match {reference}: {detail}")]
    ShapeMismatch {
        role: BandRole,
        reference: BandRole,
        detail: String,
    },

    #[error("Pixel count {actual} does not match shape {shape:?}")]
    PixelCount { shape: (usize, usize), actual: usize },

    #[error("Index {0} is already registered")]
    DuplicateIndex(String),

    #[error("Invalid index definition {name}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Invalid band map for {satellite}: {reason}")]
    InvalidBandMap { satellite: String, reason: String },

    #[error("Invalid product: {0}. Must be one of 2A, 2B, 2C, all")]
    InvalidProduct(String),

    #[error("Unknown satellite: {0}")]
    UnknownSatellite(String),

    #[error("Unknown band role: {0}")]
    UnknownBandRole(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("No items available for computation")]
    NoItems,

    #[error("Item index {index} out of range. Available items: {len}")]
    ItemOutOfRange { index: usize, len: usize },

    #[error("Unsupported export type: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown colormap: {0}")]
    UnknownColormap(String),

    #[error("Invalid scale factor {0}: must be between 1 and 10000")]
    InvalidScaleFactor(i32),

    #[error("{0} is not in the CRS of the target grid")]
    CrsMismatch(String),

    #[error("Clip geometry does not intersect {0}")]
    EmptyClip(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
