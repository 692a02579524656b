// src/utils/mod.rs
pub mod cache;
pub mod fixed_point;
pub mod geometry;

pub use cache::RasterCache;
pub use geometry::Geometry;
