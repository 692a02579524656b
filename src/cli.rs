// src/cli.rs
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "observe-earth")]
#[command(about = "Spectral indices from satellite scenes", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the registered indices and the band roles they read
    Indices,

    /// Show the satellite band labels an index resolves to
    Bands {
        /// Index name (NDVI, NDWI, NDBI)
        #[arg(short, long)]
        index: String,

        /// Satellite (sentinel-2, landsat-8)
        #[arg(short, long, default_value = "sentinel-2")]
        satellite: String,

        /// Sentinel-2 product (2A, 2B, 2C, all)
        #[arg(short, long)]
        product: Option<String>,
    },

    /// Print the STAC search body for a satellite, date range and area
    Search {
        /// Satellite (sentinel-2, landsat-8)
        #[arg(short, long, default_value = "sentinel-2")]
        satellite: String,

        /// Sentinel-2 product (2A, 2B, 2C, all)
        #[arg(short, long)]
        product: Option<String>,

        /// First acquisition day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last acquisition day (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// GeoJSON polygon file
        #[arg(short, long)]
        geometry: PathBuf,

        /// Keep scenes with cloud cover below this percentage
        #[arg(long)]
        cloud_cover: Option<u8>,
    },

    /// Compute an index for a scene on disk and export it
    Compute {
        /// Index name (NDVI, NDWI, NDBI)
        #[arg(short, long)]
        index: String,

        /// Satellite (sentinel-2, landsat-8)
        #[arg(short, long, default_value = "sentinel-2")]
        satellite: String,

        /// Sentinel-2 product (2A, 2B, 2C, all)
        #[arg(short, long)]
        product: Option<String>,

        /// Scene id; bands are read from <data-dir>/<scene>/<label>.tif
        #[arg(long)]
        scene: String,

        /// Directory holding downloaded scenes
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// GeoJSON polygon to clip to, in lon/lat (EPSG:4326)
        #[arg(short, long)]
        geometry: Option<PathBuf>,

        /// Output file path
        #[arg(short, long, default_value = "output.tif")]
        output: PathBuf,

        /// Output format (tiff, png)
        #[arg(short, long, default_value = "tiff")]
        format: String,

        /// Lower bound of the PNG colour scale
        #[arg(long)]
        min: Option<f32>,

        /// Upper bound of the PNG colour scale
        #[arg(long)]
        max: Option<f32>,

        /// PNG colormap (viridis, gray, ndvi, water, divergent)
        #[arg(long, default_value = "viridis")]
        colormap: String,

        /// Use float32 instead of int16
        #[arg(long)]
        float: bool,

        /// Scaling factor for fixed-point (1 to 10000)
        #[arg(long, default_value = "10000", value_parser = clap::value_parser!(i32).range(1..=10000))]
        scale_factor: i32,
    },

    /// Run the compute operations listed in a JSON file
    Batch {
        /// Batch configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Write the per-operation report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compute_defaults() {
        let cli = Cli::parse_from([
            "observe-earth",
            "compute",
            "--index",
            "ndvi",
            "--scene",
            "S2A_T43QBF",
        ]);
        assert!(!cli.verbose);
        match cli.command {
            Commands::Compute {
                index,
                satellite,
                output,
                format,
                float,
                scale_factor,
                ..
            } => {
                assert_eq!(index, "ndvi");
                assert_eq!(satellite, "sentinel-2");
                assert_eq!(output, PathBuf::from("output.tif"));
                assert_eq!(format, "tiff");
                assert!(!float);
                assert_eq!(scale_factor, 10000);
            }
            _ => panic!("expected compute"),
        }
    }

    #[test]
    fn rejects_scale_factor_outside_int16_range() {
        for value in ["0", "10001"] {
            let parsed = Cli::try_parse_from([
                "observe-earth",
                "compute",
                "--index",
                "ndvi",
                "--scene",
                "S2A_T43QBF",
                "--scale-factor",
                value,
            ]);
            assert!(parsed.is_err(), "scale factor {value} was accepted");
        }
    }

    #[test]
    fn parses_search_dates() {
        let cli = Cli::parse_from([
            "observe-earth",
            "-v",
            "search",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--geometry",
            "aoi.geojson",
            "--cloud-cover",
            "20",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Search {
                start, cloud_cover, ..
            } => {
                assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
                assert_eq!(cloud_cover, Some(20));
            }
            _ => panic!("expected search"),
        }
    }
}
