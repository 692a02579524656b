// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use observe_earth::batch::process_batch;
use observe_earth::catalog::{SceneCollection, SceneItem, SearchRequest};
use observe_earth::cli::{Cli, Commands};
use observe_earth::io::{self, Colormap, ExportFormat, GdalLoader, GeoTiffExporter, PngExporter};
use observe_earth::processing::{required_bands, resolve, Evaluator, IndexRegistry};
use observe_earth::satellite::Satellite;
use observe_earth::utils::geometry::Geometry;

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let registry = IndexRegistry::with_defaults();

    match cli.command {
        Commands::Indices => {
            for index in registry.iter() {
                let (min, max) = index.valid_range();
                println!(
                    "{:<6} bands: {:<12} range: [{min}, {max}]",
                    index.name(),
                    index.required_bands().iter().join(", ")
                );
            }
        }

        Commands::Bands {
            index,
            satellite,
            product,
        } => {
            let satellite = Satellite::from_name(&satellite, product.as_deref())?;
            let required = required_bands(&registry, &index)?;
            let labels = resolve(&satellite.band_map(), required)?;

            println!("{} on {satellite}:", index.to_uppercase());
            for role in required {
                if let Some(label) = labels.get(role) {
                    println!("  {:<5} -> {label}", role.as_str());
                }
            }
        }

        Commands::Search {
            satellite,
            product,
            start,
            end,
            geometry,
            cloud_cover,
        } => {
            let satellite = Satellite::from_name(&satellite, product.as_deref())?;
            let geometry = Geometry::from_file(&geometry)
                .with_context(|| format!("reading geometry {}", geometry.display()))?;

            let mut request = SearchRequest::new(satellite, start, end, geometry)?;
            if let Some(max) = cloud_cover {
                request = request.cloud_cover(max);
            }
            println!("{}", request.to_json()?);
        }

        Commands::Compute {
            index,
            satellite,
            product,
            scene,
            data_dir,
            geometry,
            output,
            format,
            min,
            max,
            colormap,
            float,
            scale_factor,
        } => {
            let satellite = Satellite::from_name(&satellite, product.as_deref())?;
            let format: ExportFormat = format.parse()?;
            let colormap: Colormap = colormap.parse()?;
            let geometry = geometry
                .map(|path| {
                    Geometry::from_file(&path).with_context(|| format!("reading geometry {}", path.display()))
                })
                .transpose()?;

            let loader = GdalLoader::new(&data_dir);
            let evaluator = Evaluator::new(&registry);
            let scenes = SceneCollection::new(satellite, vec![SceneItem::new(&scene)], geometry);
            let result = scenes
                .compute(&index, 0, &evaluator, &loader)
                .with_context(|| format!("computing {index} for {scene}"))?;

            let geotiff = GeoTiffExporter {
                fixed_point: !float,
                scale_factor,
                ..Default::default()
            };
            let png = PngExporter::new(min, max, colormap);
            io::export(&result, format, &output, &geotiff, &png)
                .with_context(|| format!("exporting {}", output.display()))?;

            let stats = result.statistics();
            match stats.mean {
                Some(mean) => println!("Mean {}: {mean:.4}", result.name()),
                None => println!("Mean {}: no valid pixels", result.name()),
            }
            println!(
                "Valid pixels: {}, no-data: {}, out of range: {}",
                stats.valid,
                stats.no_data,
                result.out_of_range_count()
            );
            println!("Processing complete: {}", output.display());
        }

        Commands::Batch { config, report } => {
            process_batch(&config, report.as_deref())?;
        }
    }

    Ok(())
}
