// src/batch.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{SceneCollection, SceneItem};
use crate::io::{self, Colormap, ExportFormat, GdalLoader, GeoTiffExporter, PngExporter, RasterLoader};
use crate::processing::{Evaluator, IndexRegistry};
use crate::raster::{IndexResult, Statistics};
use crate::satellite::Satellite;
use crate::utils::geometry::Geometry;

#[derive(Deserialize, Serialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub operations: Vec<Operation>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GlobalParams {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,
    #[serde(default)]
    pub float: bool,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: i32,
    #[serde(default = "default_true")]
    pub tiled: bool,
    /// Worker threads; all CPUs when unset.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            compress: default_compress(),
            compress_level: default_compress_level(),
            float: false,
            scale_factor: default_scale_factor(),
            tiled: default_true(),
            threads: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_compress() -> String {
    "DEFLATE".to_string()
}

fn default_compress_level() -> u8 {
    6
}

fn default_scale_factor() -> i32 {
    10000
}

fn default_true() -> bool {
    true
}

fn default_satellite() -> String {
    "sentinel-2".to_string()
}

fn default_format() -> String {
    "tiff".to_string()
}

#[derive(Deserialize, Serialize, Debug)]
pub struct Operation {
    pub index: String,
    #[serde(default = "default_satellite")]
    pub satellite: String,
    pub product: Option<String>,
    pub scene: String,
    /// Inline GeoJSON polygon in lon/lat (EPSG:4326).
    pub geometry: Option<Geometry>,
    pub output: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub colormap: Option<String>,
    pub float: Option<bool>,
    pub scale_factor: Option<i32>,
    pub compress: Option<String>,
    pub compress_level: Option<u8>,
    pub tiled: Option<bool>,
}

impl Operation {
    /// GeoTIFF settings with this operation's overrides applied.
    pub fn geotiff_exporter(&self, global: &GlobalParams) -> GeoTiffExporter {
        GeoTiffExporter {
            fixed_point: !self.float.unwrap_or(global.float),
            scale_factor: self.scale_factor.unwrap_or(global.scale_factor),
            compress: self.compress.clone().unwrap_or_else(|| global.compress.clone()),
            compress_level: self.compress_level.unwrap_or(global.compress_level),
            tiled: self.tiled.unwrap_or(global.tiled),
        }
    }

    pub fn png_exporter(&self) -> Result<PngExporter> {
        let colormap = match &self.colormap {
            Some(name) => name.parse::<Colormap>()?,
            None => Colormap::default(),
        };
        Ok(PngExporter::new(self.min, self.max, colormap))
    }
}

/// Outcome of one operation.
#[derive(Serialize, Debug, Clone)]
pub struct OperationReport {
    pub index: String,
    pub scene: String,
    pub output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    pub out_of_range: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

pub fn load_config(config_path: &Path) -> Result<BatchConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("reading batch config {}", config_path.display()))?;
    let config: BatchConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("parsing batch config {}", config_path.display()))?;
    Ok(config)
}

/// Runs every operation on a pool of worker threads.
///
/// Returns one report per operation, in config order. A failing operation
/// only fails its own report.
pub fn run_batch(
    config: &BatchConfig,
    registry: &IndexRegistry,
    loader: &dyn RasterLoader,
) -> Result<Vec<OperationReport>> {
    let total = config.operations.len();
    let threads = config
        .global
        .threads
        .unwrap_or_else(num_cpus::get)
        .clamp(1, total.max(1));
    let evaluator = Evaluator::new(registry);

    let (job_tx, job_rx) = flume::unbounded::<(usize, &Operation)>();
    let (report_tx, report_rx) = flume::unbounded::<(usize, OperationReport)>();

    for job in config.operations.iter().enumerate() {
        job_tx
            .send(job)
            .map_err(|_| anyhow!("batch job queue closed"))?;
    }
    drop(job_tx);

    info!(operations = total, threads, "starting batch");

    thread::scope(|scope| {
        for _ in 0..threads {
            let job_rx = job_rx.clone();
            let report_tx = report_tx.clone();
            let global = &config.global;
            scope.spawn(move || {
                for (i, op) in job_rx.iter() {
                    let report = run_operation(op, global, &evaluator, loader);
                    match &report.error {
                        None => info!(
                            "[{}/{}] {} {} -> {}",
                            i + 1,
                            total,
                            op.index,
                            op.scene,
                            op.output.display()
                        ),
                        Some(e) => warn!("[{}/{}] {} {} failed: {e}", i + 1, total, op.index, op.scene),
                    }
                    if report_tx.send((i, report)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(report_tx);

    let mut reports: Vec<(usize, OperationReport)> = report_rx.iter().collect();
    reports.sort_by_key(|(i, _)| *i);
    Ok(reports.into_iter().map(|(_, report)| report).collect())
}

fn run_operation(
    op: &Operation,
    global: &GlobalParams,
    evaluator: &Evaluator<'_>,
    loader: &dyn RasterLoader,
) -> OperationReport {
    let mut report = OperationReport {
        index: op.index.clone(),
        scene: op.scene.clone(),
        output: op.output.clone(),
        statistics: None,
        out_of_range: 0,
        error: None,
    };

    match execute(op, global, evaluator, loader) {
        Ok(result) => {
            report.statistics = Some(result.statistics());
            report.out_of_range = result.out_of_range_count();
        }
        Err(e) => report.error = Some(format!("{e:#}")),
    }
    report
}

fn execute(
    op: &Operation,
    global: &GlobalParams,
    evaluator: &Evaluator<'_>,
    loader: &dyn RasterLoader,
) -> Result<IndexResult> {
    let satellite = Satellite::from_name(&op.satellite, op.product.as_deref())?;
    let format: ExportFormat = op.format.parse()?;
    let png = op.png_exporter()?;
    let geotiff = op.geotiff_exporter(global);
    if format == ExportFormat::Tiff {
        geotiff.validate()?;
    }

    let scenes = SceneCollection::new(satellite, vec![SceneItem::new(&op.scene)], op.geometry.clone());
    let result = scenes.compute(&op.index, 0, evaluator, loader)?;

    if let Some(parent) = op.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    io::export(&result, format, &op.output, &geotiff, &png)
        .with_context(|| format!("exporting {}", op.output.display()))?;

    Ok(result)
}

/// Loads the config, runs it against the scenes under `global.data_dir`
/// and prints a summary.
///
/// Fails after all operations have run if any of them failed.
pub fn process_batch(config_path: &Path, report_path: Option<&Path>) -> Result<Vec<OperationReport>> {
    let config = load_config(config_path)?;
    let registry = IndexRegistry::with_defaults();
    let loader = GdalLoader::new(&config.global.data_dir);

    println!("Starting batch processing with {} operations...", config.operations.len());
    let reports = run_batch(&config, &registry, &loader)?;

    for report in &reports {
        match (&report.statistics, &report.error) {
            (Some(stats), _) => println!(
                "  {} {} -> {} (mean: {})",
                report.index,
                report.scene,
                report.output.display(),
                stats
                    .mean
                    .map_or_else(|| "no valid pixels".to_string(), |m| format!("{m:.4}"))
            ),
            (None, Some(e)) => println!("  {} {} FAILED: {e}", report.index, report.scene),
            (None, None) => {}
        }
    }

    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&reports)?)
            .with_context(|| format!("writing batch report {}", path.display()))?;
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} operations failed", reports.len());
    }

    println!("Batch processing complete!");
    Ok(reports)
}
