//! Command-line evaluator: computes mAP for a detections file against an
//! annotation file.

use anyhow::Context;
use clap::Parser;
use map_eval::detector::{collect_detections, DetectionFile};
use map_eval::evaluator::evaluate;
use map_eval::loader::load_annotations;
use map_eval::registry::ClassRegistry;
use map_eval::report::{render_table, ResultWriter};
use map_eval::stats::DatasetStats;
use map_eval::threshold::filter_by_score;
use map_eval::types::{ApMethod, Detection};
use map_eval::EvalConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "map-eval")]
#[command(version, about = "Compute mAP of a detector's output on an annotated dataset")]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Path to class definitions, one name per line
    #[arg(long)]
    classes_path: Option<PathBuf>,

    /// Annotation txt file to verify against
    #[arg(long)]
    annotation_file: Option<PathBuf>,

    /// Detections txt file (annotation layout with a trailing score per box)
    #[arg(long)]
    detections_file: Option<PathBuf>,

    /// IoU threshold for a detection to count as a true positive
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Drop detections scoring at or below this value
    #[arg(long)]
    score_threshold: Option<f64>,

    /// AP integration: envelope or interpolated101
    #[arg(long)]
    ap_method: Option<ApMethod>,

    /// Reuse a previously trained detector artifact
    #[arg(long)]
    resume: bool,

    /// Save the report and raw detections under the result directory
    #[arg(long)]
    save_result: bool,

    /// Directory for saved results
    #[arg(long)]
    result_dir: Option<PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(EvalConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => EvalConfig::from_file(path)?,
            None => EvalConfig::default(),
        };

        if let Some(path) = self.classes_path {
            config.classes_path = path;
        }
        if self.annotation_file.is_some() {
            config.annotation_file = self.annotation_file;
        }
        if self.detections_file.is_some() {
            config.detections_file = self.detections_file;
        }
        if let Some(iou) = self.iou_threshold {
            config.iou_threshold = iou;
        }
        if self.score_threshold.is_some() {
            config.score_threshold = self.score_threshold;
        }
        if let Some(method) = self.ap_method {
            config.ap_method = method;
        }
        if let Some(dir) = self.result_dir {
            config.result_dir = dir;
        }
        config.resume |= self.resume;
        config.save_result |= self.save_result;

        config.validate()?;
        Ok((config, self.json))
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, json) = cli.into_config()?;

    let registry = ClassRegistry::load(&config.classes_path)
        .with_context(|| format!("loading classes from {}", config.classes_path.display()))?;
    let annotations = load_annotations(config.annotation_path()?, &registry)?;

    let mut detector = DetectionFile::open(config.detections_path()?, config.adapter_options())?;
    let orphans = detector.orphan_images(&annotations);
    if !orphans.is_empty() {
        warn!(count = orphans.len(), "detections for images without annotations are ignored");
    }
    let detections = collect_detections(&mut detector, &annotations, &registry)?;
    let detections = apply_score_threshold(detections, config.score_threshold)?;

    DatasetStats::collect(&annotations, &detections, &registry).log_summary();

    let report = evaluate(&registry, &annotations, &detections, &config.eval_options())?;

    if config.save_result {
        let writer = ResultWriter::new(&config.result_dir);
        writer.write_report(&report)?;
        writer.write_detections(&detections)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_table(&report));
        println!("mAP result: {:.4}", report.mean);
    }

    info!(map = report.mean, "done");
    Ok(())
}

/// Detections that take part in the evaluation; stats and saved results
/// describe this set.
fn apply_score_threshold(detections: Vec<Detection>, threshold: Option<f64>) -> map_eval::Result<Vec<Detection>> {
    match threshold {
        Some(threshold) => filter_by_score(&detections, threshold),
        None => Ok(detections),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
