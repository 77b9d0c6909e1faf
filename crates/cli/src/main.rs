use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use objdet_core::detection::domain::detector_adapter::DetectorStatus;
use objdet_core::detection::infrastructure::detector_factory::create_detector;
use objdet_core::imaging::domain::image_writer::ImageWriter;
use objdet_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use objdet_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use objdet_core::pipeline::detect_image_use_case::{DetectImageUseCase, DetectionReport};
use objdet_core::rendering::box_renderer::BoxRenderer;
use objdet_core::shared::constants::IMAGE_EXTENSIONS;
use objdet_core::shared::detector_config::DetectorConfig;

/// Object detection on images with a YOLO ONNX model.
#[derive(Parser, Debug)]
#[command(name = "objdet")]
struct Cli {
    /// Input image files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// ONNX weights file [default: weights/best.onnx].
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Minimum detection confidence (0.0-1.0) [default: 0.4].
    #[arg(long)]
    confidence: Option<f32>,

    /// IoU threshold for suppressing overlapping boxes (0.0-1.0) [default: 0.6].
    #[arg(long)]
    iou: Option<f32>,

    /// JSON detector config; explicit flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write annotated copies of the inputs to this directory.
    #[arg(long)]
    annotate_dir: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    let detector = create_detector(&config);
    if detector.status() == DetectorStatus::Disabled {
        log::warn!(
            "Model {} is unavailable; every image will report no detections",
            config.weights_path.display()
        );
    }

    let annotator = cli.annotate_dir.as_ref().map(|_| {
        let writer: Box<dyn ImageWriter> = Box::new(ImageFileWriter::new());
        (BoxRenderer::default(), writer)
    });
    let mut use_case =
        DetectImageUseCase::new(Box::new(ImageFileReader::new()), Box::new(detector), annotator);

    let annotated: Vec<Option<PathBuf>> = match cli.annotate_dir.as_deref() {
        Some(dir) => annotated_paths(dir, &cli.inputs)
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; cli.inputs.len()],
    };

    let mut reports: Vec<DetectionReport> = Vec::with_capacity(cli.inputs.len());
    for (input, annotated) in cli.inputs.iter().zip(annotated) {
        let report = use_case.execute(input, annotated.as_deref())?;
        log::info!(
            "{}: {} detections",
            input.display(),
            report.detections.len()
        );
        reports.push(report);
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };
    println!("{json}");
    Ok(())
}

fn build_config(cli: &Cli) -> Result<DetectorConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(weights) = &cli.weights {
        config.weights_path = weights.clone();
    }
    if let Some(confidence) = cli.confidence {
        config.confidence_threshold = confidence;
    }
    if let Some(iou) = cli.iou {
        config.iou_threshold = iou;
    }
    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            return Err(format!(
                "Unsupported input {}; expected one of: {}",
                input.display(),
                IMAGE_EXTENSIONS.join(", ")
            )
            .into());
        }
    }
    if let Some(c) = cli.confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    if let Some(iou) = cli.iou {
        if !(0.0..=1.0).contains(&iou) {
            return Err(format!("IoU must be between 0.0 and 1.0, got {iou}").into());
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// `<stem>_detections.png` per input; repeated stems get `_1`, `_2`, ...
/// appended so no two inputs share an output file.
fn annotated_paths(dir: &Path, inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let mut name = format!("{stem}_detections.png");
            let mut n = 1;
            while !taken.insert(name.clone()) {
                name = format!("{stem}_{n}_detections.png");
                n += 1;
            }
            dir.join(name)
        })
        .collect()
}
