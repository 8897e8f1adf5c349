//! spotcheck - run one detection pass over a single image
//!
//! Prints the frame result as JSON on stdout; optionally writes an
//! annotated copy of the image.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;

use lotwatch::{
    DetectionPipeline, DetectorSettings, Device, FrameAnnotator, OverlayAnnotator, RgbFrame,
    ZoneRegistry,
};

#[cfg(not(feature = "backend-tract"))]
use lotwatch::StubModel;
#[cfg(feature = "backend-tract")]
use lotwatch::TractModel;

#[derive(Parser, Debug)]
#[command(name = "spotcheck", about = "Single-image parking occupancy check")]
struct Args {
    /// Image to analyze.
    #[arg(long)]
    image: PathBuf,

    /// Zone definition JSON file.
    #[arg(long, env = "LOTWATCH_ZONES_PATH")]
    zones: PathBuf,

    /// Detection model file.
    #[arg(long, env = "LOTWATCH_MODEL_PATH", default_value = "models/best.onnx")]
    model: String,

    #[arg(long)]
    car_confidence: Option<f32>,

    #[arg(long)]
    free_confidence: Option<f32>,

    #[arg(long)]
    general_confidence: Option<f32>,

    #[arg(long, default_value = "cpu")]
    device: Device,

    /// Write an annotated copy of the image here.
    #[arg(long)]
    annotate: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let mut settings = DetectorSettings {
        device: args.device,
        ..DetectorSettings::default()
    };
    if let Some(v) = args.car_confidence {
        settings.car_confidence = v;
    }
    if let Some(v) = args.free_confidence {
        settings.free_confidence = v;
    }
    if let Some(v) = args.general_confidence {
        settings.general_confidence = v;
    }

    let registry = ZoneRegistry::from_json_file(&args.zones)?;

    #[cfg(feature = "backend-tract")]
    let model = Arc::new(Mutex::new(TractModel::new(&args.model, settings.image_size)?));
    #[cfg(not(feature = "backend-tract"))]
    let model = {
        log::warn!("no inference backend compiled in; using the stub model");
        Arc::new(Mutex::new(StubModel::empty()))
    };

    let mut pipeline = DetectionPipeline::new(registry, model, settings)?;

    let image = image::open(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?
        .to_rgb8();
    let frame = RgbFrame::from_image(image.clone());

    let result = pipeline.detect(&frame)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(out) = args.annotate {
        let mut annotated = image;
        OverlayAnnotator::new().annotate(&mut annotated, &result.spots, &result.summary);
        annotated
            .save(&out)
            .with_context(|| format!("failed to write annotated image {}", out.display()))?;
        log::info!("annotated image written to {}", out.display());
    }

    Ok(())
}
