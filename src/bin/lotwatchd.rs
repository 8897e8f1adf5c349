//! lotwatchd - parking occupancy daemon
//!
//! This daemon:
//! 1. Loads configuration (file + env) and the zone definitions
//! 2. Loads the detection model through the model registry cache
//! 3. Opens the configured video source
//! 4. Runs the sampled detection stream, logging each frame's summary
//! 5. Releases the source on shutdown, end-of-source, or error budget

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use lotwatch::{
    open_source, DetectionPipeline, LotwatchConfig, ModelKey, ModelRegistry, ZoneRegistry,
};

#[cfg(not(feature = "backend-tract"))]
use lotwatch::StubModel;
#[cfg(feature = "backend-tract")]
use lotwatch::TractModel;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = LotwatchConfig::load()?;
    log::info!(
        "lotwatchd starting: zones={}, model={}, source={}",
        cfg.zones_path,
        cfg.model_path,
        cfg.source
    );

    let registry = ZoneRegistry::from_json_file(&cfg.zones_path)?;

    let mut models = ModelRegistry::new();
    let key = ModelKey::new(cfg.model_path.clone(), cfg.detector.device);
    #[cfg(feature = "backend-tract")]
    let model = models.get_or_load(key, || {
        TractModel::new(&cfg.model_path, cfg.detector.image_size)
    })?;
    #[cfg(not(feature = "backend-tract"))]
    let model = {
        log::warn!("no inference backend compiled in; using the stub model");
        models.get_or_load(key, || Ok::<_, anyhow::Error>(StubModel::empty()))?
    };

    let mut pipeline = DetectionPipeline::new(registry, model, cfg.detector)?;
    let source = open_source(&cfg.source)?;

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = running.clone();
    ctrlc::set_handler(move || {
        log::info!("shutdown requested");
        running_flag.store(false, Ordering::SeqCst);
    })?;

    let mut stream = pipeline.sample_video(source, None);
    while running.load(Ordering::SeqCst) {
        let Some(result) = stream.next() else {
            break;
        };
        let s = &result.summary;
        log::info!(
            "frame {}: {} occupied, {} free, {} unknown ({:.1}% occupancy)",
            result.frame_number.unwrap_or_default(),
            s.occupied_count,
            s.free_count,
            s.unknown_count,
            s.occupancy_rate
        );
    }

    let processed = stream.frames_processed();
    let read = stream.frames_read();
    drop(stream);
    log::info!(
        "video processing completed: {} frames processed ({} frames read)",
        processed,
        read
    );
    Ok(())
}
