use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::detect::Device;

const DEFAULT_MODEL_PATH: &str = "models/best.onnx";
const DEFAULT_ZONES_PATH: &str = "data/zones.json";
const DEFAULT_SOURCE: &str = "stub://lot_camera";
const DEFAULT_CAR_CONFIDENCE: f32 = 0.5;
const DEFAULT_FREE_CONFIDENCE: f32 = 0.5;
const DEFAULT_GENERAL_CONFIDENCE: f32 = 0.3;
const DEFAULT_IOU: f32 = 0.7;
const DEFAULT_IMAGE_SIZE: u32 = 640;
const DEFAULT_FRAME_SKIP: u32 = 5;

const MIN_IMAGE_SIZE: u32 = 320;
const MAX_IMAGE_SIZE: u32 = 1920;

/// Detection parameters shared by every pipeline construction path.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Class-specific confidence floor for `car` detections.
    pub car_confidence: f32,
    /// Class-specific confidence floor for `free` detections.
    pub free_confidence: f32,
    /// General confidence passed to the model call.
    pub general_confidence: f32,
    /// IoU threshold passed to the model call.
    pub iou: f32,
    pub device: Device,
    /// Square inference size passed to the model call.
    pub image_size: u32,
    /// Frames discarded between two sampled frames of a video.
    pub frame_skip: u32,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            car_confidence: DEFAULT_CAR_CONFIDENCE,
            free_confidence: DEFAULT_FREE_CONFIDENCE,
            general_confidence: DEFAULT_GENERAL_CONFIDENCE,
            iou: DEFAULT_IOU,
            device: Device::Cpu,
            image_size: DEFAULT_IMAGE_SIZE,
            frame_skip: DEFAULT_FRAME_SKIP,
        }
    }
}

impl DetectorSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("car confidence", self.car_confidence),
            ("free confidence", self.free_confidence),
            ("general confidence", self.general_confidence),
            ("iou", self.iou),
        ] {
            if !(0.0..=1.0).contains(&value) || !value.is_finite() {
                return Err(anyhow!("{} must be between 0 and 1, got {}", name, value));
            }
        }
        if !(MIN_IMAGE_SIZE..=MAX_IMAGE_SIZE).contains(&self.image_size) {
            return Err(anyhow!(
                "image size must be between {} and {} pixels, got {}",
                MIN_IMAGE_SIZE,
                MAX_IMAGE_SIZE,
                self.image_size
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default)]
struct LotwatchConfigFile {
    model_path: Option<String>,
    zones_path: Option<String>,
    source: Option<String>,
    detector: Option<DetectorSettings>,
}

/// Daemon configuration: JSON file named by `LOTWATCH_CONFIG`, then env
/// overrides, then validation.
#[derive(Debug, Clone)]
pub struct LotwatchConfig {
    pub model_path: String,
    pub zones_path: String,
    pub source: String,
    pub detector: DetectorSettings,
}

impl LotwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LOTWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LotwatchConfigFile) -> Self {
        Self {
            model_path: file
                .model_path
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
            zones_path: file
                .zones_path
                .unwrap_or_else(|| DEFAULT_ZONES_PATH.to_string()),
            source: file.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            detector: file.detector.unwrap_or_default(),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("LOTWATCH_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = path;
            }
        }
        if let Ok(path) = std::env::var("LOTWATCH_ZONES_PATH") {
            if !path.trim().is_empty() {
                self.zones_path = path;
            }
        }
        if let Ok(source) = std::env::var("LOTWATCH_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Ok(device) = std::env::var("LOTWATCH_DEVICE") {
            if !device.trim().is_empty() {
                self.detector.device = device.parse()?;
            }
        }
        if let Ok(skip) = std::env::var("LOTWATCH_FRAME_SKIP") {
            let skip: u32 = skip
                .parse()
                .map_err(|_| anyhow!("LOTWATCH_FRAME_SKIP must be a non-negative integer"))?;
            self.detector.frame_skip = skip;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        if self.model_path.trim().is_empty() {
            return Err(anyhow!("model path cannot be empty"));
        }
        if self.zones_path.trim().is_empty() {
            return Err(anyhow!("zones path cannot be empty"));
        }
        if self.source.trim().is_empty() {
            return Err(anyhow!("video source cannot be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<LotwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(cfg)
}
