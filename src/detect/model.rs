use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::detect::result::RawDetection;
use crate::frame::RgbFrame;

/// Inference device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu
    }
}

impl FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            other => Err(anyhow!("device must be 'cpu' or 'cuda', got '{}'", other)),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// Per-call parameters handed to the model.
#[derive(Clone, Copy, Debug)]
pub struct InferenceOptions {
    /// General confidence floor applied by the model itself. Class-specific
    /// thresholds are applied later, during bucketing.
    pub confidence: f32,
    /// IoU threshold for the model's non-maximum suppression.
    pub iou: f32,
    /// Square inference size the model resizes to internally.
    pub image_size: u32,
    pub device: Device,
}

/// Object-detection model boundary.
///
/// The model is a black box: frame in, raw detections out. Implementations
/// must not retain the frame beyond the call. `detect` takes `&mut self`
/// because real inference engines carry mutable session state; the
/// registry wraps models in a `Mutex` accordingly.
pub trait DetectionModel: Send {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on one frame.
    fn infer(&mut self, frame: &RgbFrame, opts: &InferenceOptions) -> Result<Vec<RawDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_parses_case_insensitively() {
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda);
        assert!("tpu".parse::<Device>().is_err());
    }
}
