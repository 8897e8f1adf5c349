use anyhow::{anyhow, Result};

use crate::detect::model::{DetectionModel, InferenceOptions};
use crate::detect::result::RawDetection;
use crate::frame::RgbFrame;

/// Stub model for tests and stub deployments.
///
/// Returns a fixed detection list on every call, filtered by the general
/// confidence threshold the way a real model would filter its own output.
/// `failing()` builds a model whose every call errors, for exercising the
/// degraded-frame path.
pub struct StubModel {
    detections: Vec<RawDetection>,
    fail: bool,
    calls: u64,
}

impl StubModel {
    pub fn with_detections(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            fail: false,
            calls: 0,
        }
    }

    pub fn empty() -> Self {
        Self::with_detections(Vec::new())
    }

    pub fn failing() -> Self {
        Self {
            detections: Vec::new(),
            fail: true,
            calls: 0,
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectionModel for StubModel {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn infer(&mut self, _frame: &RgbFrame, opts: &InferenceOptions) -> Result<Vec<RawDetection>> {
        self.calls += 1;
        if self.fail {
            return Err(anyhow!("stub model configured to fail"));
        }
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= opts.confidence)
            .cloned()
            .collect())
    }
}
