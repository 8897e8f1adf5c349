//! Per-frame detection orchestration.
//!
//! One `DetectionPipeline` owns one zone registry and one handle to the
//! external model. `detect` runs the whole pass for a single image:
//! rescale zones to the frame, invoke the model, bucket detections by
//! class, classify every zone, aggregate a summary. The failure policy
//! is deliberately soft: a malformed frame returns an empty result and
//! a failed model call degrades to zero detections, so one bad frame
//! never takes down a live stream.

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::classify::{classify_zone, Occupancy};
use crate::config::DetectorSettings;
use crate::detect::{
    Detection, DetectionBuckets, DetectionClass, DetectionModel, DetectionSnapshot,
    InferenceOptions, RawDetection,
};
use crate::frame::RgbFrame;
use crate::video::{SampledStream, VideoSource};
use crate::zone::ZoneRegistry;

/// Per-zone entry of a frame result.
#[derive(Clone, Debug, Serialize)]
pub struct SpotReport {
    pub id: u32,
    pub is_occupied: bool,
    pub status: Occupancy,
    pub polygon: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<DetectionClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_object: Option<DetectionSnapshot>,
}

/// Aggregated statistics over all zones of one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub total_spots: usize,
    pub occupied_count: usize,
    pub free_count: usize,
    pub unknown_count: usize,
    /// `free_count + unknown_count`.
    pub vacant_count: usize,
    /// Percentage of occupied zones, rounded to 2 decimals; 0 when there
    /// are no zones.
    pub occupancy_rate: f64,
}

/// Full result of one detection pass.
#[derive(Clone, Debug, Serialize)]
pub struct FrameResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,
    pub spots: Vec<SpotReport>,
    pub summary: DetectionSummary,
    pub detections: DetectionBuckets,
}

impl FrameResult {
    fn empty() -> Self {
        Self {
            frame_number: None,
            spots: Vec::new(),
            summary: DetectionSummary::default(),
            detections: DetectionBuckets::default(),
        }
    }
}

/// Orchestrates one detection pass per frame over a fixed zone set.
///
/// Owns its registry and resolution cache; a pipeline must not be shared
/// across concurrent consumers (the mutable receiver enforces this). The
/// model handle is the one shareable piece and is serialized by its
/// mutex.
pub struct DetectionPipeline {
    registry: ZoneRegistry,
    model: Arc<Mutex<dyn DetectionModel>>,
    settings: DetectorSettings,
}

impl DetectionPipeline {
    pub fn new(
        registry: ZoneRegistry,
        model: Arc<Mutex<dyn DetectionModel>>,
        settings: DetectorSettings,
    ) -> Result<Self> {
        settings.validate()?;
        log::info!(
            "detection pipeline: {} zones, car/free/general confidence {:.2}/{:.2}/{:.2}, device {}, image size {}",
            registry.len(),
            settings.car_confidence,
            settings.free_confidence,
            settings.general_confidence,
            settings.device,
            settings.image_size
        );
        Ok(Self {
            registry,
            model,
            settings,
        })
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ZoneRegistry {
        &self.registry
    }

    /// Run one full detection pass over one frame.
    ///
    /// Malformed frames soft-fail to an empty result and a failed model
    /// call degrades to zero detections (every zone `unknown`); the only
    /// error this returns is an internally corrupted model handle.
    pub fn detect(&mut self, frame: &RgbFrame) -> Result<FrameResult> {
        if !frame.is_well_formed() {
            log::warn!(
                "invalid frame ({}x{}, {} bytes), returning empty result",
                frame.width(),
                frame.height(),
                frame.pixels().len()
            );
            return Ok(FrameResult::empty());
        }

        let (width, height) = frame.resolution();
        self.registry.rescale(width, height);

        let raw = self.run_model(frame)?;
        let detections = self.bucket_detections(raw);
        log::debug!(
            "frame {}x{}: {} cars, {} free markers past class thresholds",
            width,
            height,
            detections.cars.len(),
            detections.free_spots.len()
        );

        let mut spots = Vec::with_capacity(self.registry.len());
        let mut occupied_count = 0;
        let mut free_count = 0;
        let mut unknown_count = 0;

        for zone in self.registry.zones() {
            let spot = classify_zone(zone, &detections);
            match spot.occupancy {
                Occupancy::Occupied => occupied_count += 1,
                Occupancy::Free => free_count += 1,
                Occupancy::Unknown => unknown_count += 1,
            }
            spots.push(SpotReport {
                id: zone.id,
                is_occupied: spot.occupancy == Occupancy::Occupied,
                status: spot.occupancy,
                polygon: zone.points.clone(),
                detection_type: spot.detection_type,
                detected_object: spot.detection.as_ref().map(DetectionSnapshot::from),
            });
        }

        let summary = build_summary(occupied_count, free_count, unknown_count);
        log::info!(
            "detection completed: {} occupied, {} free, {} unknown ({:.1}% occupancy)",
            occupied_count,
            free_count,
            unknown_count,
            summary.occupancy_rate
        );

        Ok(FrameResult {
            frame_number: None,
            spots,
            summary,
            detections,
        })
    }

    /// Drive this pipeline over a video source with frame-skip sampling.
    /// `skip` defaults to the configured `frame_skip`.
    pub fn sample_video<S: VideoSource>(
        &mut self,
        source: S,
        skip: Option<u32>,
    ) -> SampledStream<'_, S> {
        let skip = skip.unwrap_or(self.settings.frame_skip);
        SampledStream::new(source, self, skip)
    }

    /// Invoke the model; an inference failure degrades to zero
    /// detections so the stream keeps running on that frame.
    fn run_model(&mut self, frame: &RgbFrame) -> Result<Vec<RawDetection>> {
        let opts = InferenceOptions {
            confidence: self.settings.general_confidence,
            iou: self.settings.iou,
            image_size: self.settings.image_size,
            device: self.settings.device,
        };
        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("detection model lock poisoned"))?;
        match model.infer(frame, &opts) {
            Ok(raw) => Ok(raw),
            Err(e) => {
                log::error!("model call failed, degrading to zero detections: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Split raw detections into car/free buckets, applying the
    /// class-specific thresholds. A detection can pass the model's
    /// general filter and still be dropped here. Other classes are
    /// discarded outright.
    fn bucket_detections(&self, raw: Vec<RawDetection>) -> DetectionBuckets {
        let mut buckets = DetectionBuckets::default();
        let mut below_threshold = 0usize;
        for detection in &raw {
            match DetectionClass::from_name(&detection.class_name) {
                Some(DetectionClass::Car) => {
                    if detection.confidence < self.settings.car_confidence {
                        below_threshold += 1;
                        continue;
                    }
                    buckets
                        .cars
                        .push(Detection::from_raw(detection, DetectionClass::Car));
                }
                Some(DetectionClass::Free) => {
                    if detection.confidence < self.settings.free_confidence {
                        below_threshold += 1;
                        continue;
                    }
                    buckets
                        .free_spots
                        .push(Detection::from_raw(detection, DetectionClass::Free));
                }
                None => continue,
            }
        }
        if below_threshold > 0 {
            log::debug!(
                "{} detections dropped below class-specific thresholds",
                below_threshold
            );
        }
        buckets
    }
}

fn build_summary(occupied_count: usize, free_count: usize, unknown_count: usize) -> DetectionSummary {
    let total_spots = occupied_count + free_count + unknown_count;
    let occupancy_rate = if total_spots > 0 {
        round2(occupied_count as f64 / total_spots as f64 * 100.0)
    } else {
        0.0
    };
    DetectionSummary {
        total_spots,
        occupied_count,
        free_count,
        unknown_count,
        vacant_count: free_count + unknown_count,
        occupancy_rate,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
