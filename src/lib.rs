//! lotwatch - parking-zone occupancy detection core
//!
//! This crate decides, for a fixed set of zones overlaid on a camera
//! view, whether each zone is occupied, free, or unknown, using an
//! external object-detection model. It produces single-image results and
//! sampled result streams over video sources.
//!
//! # Architecture
//!
//! - `zone`: zone registry with automatic coordinate rescaling across
//!   frame resolutions
//! - `classify`: the occupancy rule (detections-within-a-zone to status)
//! - `pipeline`: per-frame orchestration (rescale, infer, bucket,
//!   classify, summarize)
//! - `video`: sampled iteration over frame sources with a bounded error
//!   budget and release-on-any-exit
//! - `detect`: the model boundary (trait, registry cache, backends)
//! - `source`: frame sources (synthetic stub streams, image sequences)
//! - `annotate`: overlay painting behind a collaborator trait
//! - `config`: settings with file/env loading and fail-fast validation
//!
//! The failure policy is degrade-don't-die: malformed frames yield empty
//! results, failed model calls yield all-unknown frames, and transient
//! read errors are tolerated up to a fixed budget. Results stay
//! structurally complete even when degraded.

pub mod annotate;
pub mod classify;
pub mod config;
pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod source;
pub mod video;
pub mod zone;

pub use annotate::{FrameAnnotator, OverlayAnnotator};
pub use classify::{classify_zone, Occupancy, SpotClassification};
pub use config::{DetectorSettings, LotwatchConfig};
pub use detect::{
    Detection, DetectionBuckets, DetectionClass, DetectionModel, DetectionSnapshot, Device,
    InferenceOptions, ModelKey, ModelRegistry, RawDetection, StubModel,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractModel;
pub use frame::RgbFrame;
pub use pipeline::{DetectionPipeline, DetectionSummary, FrameResult, SpotReport};
pub use source::{open_source, ImageSequenceSource, SyntheticConfig, SyntheticSource};
pub use video::{SampledStream, VideoSource, MAX_CONSECUTIVE_READ_ERRORS};
pub use zone::{point_in_polygon, Zone, ZoneDef, ZoneRegistry, STANDARD_RESOLUTIONS};
