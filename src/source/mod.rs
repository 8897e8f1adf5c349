//! Video frame sources.
//!
//! Sources implement [`crate::video::VideoSource`] and come in two
//! flavors:
//! - `stub://` synthetic streams (deterministic frames, for tests and
//!   stub deployments)
//! - directories of image files, read in name order
//!
//! Opening happens in the constructor and fails fast; per-frame decode
//! problems surface as transient read errors so the stream's error
//! budget can absorb them. Releasing is drop-based: a source frees
//! whatever it holds when it goes out of scope.

mod image_seq;
mod synthetic;

use anyhow::{anyhow, Result};

pub use image_seq::ImageSequenceSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

use crate::video::VideoSource;

/// Open a source from its textual spec: `stub://name[?frames=N]` for a
/// synthetic stream, otherwise a path to a directory of image files.
pub fn open_source(spec: &str) -> Result<Box<dyn VideoSource>> {
    if spec.trim().is_empty() {
        return Err(anyhow!("video source spec cannot be empty"));
    }
    if spec.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::from_spec(spec)?));
    }
    if spec.contains("://") {
        return Err(anyhow!(
            "unsupported source scheme in '{}' (expected stub:// or a directory path)",
            spec
        ));
    }
    Ok(Box::new(ImageSequenceSource::open(spec)?))
}
