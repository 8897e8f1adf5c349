use anyhow::{anyhow, Result};

use crate::frame::RgbFrame;
use crate::video::VideoSource;

const DEFAULT_FRAMES: u64 = 300;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Spec string the source was opened from (for logs).
    pub name: String,
    pub frames: u64,
    pub width: u32,
    pub height: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "stub://synthetic".to_string(),
            frames: DEFAULT_FRAMES,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Synthetic frame source producing a finite run of deterministic
/// frames. Read errors can be injected at chosen indices to exercise
/// the stream's error budget.
pub struct SyntheticSource {
    config: SyntheticConfig,
    cursor: u64,
    fail_at: Vec<u64>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            cursor: 0,
            fail_at: Vec::new(),
        }
    }

    /// Parse `stub://name[?frames=N]`.
    pub fn from_spec(spec: &str) -> Result<Self> {
        let rest = spec
            .strip_prefix("stub://")
            .ok_or_else(|| anyhow!("synthetic source spec must start with stub://"))?;
        if rest.is_empty() {
            return Err(anyhow!("synthetic source needs a name: stub://<name>"));
        }

        let mut config = SyntheticConfig {
            name: spec.to_string(),
            ..SyntheticConfig::default()
        };
        if let Some((_, query)) = rest.split_once('?') {
            for pair in query.split('&') {
                match pair.split_once('=') {
                    Some(("frames", value)) => {
                        config.frames = value
                            .parse()
                            .map_err(|_| anyhow!("invalid frames count '{}'", value))?;
                    }
                    _ => return Err(anyhow!("unknown synthetic source parameter '{}'", pair)),
                }
            }
        }
        log::info!(
            "synthetic source {}: {} frames at {}x{}",
            config.name,
            config.frames,
            config.width,
            config.height
        );
        Ok(Self::new(config))
    }

    /// Inject transient read failures at the given frame indices.
    pub fn with_read_errors(mut self, indices: &[u64]) -> Self {
        self.fail_at = indices.to_vec();
        self
    }

    fn generate_pixels(&self, index: u64) -> Vec<u8> {
        let len = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; len];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + index) % 256) as u8;
        }
        pixels
    }
}

impl VideoSource for SyntheticSource {
    fn describe(&self) -> &str {
        &self.config.name
    }

    fn read_frame(&mut self) -> Result<Option<RgbFrame>> {
        let index = self.cursor;
        self.cursor += 1;

        if self.fail_at.contains(&index) {
            return Err(anyhow!("injected read failure at frame {}", index));
        }
        if index >= self.config.frames {
            return Ok(None);
        }
        Ok(Some(RgbFrame::new(
            self.generate_pixels(index),
            self.config.width,
            self.config.height,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_the_configured_frame_count() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            frames: 3,
            ..SyntheticConfig::default()
        });
        for _ in 0..3 {
            let frame = source.read_frame().unwrap().unwrap();
            assert!(frame.is_well_formed());
        }
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn spec_parsing_accepts_frame_count() {
        let mut source = SyntheticSource::from_spec("stub://cam?frames=2").unwrap();
        assert_eq!(source.describe(), "stub://cam?frames=2");
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn bad_specs_are_rejected() {
        assert!(SyntheticSource::from_spec("stub://").is_err());
        assert!(SyntheticSource::from_spec("stub://cam?frames=abc").is_err());
        assert!(SyntheticSource::from_spec("stub://cam?speed=2").is_err());
    }

    #[test]
    fn injected_errors_fire_at_their_indices() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            frames: 3,
            ..SyntheticConfig::default()
        })
        .with_read_errors(&[1]);
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().is_err());
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_none());
    }
}
