//! Sampled detection over video sources.
//!
//! `SampledStream` pulls frames from a [`VideoSource`], keeps every
//! `(skip + 1)`-th frame, and runs the detection pipeline on it. The
//! stream is lazy, finite, and not restartable; it ends on end-of-source
//! or after too many consecutive read failures, and the underlying
//! source is released on every exit path, including the consumer
//! simply dropping the iterator mid-stream.
//!
//! Nothing here spawns threads: each frame is read, detected, and yielded
//! on the caller's stack, so consumption is inherently pull-driven.

use anyhow::Result;

use crate::frame::RgbFrame;
use crate::pipeline::{DetectionPipeline, FrameResult};

/// Read failures tolerated in a row before the stream gives up.
pub const MAX_CONSECUTIVE_READ_ERRORS: u32 = 10;

/// A source of decoded frames.
///
/// Opening is the constructor's job and must fail fast when the source
/// cannot be opened. `read_frame` returns `Ok(None)` at end-of-source
/// and `Err` for a transient per-frame failure (the stream counts those
/// against its error budget). Release follows single-owner drop
/// discipline: dropping the source releases whatever it holds.
pub trait VideoSource {
    /// Identifier for logs.
    fn describe(&self) -> &str;

    fn read_frame(&mut self) -> Result<Option<RgbFrame>>;
}

impl<T: VideoSource + ?Sized> VideoSource for Box<T> {
    fn describe(&self) -> &str {
        (**self).describe()
    }

    fn read_frame(&mut self) -> Result<Option<RgbFrame>> {
        (**self).read_frame()
    }
}

/// Lazy iterator of detection results over a sampled video.
///
/// Borrows the pipeline mutably for its whole lifetime, so a pipeline
/// can never serve two streams at once.
pub struct SampledStream<'a, S: VideoSource> {
    source: Option<S>,
    pipeline: &'a mut DetectionPipeline,
    skip: u32,
    frame_index: u64,
    consecutive_errors: u32,
    processed: u64,
}

impl<'a, S: VideoSource> SampledStream<'a, S> {
    pub fn new(source: S, pipeline: &'a mut DetectionPipeline, skip: u32) -> Self {
        log::info!(
            "sampling video source {} (skip={})",
            source.describe(),
            skip
        );
        Self {
            source: Some(source),
            pipeline,
            skip,
            frame_index: 0,
            consecutive_errors: 0,
            processed: 0,
        }
    }

    /// Frames read so far (sampled or not).
    pub fn frames_read(&self) -> u64 {
        self.frame_index
    }

    /// Results yielded so far.
    pub fn frames_processed(&self) -> u64 {
        self.processed
    }

    /// Explicitly release the source; the stream yields nothing after.
    pub fn close(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(source) = self.source.take() {
            log::info!(
                "video source {} released ({} frames processed, {} read)",
                source.describe(),
                self.processed,
                self.frame_index
            );
        }
    }
}

impl<S: VideoSource> Iterator for SampledStream<'_, S> {
    type Item = FrameResult;

    fn next(&mut self) -> Option<FrameResult> {
        loop {
            let source = self.source.as_mut()?;

            match source.read_frame() {
                Ok(None) => {
                    log::debug!("end of video at frame {}", self.frame_index);
                    self.release();
                    return None;
                }
                Ok(Some(frame)) => {
                    self.consecutive_errors = 0;
                    let index = self.frame_index;
                    self.frame_index += 1;

                    if index % (self.skip as u64 + 1) != 0 {
                        continue;
                    }
                    match self.pipeline.detect(&frame) {
                        Ok(mut result) => {
                            result.frame_number = Some(index);
                            self.processed += 1;
                            return Some(result);
                        }
                        Err(e) => {
                            log::warn!("failed to process frame {}: {}", index, e);
                        }
                    }
                }
                Err(e) => {
                    self.consecutive_errors += 1;
                    log::warn!(
                        "error reading frame {}: {} ({}/{} errors)",
                        self.frame_index,
                        e,
                        self.consecutive_errors,
                        MAX_CONSECUTIVE_READ_ERRORS
                    );
                    self.frame_index += 1;
                    if self.consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        log::error!("too many consecutive read errors, stopping video");
                        self.release();
                        return None;
                    }
                }
            }
        }
    }
}

impl<S: VideoSource> Drop for SampledStream<'_, S> {
    fn drop(&mut self) {
        // Consumer abandonment is the cancellation path; it releases the
        // source exactly like a natural end would.
        self.release();
    }
}
