//! Owned RGB frame container.
//!
//! Every source produces `RgbFrame` instances and the pipeline consumes
//! them. A frame is plain data: 8-bit interleaved RGB plus dimensions.
//! Construction does not validate (a decoder can hand over a short or
//! empty buffer), so the pipeline checks `is_well_formed` before use and
//! soft-fails on malformed frames instead of erroring a live stream.

use image::RgbImage;

/// One decoded video/camera frame, 8-bit RGB, row-major.
#[derive(Clone, Debug)]
pub struct RgbFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resolution as `(width, height)`.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// A frame is usable when it has nonzero dimensions and exactly
    /// `width * height * 3` bytes of pixel data.
    pub fn is_well_formed(&self) -> bool {
        if self.width == 0 || self.height == 0 || self.data.is_empty() {
            return false;
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(3));
        expected == Some(self.data.len())
    }

    /// Convert into an `image::RgbImage` for annotation or encoding.
    /// Returns `None` for malformed frames.
    pub fn to_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_frame() {
        let frame = RgbFrame::new(vec![0u8; 4 * 2 * 3], 4, 2);
        assert!(frame.is_well_formed());
        assert_eq!(frame.resolution(), (4, 2));
    }

    #[test]
    fn empty_frame_is_malformed() {
        assert!(!RgbFrame::new(Vec::new(), 0, 0).is_well_formed());
        assert!(!RgbFrame::new(Vec::new(), 4, 2).is_well_formed());
    }

    #[test]
    fn short_buffer_is_malformed() {
        assert!(!RgbFrame::new(vec![0u8; 10], 4, 2).is_well_formed());
    }

    #[test]
    fn image_round_trip() {
        let frame = RgbFrame::new(vec![7u8; 3 * 2 * 3], 3, 2);
        let img = frame.to_image().unwrap();
        let back = RgbFrame::from_image(img);
        assert_eq!(back.resolution(), (3, 2));
        assert_eq!(back.pixels(), frame.pixels());
    }
}
