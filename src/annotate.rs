//! Frame annotation boundary.
//!
//! The core computes occupancy and hands the data out; drawing is a
//! collaborator concern behind [`FrameAnnotator`]. `OverlayAnnotator` is
//! the bundled implementation: zone outlines colored by status plus a
//! HUD strip with an occupancy gauge.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::classify::Occupancy;
use crate::pipeline::{DetectionSummary, SpotReport};

/// Receives one frame's worth of results and paints them onto the image.
pub trait FrameAnnotator {
    fn annotate(&self, image: &mut RgbImage, spots: &[SpotReport], summary: &DetectionSummary);
}

/// Status colors (RGB).
const OCCUPIED_COLOR: Rgb<u8> = Rgb([220, 40, 40]);
const FREE_COLOR: Rgb<u8> = Rgb([70, 205, 50]);
const UNKNOWN_COLOR: Rgb<u8> = Rgb([230, 190, 20]);
const HUD_BACKGROUND: Rgb<u8> = Rgb([22, 12, 10]);
const HUD_HEIGHT: u32 = 46;

/// Default overlay: polygon outlines per zone plus a HUD bar showing the
/// occupancy rate as a filled gauge.
#[derive(Default)]
pub struct OverlayAnnotator;

impl OverlayAnnotator {
    pub fn new() -> Self {
        Self
    }

    fn status_color(status: Occupancy) -> Rgb<u8> {
        match status {
            Occupancy::Occupied => OCCUPIED_COLOR,
            Occupancy::Free => FREE_COLOR,
            Occupancy::Unknown => UNKNOWN_COLOR,
        }
    }

    fn draw_polygon_outline(image: &mut RgbImage, points: &[[f32; 2]], color: Rgb<u8>) {
        if points.len() < 2 {
            return;
        }
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            draw_line_segment_mut(image, (a[0], a[1]), (b[0], b[1]), color);
        }
    }

    fn draw_hud(image: &mut RgbImage, summary: &DetectionSummary) {
        let width = image.width();
        if width == 0 {
            return;
        }
        draw_filled_rect_mut(
            image,
            Rect::at(0, 0).of_size(width, HUD_HEIGHT.min(image.height().max(1))),
            HUD_BACKGROUND,
        );

        // Occupancy gauge: filled share of the bar tracks the rate.
        let gauge_width = width.saturating_sub(20);
        if gauge_width == 0 {
            return;
        }
        let filled = (gauge_width as f64 * summary.occupancy_rate / 100.0) as u32;
        draw_filled_rect_mut(
            image,
            Rect::at(10, 18).of_size(gauge_width, 10),
            FREE_COLOR,
        );
        if filled > 0 {
            draw_filled_rect_mut(image, Rect::at(10, 18).of_size(filled, 10), OCCUPIED_COLOR);
        }
    }
}

impl FrameAnnotator for OverlayAnnotator {
    fn annotate(&self, image: &mut RgbImage, spots: &[SpotReport], summary: &DetectionSummary) {
        for spot in spots {
            Self::draw_polygon_outline(image, &spot.polygon, Self::status_color(spot.status));
        }
        Self::draw_hud(image, summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(status: Occupancy) -> SpotReport {
        SpotReport {
            id: 1,
            is_occupied: status == Occupancy::Occupied,
            status,
            polygon: vec![[10.0, 50.0], [40.0, 50.0], [40.0, 80.0], [10.0, 80.0]],
            detection_type: None,
            detected_object: None,
        }
    }

    #[test]
    fn overlay_paints_outline_and_hud() {
        let mut image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let summary = DetectionSummary {
            total_spots: 1,
            occupied_count: 1,
            free_count: 0,
            unknown_count: 0,
            vacant_count: 0,
            occupancy_rate: 100.0,
        };

        OverlayAnnotator::new().annotate(&mut image, &[spot(Occupancy::Occupied)], &summary);

        // HUD background covers the top strip.
        assert_eq!(*image.get_pixel(0, 0), HUD_BACKGROUND);
        // Zone outline runs along y=50 between x=10..40.
        assert_eq!(*image.get_pixel(20, 50), OCCUPIED_COLOR);
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let mut image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        let summary = DetectionSummary::default();
        OverlayAnnotator::new().annotate(&mut image, &[spot(Occupancy::Unknown)], &summary);
    }
}
