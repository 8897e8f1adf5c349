//! Zone registry and polygon geometry.
//!
//! Zones are authored once, at whatever resolution the authoring tool
//! happened to use, and frames arrive at whatever resolution the camera
//! delivers. The registry owns the original polygons, estimates the
//! authoring resolution, and rescales on demand. Scaled coordinates are
//! always derived fresh from the originals, never from the previously
//! scaled set, so repeated resolution changes cannot accumulate drift.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Standard resolutions `(width, height)` considered when estimating the
/// resolution zones were authored at, smallest first.
pub const STANDARD_RESOLUTIONS: [(u32, u32); 8] = [
    (640, 360),
    (640, 480),
    (800, 600),
    (1024, 768),
    (1280, 720),
    (1920, 1080),
    (2560, 1440),
    (3840, 2160),
];

/// Margin added to the maximum coordinate when no standard resolution
/// encloses every zone point.
const FALLBACK_MARGIN: u32 = 20;

/// Untrusted zone record as it appears in configuration payloads.
///
/// Converted into a strict [`Zone`] by [`ZoneRegistry::new`]; malformed
/// records are rejected there, before they can reach the core.
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneDef {
    #[serde(default)]
    pub id: Option<u32>,
    pub points: Vec<[f32; 2]>,
}

/// A validated zone polygon.
#[derive(Clone, Debug, Serialize)]
pub struct Zone {
    pub id: u32,
    pub points: Vec<[f32; 2]>,
}

/// Owns zone polygons at their authoring resolution and serves scaled
/// copies for the resolution of the frame currently being processed.
pub struct ZoneRegistry {
    original: Vec<Zone>,
    current: Vec<Zone>,
    reference_resolution: (u32, u32),
    current_resolution: (u32, u32),
}

impl ZoneRegistry {
    /// Validate zone definitions and build a registry.
    ///
    /// Fails on an empty list, polygons with fewer than 3 points,
    /// non-finite coordinates, or duplicate ids. Records without an id
    /// get their 1-based position.
    pub fn new(defs: Vec<ZoneDef>) -> Result<Self> {
        if defs.is_empty() {
            return Err(anyhow!("zone list cannot be empty"));
        }

        let mut seen = HashSet::new();
        let mut zones = Vec::with_capacity(defs.len());
        for (index, def) in defs.into_iter().enumerate() {
            let id = def.id.unwrap_or(index as u32 + 1);
            if !seen.insert(id) {
                return Err(anyhow!("duplicate zone id {}", id));
            }
            if def.points.len() < 3 {
                return Err(anyhow!(
                    "zone {} has {} points, polygons need at least 3",
                    id,
                    def.points.len()
                ));
            }
            if def
                .points
                .iter()
                .any(|p| !p[0].is_finite() || !p[1].is_finite())
            {
                return Err(anyhow!("zone {} has a non-finite coordinate", id));
            }
            zones.push(Zone {
                id,
                points: def.points,
            });
        }

        let reference_resolution = estimate_reference_resolution(&zones);
        log::info!(
            "zone registry: {} zones, reference resolution {}x{}",
            zones.len(),
            reference_resolution.0,
            reference_resolution.1
        );

        Ok(Self {
            current: zones.clone(),
            original: zones,
            reference_resolution,
            current_resolution: reference_resolution,
        })
    }

    /// Load zone definitions from a JSON file: a list of
    /// `{"id": n, "points": [[x, y], ...]}` records, id optional.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read zone file {}", path.display()))?;
        let defs: Vec<ZoneDef> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid zone file {}", path.display()))?;
        Self::new(defs)
    }

    pub fn reference_resolution(&self) -> (u32, u32) {
        self.reference_resolution
    }

    pub fn current_resolution(&self) -> (u32, u32) {
        self.current_resolution
    }

    /// Zones scaled for the most recent `rescale` target.
    pub fn zones(&self) -> &[Zone] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Recompute the scaled polygons for `(width, height)`.
    ///
    /// No-op when the target matches the current resolution. Scale
    /// factors are taken against the reference resolution and applied to
    /// the ORIGINAL points; point sets and resolution are swapped in
    /// together so a reader never sees one without the other.
    pub fn rescale(&mut self, width: u32, height: u32) {
        if (width, height) == self.current_resolution {
            return;
        }

        let base_w = self.reference_resolution.0.max(1) as f32;
        let base_h = self.reference_resolution.1.max(1) as f32;
        let scale_x = width as f32 / base_w;
        let scale_y = height as f32 / base_h;

        log::info!(
            "rescaling zones {}x{} -> {}x{} (scale {:.2}x, {:.2}x)",
            self.reference_resolution.0,
            self.reference_resolution.1,
            width,
            height,
            scale_x,
            scale_y
        );

        let scaled = self
            .original
            .iter()
            .map(|zone| Zone {
                id: zone.id,
                points: zone
                    .points
                    .iter()
                    .map(|p| [p[0] * scale_x, p[1] * scale_y])
                    .collect(),
            })
            .collect();

        self.current = scaled;
        self.current_resolution = (width, height);
    }
}

/// Estimate the resolution the zone polygons were authored at: the
/// smallest standard resolution enclosing every point, or max coordinate
/// plus a margin when the points exceed all standards.
fn estimate_reference_resolution(zones: &[Zone]) -> (u32, u32) {
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    for zone in zones {
        for p in &zone.points {
            max_x = max_x.max(p[0]);
            max_y = max_y.max(p[1]);
        }
    }

    for &(w, h) in &STANDARD_RESOLUTIONS {
        if max_x <= w as f32 && max_y <= h as f32 {
            return (w, h);
        }
    }

    (max_x as u32 + FALLBACK_MARGIN, max_y as u32 + FALLBACK_MARGIN)
}

/// Point-in-polygon test with inclusive boundaries.
///
/// A point exactly on an edge or vertex counts as contained; interior
/// status is decided by even-odd ray casting. Math runs in f64 so large
/// pixel coordinates do not lose the boundary cases to rounding.
pub fn point_in_polygon(point: [f32; 2], polygon: &[[f32; 2]]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        if on_segment(point, polygon[i], polygon[(i + 1) % n]) {
            return true;
        }
    }

    let px = point[0] as f64;
    let py = point[1] as f64;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (polygon[i][0] as f64, polygon[i][1] as f64);
        let (xj, yj) = (polygon[j][0] as f64, polygon[j][1] as f64);
        if (yi > py) != (yj > py) {
            let x_cross = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> bool {
    let (px, py) = (p[0] as f64, p[1] as f64);
    let (ax, ay) = (a[0] as f64, a[1] as f64);
    let (bx, by) = (b[0] as f64, b[1] as f64);

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    let seg_len = (bx - ax).hypot(by - ay).max(1.0);
    if cross.abs() > 1e-6 * seg_len {
        return false;
    }

    px >= ax.min(bx) - 1e-9
        && px <= ax.max(bx) + 1e-9
        && py >= ay.min(by) - 1e-9
        && py <= ay.max(by) + 1e-9
}
