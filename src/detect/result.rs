use serde::Serialize;

/// One detection exactly as the model reported it.
#[derive(Clone, Debug)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` in frame coordinates, `x1 < x2`, `y1 < y2`.
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_name: String,
}

/// Detection classes the occupancy rule understands. Everything else the
/// model reports is discarded during bucketing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionClass {
    Car,
    Free,
}

impl DetectionClass {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "car" => Some(DetectionClass::Car),
            "free" => Some(DetectionClass::Free),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionClass::Car => "car",
            DetectionClass::Free => "free",
        }
    }
}

/// A classified detection with its derived center point.
#[derive(Clone, Debug, Serialize)]
pub struct Detection {
    pub bbox: [f32; 4],
    pub center: [f32; 2],
    pub confidence: f32,
    #[serde(rename = "class_name")]
    pub class: DetectionClass,
}

impl Detection {
    pub fn from_raw(raw: &RawDetection, class: DetectionClass) -> Self {
        let [x1, y1, x2, y2] = raw.bbox;
        Self {
            bbox: raw.bbox,
            center: [(x1 + x2) / 2.0, (y1 + y2) / 2.0],
            confidence: raw.confidence,
            class,
        }
    }
}

/// Snapshot of the detection recorded on a spot report: the wire shape
/// drops the derived center point.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionSnapshot {
    pub bbox: [f32; 4],
    pub confidence: f32,
    #[serde(rename = "class_name")]
    pub class: DetectionClass,
}

impl From<&Detection> for DetectionSnapshot {
    fn from(detection: &Detection) -> Self {
        Self {
            bbox: detection.bbox,
            confidence: detection.confidence,
            class: detection.class,
        }
    }
}

/// Detections split by class, each already past its class-specific
/// confidence threshold. Bucket order is model output order; the
/// classifier's first-match rule depends on it.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DetectionBuckets {
    pub cars: Vec<Detection>,
    pub free_spots: Vec<Detection>,
}

impl DetectionBuckets {
    pub fn is_empty(&self) -> bool {
        self.cars.is_empty() && self.free_spots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_bbox_midpoint() {
        let raw = RawDetection {
            bbox: [2.0, 2.0, 6.0, 6.0],
            confidence: 0.9,
            class_name: "car".into(),
        };
        let det = Detection::from_raw(&raw, DetectionClass::Car);
        assert_eq!(det.center, [4.0, 4.0]);
    }

    #[test]
    fn only_car_and_free_classes_parse() {
        assert_eq!(DetectionClass::from_name("car"), Some(DetectionClass::Car));
        assert_eq!(
            DetectionClass::from_name("free"),
            Some(DetectionClass::Free)
        );
        assert_eq!(DetectionClass::from_name("truck"), None);
    }
}
