//! Occupancy classification: detections-within-a-zone to a status.

use serde::Serialize;

use crate::detect::{Detection, DetectionBuckets, DetectionClass};
use crate::zone::{point_in_polygon, Zone};

/// Status of one zone after classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupancy {
    Occupied,
    Free,
    Unknown,
}

/// Classification outcome for one zone: the status plus a snapshot of the
/// detection that decided it, when there was one.
#[derive(Clone, Debug)]
pub struct SpotClassification {
    pub occupancy: Occupancy,
    pub detection_type: Option<DetectionClass>,
    pub detection: Option<Detection>,
}

/// Decide a zone's status from the bucketed detections.
///
/// A detection is inside the zone when its center point is contained in
/// the polygon (boundary inclusive). Cars take strict priority over free
/// markers: any contained car means occupied regardless of what else is
/// inside. Within a bucket the first contained detection in bucket order
/// wins; the order is whatever the model reported, so ties between
/// several contained detections follow the model's output order rather
/// than any distance rule.
pub fn classify_zone(zone: &Zone, detections: &DetectionBuckets) -> SpotClassification {
    for car in &detections.cars {
        if point_in_polygon(car.center, &zone.points) {
            log::debug!(
                "zone {} occupied by car (confidence {:.2})",
                zone.id,
                car.confidence
            );
            return SpotClassification {
                occupancy: Occupancy::Occupied,
                detection_type: Some(DetectionClass::Car),
                detection: Some(car.clone()),
            };
        }
    }

    for free in &detections.free_spots {
        if point_in_polygon(free.center, &zone.points) {
            log::debug!(
                "zone {} detected as free (confidence {:.2})",
                zone.id,
                free.confidence
            );
            return SpotClassification {
                occupancy: Occupancy::Free,
                detection_type: Some(DetectionClass::Free),
                detection: Some(free.clone()),
            };
        }
    }

    log::debug!("zone {}: no detection", zone.id);
    SpotClassification {
        occupancy: Occupancy::Unknown,
        detection_type: None,
        detection: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::RawDetection;

    fn unit_zone() -> Zone {
        Zone {
            id: 1,
            points: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
        }
    }

    fn det(class: DetectionClass, bbox: [f32; 4], confidence: f32) -> Detection {
        Detection::from_raw(
            &RawDetection {
                bbox,
                confidence,
                class_name: class.as_str().to_string(),
            },
            class,
        )
    }

    #[test]
    fn contained_car_means_occupied() {
        let buckets = DetectionBuckets {
            cars: vec![det(DetectionClass::Car, [2.0, 2.0, 6.0, 6.0], 0.9)],
            free_spots: vec![],
        };
        let spot = classify_zone(&unit_zone(), &buckets);
        assert_eq!(spot.occupancy, Occupancy::Occupied);
        assert_eq!(spot.detection_type, Some(DetectionClass::Car));
        assert_eq!(spot.detection.unwrap().bbox, [2.0, 2.0, 6.0, 6.0]);
    }

    #[test]
    fn car_outranks_free_in_the_same_zone() {
        let buckets = DetectionBuckets {
            cars: vec![det(DetectionClass::Car, [6.0, 6.0, 8.0, 8.0], 0.6)],
            free_spots: vec![det(DetectionClass::Free, [1.0, 1.0, 3.0, 3.0], 0.95)],
        };
        let spot = classify_zone(&unit_zone(), &buckets);
        assert_eq!(spot.occupancy, Occupancy::Occupied);
    }

    #[test]
    fn contained_free_without_car_means_free() {
        let buckets = DetectionBuckets {
            cars: vec![det(DetectionClass::Car, [20.0, 20.0, 30.0, 30.0], 0.9)],
            free_spots: vec![det(DetectionClass::Free, [1.0, 1.0, 3.0, 3.0], 0.5)],
        };
        let spot = classify_zone(&unit_zone(), &buckets);
        assert_eq!(spot.occupancy, Occupancy::Free);
        assert_eq!(spot.detection_type, Some(DetectionClass::Free));
    }

    #[test]
    fn no_contained_detection_means_unknown() {
        let spot = classify_zone(&unit_zone(), &DetectionBuckets::default());
        assert_eq!(spot.occupancy, Occupancy::Unknown);
        assert!(spot.detection.is_none());
        assert!(spot.detection_type.is_none());
    }

    #[test]
    fn center_on_boundary_counts_as_contained() {
        // bbox [8,4,12,6] centers at [10,5], exactly on the right edge.
        let buckets = DetectionBuckets {
            cars: vec![det(DetectionClass::Car, [8.0, 4.0, 12.0, 6.0], 0.9)],
            free_spots: vec![],
        };
        let spot = classify_zone(&unit_zone(), &buckets);
        assert_eq!(spot.occupancy, Occupancy::Occupied);
    }

    #[test]
    fn ties_resolve_by_bucket_order() {
        let far = det(DetectionClass::Car, [6.0, 6.0, 10.0, 10.0], 0.6);
        let near = det(DetectionClass::Car, [4.0, 4.0, 6.0, 6.0], 0.9);
        let buckets = DetectionBuckets {
            cars: vec![far.clone(), near],
            free_spots: vec![],
        };
        let spot = classify_zone(&unit_zone(), &buckets);
        assert_eq!(spot.detection.unwrap().bbox, far.bbox);
    }
}
